//! Control-tree resolution: raw markup tree to typed controls.
//!
//! Resolution has two kinds of failure. Directive problems (a missing or
//! unresolvable `@viewModel`, duplicate directives, a `@masterPage` on a
//! markup control) are structural and fail the view at once. Everything
//! else is attached to the offending control as a [`NodeError`] so every
//! such problem in the file is reported together.
//!
//! Bindings are resolved here, against the data-context stack in effect for
//! the element. A binding that fails to resolve is kept as
//! [`PropertyValue::Failed`]; the error-checking pass reports it.

use std::sync::Arc;

use dothtml_core::{CompilationError, DataType, Span};
use dothtml_parser::markup::{
    Attribute, AttributeValue, BindingSource, Directive, Element, MarkupDocument, MarkupNode,
};
use dothtml_registry::builtins::DEFAULT_NAMESPACES;
use dothtml_registry::controls::{self, ControlMetadata};
use dothtml_registry::{CapabilityProperty, DATA_CONTEXT_PROPERTY, TypeRegistry, TypeSystem};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::binder::{BindingBinder, BoundBinding};
use crate::data_context::DataContextStack;
use crate::options::CompilerOptions;
use crate::view::{CompiledView, ViewKind, normalize_path};

/// Internal property recording the data-context type of a control whose
/// context differs from its parent's.
pub const DATA_CONTEXT_TYPE: &str = "DataContextType";

// ============================================================================
// Directives
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterPageReference {
    pub path: String,
    /// Position of the `@masterPage` directive.
    pub span: Span,
}

/// The `@` directives of a view, with type names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDirectives {
    pub view_model: DataType,
    pub master_page: Option<MasterPageReference>,
    /// Namespaces from `@import`, searched for type names in bindings.
    pub imports: Vec<String>,
    pub base_type: Option<DataType>,
}

impl ViewDirectives {
    pub fn from_document(
        document: &MarkupDocument,
        kind: ViewKind,
        types: &dyn TypeSystem,
    ) -> Result<Self, CompilationError> {
        let imports: Vec<String> = document
            .directives_named("import")
            .map(|d| d.value.trim().to_string())
            .filter(|ns| !ns.is_empty())
            .collect();
        let mut namespaces = imports.clone();
        namespaces.extend(DEFAULT_NAMESPACES.iter().map(|ns| ns.to_string()));

        let view_model = match single_directive(document, "viewModel")? {
            Some(directive) => directive_type(types, directive, &namespaces)?,
            None if kind == ViewKind::MasterPage => DataType::object(),
            None => {
                return Err(CompilationError::control_tree(
                    format!("the {kind} does not declare a @viewModel directive"),
                    None,
                ));
            }
        };

        let master_page = match single_directive(document, "masterPage")? {
            Some(directive) if kind == ViewKind::MarkupControl => {
                return Err(CompilationError::control_tree(
                    "a markup control cannot declare a @masterPage directive",
                    Some(directive.span),
                ));
            }
            Some(directive) => Some(MasterPageReference {
                path: normalize_path(&directive.value),
                span: directive.span,
            }),
            None => None,
        };

        let base_type = single_directive(document, "baseType")?
            .map(|directive| directive_type(types, directive, &namespaces))
            .transpose()?;

        Ok(Self {
            view_model,
            master_page,
            imports,
            base_type,
        })
    }
}

fn single_directive<'d>(document: &'d MarkupDocument, name: &str) -> Result<Option<&'d Directive>, CompilationError> {
    let mut found = document.directives_named(name);
    let first = found.next();
    if let Some(duplicate) = found.next() {
        return Err(CompilationError::control_tree(
            format!("the @{name} directive is declared more than once"),
            Some(duplicate.span),
        ));
    }
    Ok(first)
}

/// Resolve `Type` or `Type, Module` from a directive value.
fn directive_type(
    types: &dyn TypeSystem,
    directive: &Directive,
    namespaces: &[String],
) -> Result<DataType, CompilationError> {
    let name = directive.value.split(',').next().unwrap_or_default().trim();
    types.resolve_type(name, namespaces).ok_or_else(|| {
        CompilationError::control_tree(
            format!("type '{name}' in the @{} directive could not be found", directive.name),
            Some(directive.span),
        )
    })
}

// ============================================================================
// Resolved Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    HardCoded(String),
    Binding(BoundBinding),
    Failed(CompilationError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProperty {
    pub name: String,
    pub value: PropertyValue,
    pub span: Span,
    /// `None` for a plain HTML attribute.
    pub capability: Option<CapabilityProperty>,
}

impl ResolvedProperty {
    pub fn binding(&self) -> Option<&BoundBinding> {
        match &self.value {
            PropertyValue::Binding(binding) => Some(binding),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// The view itself.
    Root,
    Html,
    Code,
    Markup { path: String, view_model: DataType },
}

/// A non-fatal problem found on one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeError {
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternalProperty {
    pub name: &'static str,
    pub value: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedNode {
    Control(ResolvedControl),
    Text { text: String, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedControl {
    pub kind: ControlKind,
    /// Tag as written, empty for the root.
    pub tag: String,
    pub metadata: ControlMetadata,
    pub properties: Vec<ResolvedProperty>,
    pub children: Vec<ResolvedNode>,
    pub data_context: Arc<DataContextStack>,
    /// Position of the opening tag.
    pub span: Span,
    pub node_errors: Vec<NodeError>,
    pub internal: Vec<InternalProperty>,
}

impl ResolvedControl {
    fn new(kind: ControlKind, tag: String, metadata: ControlMetadata, data_context: Arc<DataContextStack>, span: Span) -> Self {
        Self {
            kind,
            tag,
            metadata,
            properties: Vec::new(),
            children: Vec::new(),
            data_context,
            span,
            node_errors: Vec::new(),
            internal: Vec::new(),
        }
    }

    pub fn ty(&self) -> &DataType {
        &self.metadata.ty
    }

    pub fn is(&self, type_name: &str) -> bool {
        matches!(self.ty(), DataType::Named(named) if &*named.name == type_name)
    }

    pub fn property(&self, name: &str) -> Option<&ResolvedProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Hard-coded value of `name`, if it is set without a binding.
    pub fn hard_coded(&self, name: &str) -> Option<&str> {
        match &self.property(name)?.value {
            PropertyValue::HardCoded(value) => Some(value),
            _ => None,
        }
    }

    /// Replace the property with the same name, or append it.
    pub fn set_property(&mut self, property: ResolvedProperty) {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub fn internal(&self, name: &str) -> Option<&DataType> {
        self.internal.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn child_controls(&self) -> impl Iterator<Item = &ResolvedControl> {
        self.children.iter().filter_map(|child| match child {
            ResolvedNode::Control(control) => Some(control),
            ResolvedNode::Text { .. } => None,
        })
    }

    /// This control and every descendant, depth first.
    pub fn descendants(&self) -> Vec<&ResolvedControl> {
        let mut out = vec![self];
        for child in self.child_controls() {
            out.extend(child.descendants());
        }
        out
    }

    fn has_content(&self) -> bool {
        self.children.iter().any(|child| match child {
            ResolvedNode::Control(_) => true,
            ResolvedNode::Text { text, .. } => !text.trim().is_empty(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTree {
    pub path: String,
    pub kind: ViewKind,
    pub directives: ViewDirectives,
    pub root: ResolvedControl,
}

impl ResolvedTree {
    pub fn controls(&self) -> Vec<&ResolvedControl> {
        self.root.descendants()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Markup controls referenced by `document`, as normalized source paths in
/// order of first use, each with the position of its first use.
pub fn markup_control_references(document: &MarkupDocument, options: &CompilerOptions) -> Vec<(String, Span)> {
    let mut seen = FxHashSet::default();
    let mut references = Vec::new();
    for element in document.elements() {
        let Some(prefix) = element.prefix.as_deref() else {
            continue;
        };
        if let Some(registration) = options.markup_control(prefix, &element.name) {
            let path = normalize_path(&registration.src);
            if seen.insert(path.clone()) {
                references.push((path, element.span));
            }
        }
    }
    references
}

pub struct ControlTreeResolver<'a> {
    registry: &'a TypeRegistry,
    options: &'a CompilerOptions,
    /// Compiled markup controls by normalized path.
    markup_controls: &'a FxHashMap<String, Arc<CompiledView>>,
}

impl<'a> ControlTreeResolver<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        options: &'a CompilerOptions,
        markup_controls: &'a FxHashMap<String, Arc<CompiledView>>,
    ) -> Self {
        Self {
            registry,
            options,
            markup_controls,
        }
    }

    pub fn resolve(&self, path: &str, kind: ViewKind, document: &MarkupDocument) -> Result<ResolvedTree, CompilationError> {
        let directives = ViewDirectives::from_document(document, kind, self.registry)?;

        let root_type = match &directives.base_type {
            Some(base) => base.clone(),
            None if kind == ViewKind::MarkupControl => DataType::named(controls::MARKUP_CONTROL),
            None => DataType::named(controls::VIEW),
        };
        let metadata = self.registry.control_metadata(&root_type).ok_or_else(|| {
            let span = document.directive("baseType").map(|d| d.span);
            CompilationError::control_tree(format!("base type '{root_type}' is not a control"), span)
        })?;

        let context = DataContextStack::root(directives.view_model.clone(), directives.imports.clone());
        let mut root = ResolvedControl::new(ControlKind::Root, String::new(), metadata, context, Span::point(1, 1));
        self.resolve_children(&mut root, &document.nodes);
        if directives.master_page.is_some() {
            check_content_only(&mut root);
        }

        trace!(path, controls = root.descendants().len(), "resolved control tree");
        Ok(ResolvedTree {
            path: path.to_string(),
            kind,
            directives,
            root,
        })
    }

    fn resolve_children(&self, parent: &mut ResolvedControl, nodes: &[MarkupNode]) {
        for node in nodes {
            match node {
                MarkupNode::Element(element) => {
                    let control = self.resolve_element(element, &parent.data_context);
                    parent.children.push(ResolvedNode::Control(control));
                }
                MarkupNode::Text(text) => parent.children.push(ResolvedNode::Text {
                    text: text.text.clone(),
                    span: text.span,
                }),
                MarkupNode::Binding(source) => {
                    let literal = self.literal(source, &parent.data_context);
                    parent.children.push(ResolvedNode::Control(literal));
                }
                MarkupNode::Invalid(invalid) => parent.node_errors.push(NodeError {
                    message: invalid.message.clone(),
                    span: invalid.span,
                }),
            }
        }
    }

    fn resolve_element(&self, element: &Element, parent_context: &Arc<DataContextStack>) -> ResolvedControl {
        let tag = element.full_name();
        let mut node_errors: Vec<NodeError> = element
            .errors
            .iter()
            .map(|message| NodeError {
                message: message.clone(),
                span: element.span,
            })
            .collect();

        let (kind, metadata) = match self.control_type(element) {
            Ok(found) => found,
            Err(message) => {
                node_errors.push(NodeError {
                    message,
                    span: element.span,
                });
                let metadata = self
                    .registry
                    .control_metadata(&DataType::named(controls::HTML_GENERIC_CONTROL))
                    .unwrap_or_else(untyped_metadata);
                (ControlKind::Html, metadata)
            }
        };

        // DataContext applies to the element's own properties as well as its children.
        let mut context = Arc::clone(parent_context);
        let mut properties = Vec::new();
        if let Some(attribute) = element.attribute(DATA_CONTEXT_PROPERTY) {
            let property = self.property(attribute, metadata.property(DATA_CONTEXT_PROPERTY).cloned(), &context);
            if let Some(binding) = property.binding() {
                context = DataContextStack::child(&context, binding.result_type());
            }
            properties.push(property);
        }

        let mut seen = FxHashSet::default();
        for attribute in &element.attributes {
            let name = attribute.full_name();
            if !seen.insert(name.clone()) {
                node_errors.push(NodeError {
                    message: format!("property '{name}' is set more than once on '{tag}'"),
                    span: attribute.span,
                });
                continue;
            }
            if attribute.prefix.is_none() && attribute.name.eq_ignore_ascii_case(DATA_CONTEXT_PROPERTY) {
                continue;
            }
            let capability = if attribute.prefix.is_none() {
                metadata.property(&attribute.name).cloned()
            } else {
                None
            };
            if capability.is_none() && kind != ControlKind::Html {
                node_errors.push(NodeError {
                    message: format!("control '{tag}' does not have a property '{name}'"),
                    span: attribute.span,
                });
                continue;
            }
            properties.push(self.property(attribute, capability, &context));
        }

        let mut control = ResolvedControl::new(kind, tag, metadata, context, element.span);
        control.properties = properties;
        control.node_errors = node_errors;
        self.resolve_children(&mut control, &element.children);

        if !control.metadata.allows_content && control.has_content() {
            control.node_errors.push(NodeError {
                message: format!("control '{}' does not allow content", control.tag),
                span: element.span,
            });
        }
        control
    }

    /// Work out what a tag refers to; `Err` carries the node error message.
    fn control_type(&self, element: &Element) -> Result<(ControlKind, ControlMetadata), String> {
        let Some(prefix) = element.prefix.as_deref() else {
            let metadata = self
                .registry
                .control_metadata(&DataType::named(controls::HTML_GENERIC_CONTROL))
                .unwrap_or_else(untyped_metadata);
            return Ok((ControlKind::Html, metadata));
        };

        if let Some(registration) = self.options.markup_control(prefix, &element.name) {
            let path = normalize_path(&registration.src);
            let artifact = self.markup_controls.get(&path).and_then(|view| view.artifact());
            let Some(artifact) = artifact else {
                return Err(format!("markup control '{path}' failed to compile"));
            };
            let metadata = self
                .registry
                .control_metadata(&artifact.base_type)
                .ok_or_else(|| format!("base type '{}' of markup control '{path}' is not a control", artifact.base_type))?;
            let kind = ControlKind::Markup {
                path,
                view_model: artifact.view_model.clone(),
            };
            return Ok((kind, metadata));
        }

        if let Some(namespace) = self.options.control_namespace(prefix)
            && let Some(ty) = self.registry.resolve_type(&element.name, &[namespace.to_string()])
            && let Some(metadata) = self.registry.control_metadata(&ty)
        {
            return Ok((ControlKind::Code, metadata));
        }

        Err(format!("unknown control '{}'", element.full_name()))
    }

    fn property(
        &self,
        attribute: &Attribute,
        capability: Option<CapabilityProperty>,
        context: &Arc<DataContextStack>,
    ) -> ResolvedProperty {
        let value = match &attribute.value {
            AttributeValue::None => PropertyValue::HardCoded(String::new()),
            AttributeValue::Text(text) => PropertyValue::HardCoded(text.clone()),
            AttributeValue::Binding(source) => self.bind(source, context),
        };
        ResolvedProperty {
            name: attribute.full_name(),
            value,
            span: attribute.span,
            capability,
        }
    }

    fn bind(&self, source: &BindingSource, context: &DataContextStack) -> PropertyValue {
        match BindingBinder::new(self.registry, context).bind_source(source) {
            Ok(binding) => PropertyValue::Binding(binding),
            Err(error) => PropertyValue::Failed(error),
        }
    }

    /// A `{{value: ...}}` text binding becomes a `Literal` with a bound `Text`.
    fn literal(&self, source: &BindingSource, context: &Arc<DataContextStack>) -> ResolvedControl {
        let metadata = self
            .registry
            .control_metadata(&DataType::named(controls::LITERAL))
            .unwrap_or_else(untyped_metadata);
        let capability = metadata.property("Text").cloned();
        let mut literal = ResolvedControl::new(
            ControlKind::Code,
            String::new(),
            metadata,
            Arc::clone(context),
            source.span,
        );
        literal.properties.push(ResolvedProperty {
            name: "Text".to_string(),
            value: self.bind(source, context),
            span: source.span,
            capability,
        });
        literal
    }
}

/// Metadata for a registry without the standard controls.
fn untyped_metadata() -> ControlMetadata {
    ControlMetadata {
        ty: DataType::object(),
        allows_content: true,
        properties: Vec::new(),
        module: None,
    }
}

/// A view with a master page may only contain `Content` controls at the top level.
fn check_content_only(root: &mut ResolvedControl) {
    let mut errors = Vec::new();
    for child in &root.children {
        match child {
            ResolvedNode::Control(control) if !control.is(controls::CONTENT) => errors.push(NodeError {
                message: format!(
                    "'{}' cannot be used at the top level of a view with a master page, only <dot:Content> is allowed",
                    control.tag
                ),
                span: control.span,
            }),
            ResolvedNode::Text { text, span } if !text.trim().is_empty() => errors.push(NodeError {
                message: "text cannot be used at the top level of a view with a master page".to_string(),
                span: *span,
            }),
            _ => {}
        }
    }
    root.node_errors.extend(errors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_parser::markup::parse_markup;
    use dothtml_registry::{MarkupOptions, TypeBuilder};

    use crate::emitter::SyntaxUnit;
    use crate::view::CompiledArtifact;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_standard_controls();
        for entry in [
            TypeBuilder::new("App.Address", "App")
                .property("City", DataType::string())
                .build(),
            TypeBuilder::new("App.Customer", "App")
                .property("Name", DataType::string())
                .property("Address", DataType::named("App.Address"))
                .build(),
            TypeBuilder::new("App.Controls.Badge", "App")
                .flags(dothtml_registry::TypeFlags::CONTROL)
                .base(DataType::named(controls::CONTROL_BASE))
                .capability("Label", DataType::string(), MarkupOptions::default())
                .build(),
        ] {
            registry.register_type(entry).unwrap();
        }
        registry
    }

    fn resolve_with(
        markup: &str,
        kind: ViewKind,
        options: &CompilerOptions,
        markup_controls: &FxHashMap<String, Arc<CompiledView>>,
    ) -> Result<ResolvedTree, CompilationError> {
        let registry = registry();
        let document = parse_markup(markup).unwrap();
        ControlTreeResolver::new(&registry, options, markup_controls).resolve("Views/Test.dothtml", kind, &document)
    }

    fn resolve(markup: &str) -> Result<ResolvedTree, CompilationError> {
        resolve_with(markup, ViewKind::Page, &CompilerOptions::default(), &FxHashMap::default())
    }

    fn node_errors(tree: &ResolvedTree) -> Vec<(String, Span)> {
        tree.controls()
            .into_iter()
            .flat_map(|c| c.node_errors.iter().map(|e| (e.message.clone(), e.span)))
            .collect()
    }

    fn compiled_control(path: &str, view_model: &str) -> Arc<CompiledView> {
        Arc::new(CompiledView::succeeded(
            path,
            CompiledArtifact {
                unit: SyntaxUnit::default(),
                referenced_modules: Default::default(),
                view_model: DataType::named(view_model),
                base_type: DataType::named(controls::MARKUP_CONTROL),
                placeholders: Vec::new(),
                dependencies: Vec::new(),
            },
        ))
    }

    // ========================================================================
    // Directives
    // ========================================================================

    #[test]
    fn view_model_is_required_for_pages() {
        let err = resolve("<p>hi</p>").unwrap_err();
        assert_eq!(err.class(), "ControlTree");
        assert!(err.to_string().contains("@viewModel"));
    }

    #[test]
    fn master_pages_default_to_object() {
        let tree = resolve_with(
            "<div></div>",
            ViewKind::MasterPage,
            &CompilerOptions::default(),
            &FxHashMap::default(),
        )
        .unwrap();
        assert_eq!(tree.directives.view_model, DataType::object());
    }

    #[test]
    fn view_model_with_module_suffix_and_import() {
        let tree = resolve("@import App\n@viewModel Customer, App\n").unwrap();
        assert_eq!(tree.directives.view_model, DataType::named("App.Customer"));
        assert_eq!(tree.root.data_context.namespaces(), ["App".to_string()]);
    }

    #[test]
    fn unresolved_view_model_is_positioned() {
        let err = resolve("@viewModel App.Missing\n").unwrap_err();
        assert_eq!(err.span().map(|s| s.line), Some(1));
        assert!(err.to_string().contains("App.Missing"));
    }

    #[test]
    fn duplicate_directive_is_fatal() {
        let err = resolve("@viewModel App.Customer\n@viewModel App.Customer\n").unwrap_err();
        assert_eq!(err.span().map(|s| s.line), Some(2));
    }

    #[test]
    fn single_directive_borrows_from_the_document() {
        let document = parse_markup("@viewModel App.Customer\n@import App\n").unwrap();
        let directive = {
            let name = String::from("import");
            single_directive(&document, &name).unwrap()
        };
        assert_eq!(directive.map(|d| d.value.as_str()), Some("App"));
        assert!(single_directive(&document, "masterPage").unwrap().is_none());
    }

    #[test]
    fn markup_control_cannot_use_master_page() {
        let err = resolve_with(
            "@viewModel App.Customer\n@masterPage Views/Site.dotmaster\n",
            ViewKind::MarkupControl,
            &CompilerOptions::default(),
            &FxHashMap::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("@masterPage"));
    }

    // ========================================================================
    // Elements
    // ========================================================================

    #[test]
    fn html_and_code_controls() {
        let tree = resolve("@viewModel App.Customer\n<div class=\"x\"><dot:TextBox Text={value: Name} /></div>").unwrap();
        let div = tree.root.child_controls().next().unwrap();
        assert_eq!(div.kind, ControlKind::Html);
        assert!(div.property("class").unwrap().capability.is_none());
        let text_box = div.child_controls().next().unwrap();
        assert_eq!(text_box.kind, ControlKind::Code);
        assert!(text_box.is("DotHtml.Controls.TextBox"));
        let binding = text_box.property("Text").unwrap().binding().unwrap();
        assert_eq!(binding.result_type(), DataType::string());
        assert!(node_errors(&tree).is_empty());
    }

    #[test]
    fn data_context_switches_for_element_and_children() {
        let tree = resolve(
            "@viewModel App.Customer\n<div DataContext={value: Address} title={value: City}>{{value: City}}</div>",
        )
        .unwrap();
        let div = tree.root.child_controls().next().unwrap();
        assert_eq!(div.data_context.this(), &DataType::named("App.Address"));
        assert!(div.property("title").unwrap().binding().is_some());
        let literal = div.child_controls().next().unwrap();
        assert!(literal.is(controls::LITERAL));
        assert_eq!(literal.data_context.this(), &DataType::named("App.Address"));
        assert_eq!(literal.data_context.keyword("_parent"), Some(DataType::named("App.Customer")));
    }

    #[test]
    fn custom_control_namespace() {
        let options = CompilerOptions {
            control_namespaces: vec![crate::options::ControlNamespace {
                tag_prefix: "app".into(),
                namespace: "App.Controls".into(),
            }],
            ..CompilerOptions::default()
        };
        let tree = resolve_with(
            "@viewModel App.Customer\n<app:Badge Label=\"x\" />",
            ViewKind::Page,
            &options,
            &FxHashMap::default(),
        )
        .unwrap();
        assert!(tree.root.child_controls().next().unwrap().is("App.Controls.Badge"));
    }

    #[test]
    fn failed_binding_is_kept_on_the_property() {
        let tree = resolve("@viewModel App.Customer\n<p title={value: Missing}></p>").unwrap();
        let p = tree.root.child_controls().next().unwrap();
        let PropertyValue::Failed(error) = &p.property("title").unwrap().value else {
            panic!("expected a failed binding");
        };
        assert_eq!(error.class(), "UnknownIdentifier");
        assert_eq!(error.span().map(|s| (s.line, s.col)), Some((2, 18)));
    }

    // ========================================================================
    // Node Errors
    // ========================================================================

    #[test]
    fn unknown_control_is_a_node_error() {
        let tree = resolve("@viewModel App.Customer\n<p><dot:Missing /></p>").unwrap();
        let errors = node_errors(&tree);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "unknown control 'dot:Missing'");
        assert_eq!((errors[0].1.line, errors[0].1.col), (2, 4));
    }

    #[test]
    fn unknown_and_duplicate_properties() {
        let tree = resolve("@viewModel App.Customer\n<dot:TextBox Text=\"a\" Text=\"b\" Color=\"red\" />").unwrap();
        let messages: Vec<_> = node_errors(&tree).into_iter().map(|(m, _)| m).collect();
        assert_eq!(
            messages,
            [
                "property 'Text' is set more than once on 'dot:TextBox'",
                "control 'dot:TextBox' does not have a property 'Color'",
            ]
        );
    }

    #[test]
    fn content_in_non_container() {
        let tree = resolve("@viewModel App.Customer\n<dot:TextBox Text=\"a\">  </dot:TextBox><dot:TextBox Text=\"a\">x</dot:TextBox>").unwrap();
        let errors = node_errors(&tree);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "control 'dot:TextBox' does not allow content");
    }

    #[test]
    fn parser_problems_become_node_errors() {
        let tree = resolve("@viewModel App.Customer\n<div><p>text</div></span>").unwrap();
        let messages: Vec<_> = node_errors(&tree).into_iter().map(|(m, _)| m).collect();
        assert!(messages.contains(&"element <p> is not closed".to_string()));
        assert!(messages.contains(&"closing tag </span> has no matching start tag".to_string()));
    }

    #[test]
    fn master_page_views_only_hold_content() {
        let tree = resolve(
            "@viewModel App.Customer\n@masterPage Views/Site.dotmaster\n<dot:Content ContentPlaceHolderID=\"main\"></dot:Content>\n<p></p>",
        )
        .unwrap();
        let errors = node_errors(&tree);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].1.line, 4);
        assert_eq!(
            tree.directives.master_page.as_ref().map(|m| m.path.as_str()),
            Some("Views/Site.dotmaster")
        );
    }

    // ========================================================================
    // Markup Controls
    // ========================================================================

    fn card_options() -> CompilerOptions {
        CompilerOptions {
            markup_controls: vec![crate::options::MarkupControlRegistration {
                tag_prefix: "cc".into(),
                tag_name: "Card".into(),
                src: "~/Controls/Card.dotcontrol".into(),
            }],
            ..CompilerOptions::default()
        }
    }

    #[test]
    fn markup_control_references_are_deduplicated() {
        let document = parse_markup("<cc:Card /><div><cc:Card /></div><dot:TextBox />").unwrap();
        let references = markup_control_references(&document, &card_options());
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].0, "Controls/Card.dotcontrol");
    }

    #[test]
    fn markup_control_uses_compiled_dependency() {
        let mut compiled = FxHashMap::default();
        compiled.insert(
            "Controls/Card.dotcontrol".to_string(),
            compiled_control("Controls/Card.dotcontrol", "App.Address"),
        );
        let tree = resolve_with(
            "@viewModel App.Customer\n<cc:Card DataContext={value: Address} />",
            ViewKind::Page,
            &card_options(),
            &compiled,
        )
        .unwrap();
        let card = tree.root.child_controls().next().unwrap();
        assert_eq!(
            card.kind,
            ControlKind::Markup {
                path: "Controls/Card.dotcontrol".into(),
                view_model: DataType::named("App.Address"),
            }
        );
    }

    #[test]
    fn failed_markup_control_is_a_node_error() {
        let failed = CompiledView::from_error(
            "Controls/Card.dotcontrol",
            &CompilationError::SourceNotFound {
                path: "Controls/Card.dotcontrol".into(),
            },
        );
        let mut compiled = FxHashMap::default();
        compiled.insert("Controls/Card.dotcontrol".to_string(), Arc::new(failed));
        let tree = resolve_with("@viewModel App.Customer\n<cc:Card />", ViewKind::Page, &card_options(), &compiled).unwrap();
        assert_eq!(
            node_errors(&tree)[0].0,
            "markup control 'Controls/Card.dotcontrol' failed to compile"
        );
    }
}
