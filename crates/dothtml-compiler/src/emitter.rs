//! Emission of the control builder for a validated tree.
//!
//! The emitted [`SyntaxUnit`] is a flat list of builder statements in tree
//! order plus a textual rendering of the builder class, ready for a
//! downstream code generator. Alongside it the emitter collects the module
//! of every registry type the statements reference.

use std::collections::BTreeSet;
use std::fmt;

use dothtml_core::DataType;
use dothtml_parser::markup::BindingKind;
use dothtml_registry::TypeSystem;
use dothtml_registry::controls;
use xxhash_rust::xxh64::xxh64;

use crate::control_tree::{PropertyValue, ResolvedControl, ResolvedNode, ResolvedTree};
use crate::typed_expr::TypedExpr;

const GENERATED_NAMESPACE: &str = "DotHtml.Generated";
const ROOT_VAR: &str = "c0";

/// One step of building the control tree at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateControl {
        var: String,
        ty: DataType,
    },
    SetValue {
        var: String,
        property: String,
        value: String,
    },
    /// A plain HTML attribute.
    SetAttribute {
        var: String,
        name: String,
        value: String,
    },
    SetBinding {
        var: String,
        property: String,
        kind: BindingKind,
        /// The resolved expression, rendered.
        expression: String,
        result_type: DataType,
    },
    SetInternal {
        var: String,
        property: String,
        ty: DataType,
    },
    AddChild {
        parent: String,
        child: String,
    },
    AddText {
        parent: String,
        text: String,
    },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateControl { var, ty } => write!(f, "var {var} = new {ty}();"),
            Statement::SetValue { var, property, value } => write!(f, "{var}.SetValue({property:?}, {value:?});"),
            Statement::SetAttribute { var, name, value } => write!(f, "{var}.Attributes[{name:?}] = {value:?};"),
            Statement::SetBinding {
                var,
                property,
                kind,
                expression,
                result_type,
            } => write!(
                f,
                "{var}.SetBinding({property:?}, BindingKind.{}, typeof({result_type}), {expression:?});",
                binding_kind_name(*kind)
            ),
            Statement::SetInternal { var, property, ty } => {
                write!(f, "{var}.SetInternal({property:?}, typeof({ty}));")
            }
            Statement::AddChild { parent, child } => write!(f, "{parent}.Children.Add({child});"),
            Statement::AddText { parent, text } => write!(f, "{parent}.Children.Add(new RawLiteral({text:?}));"),
        }
    }
}

fn binding_kind_name(kind: BindingKind) -> &'static str {
    match kind {
        BindingKind::Value => "Value",
        BindingKind::Command => "Command",
        BindingKind::Resource => "Resource",
    }
}

/// The emitted control builder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxUnit {
    pub namespace: String,
    pub class_name: String,
    pub view_path: String,
    pub master_page: Option<String>,
    pub statements: Vec<Statement>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNames {
    pub namespace: String,
    pub class_name: String,
}

/// Namespace and class name for the builder of `file_name`.
///
/// The namespace carries the file's directory and a hash of the file name
/// and its last-modified time, so a changed file gets a fresh namespace.
pub fn generated_names(file_name: &str, last_modified: u64) -> GeneratedNames {
    let (directory, file) = match file_name.rsplit_once('/') {
        Some((directory, file)) => (directory, file),
        None => ("", file_name),
    };
    let stem = file.split('.').next().unwrap_or(file);
    let hash = xxh64(format!("{file_name}\0{last_modified}").as_bytes(), 0);

    let mut namespace = GENERATED_NAMESPACE.to_string();
    for segment in directory.split('/').filter(|s| !s.is_empty()) {
        namespace.push('.');
        namespace.push_str(&sanitize_identifier(segment));
    }
    namespace.push_str(&format!("._{hash:016x}"));

    GeneratedNames {
        namespace,
        class_name: format!("{}ControlBuilder", sanitize_identifier(stem)),
    }
}

fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// What emission produced for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedView {
    pub unit: SyntaxUnit,
    pub referenced_modules: BTreeSet<String>,
    pub placeholders: Vec<String>,
}

pub struct Emitter<'a> {
    types: &'a dyn TypeSystem,
    statements: Vec<Statement>,
    modules: BTreeSet<String>,
    placeholders: Vec<String>,
    next_var: usize,
}

impl<'a> Emitter<'a> {
    pub fn emit(types: &'a dyn TypeSystem, tree: &ResolvedTree, names: GeneratedNames) -> EmittedView {
        #[cfg(feature = "profiling")]
        profiling::scope!("Emitter::emit");

        let mut emitter = Emitter {
            types,
            statements: Vec::new(),
            modules: BTreeSet::new(),
            placeholders: Vec::new(),
            next_var: 1,
        };
        emitter.reference(&tree.directives.view_model);
        emitter.create(ROOT_VAR, &tree.root);

        let master_page = tree.directives.master_page.as_ref().map(|m| m.path.clone());
        let text = render(&names, &tree.path, master_page.as_deref(), &emitter.statements);
        EmittedView {
            unit: SyntaxUnit {
                namespace: names.namespace,
                class_name: names.class_name,
                view_path: tree.path.clone(),
                master_page,
                statements: emitter.statements,
                text,
            },
            referenced_modules: emitter.modules,
            placeholders: emitter.placeholders,
        }
    }

    fn reference(&mut self, ty: &DataType) {
        match ty {
            DataType::Named(named) => {
                if let Some(module) = self.types.module_of(ty) {
                    self.modules.insert(module.to_string());
                }
                for arg in &named.args {
                    self.reference(arg);
                }
            }
            DataType::Array(inner) | DataType::Nullable(inner) => self.reference(inner),
            _ => {}
        }
    }

    fn reference_expr(&mut self, expr: &TypedExpr) {
        let mut types = Vec::new();
        expr.walk(&mut |node| match node {
            TypedExpr::MemberAccess { member, .. } => types.push(member.declaring.clone()),
            TypedExpr::CapabilityGet { property, .. } | TypedExpr::CapabilitySet { property, .. } => {
                types.push(property.declaring.clone())
            }
            TypedExpr::Call { method, .. } => types.push(method.declaring.clone()),
            TypedExpr::Index {
                indexer: Some(indexer), ..
            } => types.push(indexer.declaring.clone()),
            TypedExpr::StaticTypeReference(ty) | TypedExpr::Convert { ty, .. } => types.push(ty.clone()),
            TypedExpr::Binary { method: Some(method), .. } | TypedExpr::Unary { method: Some(method), .. } => {
                types.push(method.declaring.clone())
            }
            _ => {}
        });
        for ty in &types {
            self.reference(ty);
        }
    }

    fn fresh_var(&mut self) -> String {
        let var = format!("c{}", self.next_var);
        self.next_var += 1;
        var
    }

    fn create(&mut self, var: &str, control: &ResolvedControl) {
        self.reference(control.ty());
        self.statements.push(Statement::CreateControl {
            var: var.to_string(),
            ty: control.ty().clone(),
        });
        if control.is(controls::CONTENT_PLACEHOLDER)
            && let Some(id) = control.hard_coded("ID")
        {
            self.placeholders.push(id.to_string());
        }

        for internal in &control.internal {
            self.reference(&internal.value);
            self.statements.push(Statement::SetInternal {
                var: var.to_string(),
                property: internal.name.to_string(),
                ty: internal.value.clone(),
            });
        }

        for property in &control.properties {
            let statement = match (&property.value, &property.capability) {
                (PropertyValue::HardCoded(value), Some(_)) => Statement::SetValue {
                    var: var.to_string(),
                    property: property.name.clone(),
                    value: value.clone(),
                },
                (PropertyValue::HardCoded(value), None) => Statement::SetAttribute {
                    var: var.to_string(),
                    name: property.name.clone(),
                    value: value.clone(),
                },
                (PropertyValue::Binding(binding), _) => {
                    self.reference_expr(&binding.expr);
                    let result_type = binding.result_type();
                    self.reference(&result_type);
                    Statement::SetBinding {
                        var: var.to_string(),
                        property: property.name.clone(),
                        kind: binding.kind,
                        expression: binding.expr.to_string(),
                        result_type,
                    }
                }
                // Failed bindings never reach emission.
                (PropertyValue::Failed(_), _) => continue,
            };
            self.statements.push(statement);
        }

        for child in &control.children {
            match child {
                ResolvedNode::Control(child) => {
                    let child_var = self.fresh_var();
                    self.create(&child_var, child);
                    self.statements.push(Statement::AddChild {
                        parent: var.to_string(),
                        child: child_var,
                    });
                }
                ResolvedNode::Text { text, .. } if !text.is_empty() => self.statements.push(Statement::AddText {
                    parent: var.to_string(),
                    text: text.clone(),
                }),
                ResolvedNode::Text { .. } => {}
            }
        }
    }
}

fn render(names: &GeneratedNames, view_path: &str, master_page: Option<&str>, statements: &[Statement]) -> String {
    let mut text = String::new();
    text.push_str(&format!("namespace {}\n{{\n", names.namespace));
    text.push_str(&format!("    // {view_path}\n"));
    if let Some(master_page) = master_page {
        text.push_str(&format!("    [MasterPage({master_page:?})]\n"));
    }
    text.push_str(&format!("    public sealed class {} : IControlBuilder\n    {{\n", names.class_name));
    text.push_str("        public DotHtmlControl BuildControl(IControlBuilderFactory factory)\n        {\n");
    for statement in statements {
        text.push_str(&format!("            {statement}\n"));
    }
    text.push_str(&format!("            return {ROOT_VAR};\n"));
    text.push_str("        }\n    }\n}\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitors::test_support::{registry, resolve_with};
    use crate::visitors::DataContextPropagation;
    use crate::options::CompilerOptions;

    fn emit(markup: &str) -> EmittedView {
        let registry = registry();
        let mut tree = resolve_with(&registry, &CompilerOptions::default(), markup);
        DataContextPropagation::run(&mut tree);
        Emitter::emit(&registry, &tree, generated_names("Views/Default.dothtml", 42))
    }

    // ========================================================================
    // Names
    // ========================================================================

    #[test]
    fn names_follow_path_and_timestamp() {
        let names = generated_names("Views/Admin/user-list.dothtml", 7);
        assert!(names.namespace.starts_with("DotHtml.Generated.Views.Admin._"));
        assert_eq!(names.class_name, "user_listControlBuilder");
        assert_eq!(names, generated_names("Views/Admin/user-list.dothtml", 7));
        assert_ne!(names.namespace, generated_names("Views/Admin/user-list.dothtml", 8).namespace);
    }

    #[test]
    fn identifiers_never_start_with_a_digit() {
        assert_eq!(generated_names("404.dothtml", 0).class_name, "_404ControlBuilder");
    }

    // ========================================================================
    // Statements
    // ========================================================================

    #[test]
    fn statements_follow_tree_order() {
        let view = emit("@viewModel App.Customer\n<div class=\"box\"><dot:TextBox Text={value: Name} /></div>");
        let rendered: Vec<String> = view.unit.statements.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            rendered,
            [
                "var c0 = new DotHtml.Controls.DotHtmlView();",
                "c0.SetInternal(\"DataContextType\", typeof(App.Customer));",
                "c0.Children.Add(new RawLiteral(\"\\n\"));",
                "var c1 = new DotHtml.Controls.HtmlGenericControl();",
                "c1.Attributes[\"class\"] = \"box\";",
                "var c2 = new DotHtml.Controls.TextBox();",
                "c2.SetBinding(\"Text\", BindingKind.Value, typeof(string), \"_this.Name\");",
                "c1.Children.Add(c2);",
                "c0.Children.Add(c1);",
            ]
        );
        assert!(view.unit.text.contains("public sealed class DefaultControlBuilder : IControlBuilder"));
        assert!(view.unit.text.contains("return c0;"));
    }

    #[test]
    fn referenced_modules_cover_controls_members_and_view_model() {
        let view = emit("@viewModel App.Customer\n<dot:TextBox Text={value: Address.City} />");
        let modules: Vec<_> = view.referenced_modules.iter().map(String::as_str).collect();
        assert!(modules.contains(&"App"));
        assert!(modules.contains(&"DotHtml.Framework"));
    }

    #[test]
    fn master_page_placeholders_are_collected() {
        let view = emit(
            "@viewModel App.Customer\n<dot:ContentPlaceHolder ID=\"main\" /><dot:ContentPlaceHolder ID=\"side\" />",
        );
        assert_eq!(view.placeholders, ["main", "side"]);
    }
}
