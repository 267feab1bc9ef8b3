//! Code controls available in markup, and the metadata the control-tree
//! resolver reads from them.

use std::sync::Arc;

use dothtml_core::DataType;

use crate::builder::TypeBuilder;
use crate::entries::{CapabilityProperty, MarkupOptions, TypeFlags};
use crate::registry::TypeRegistry;
use crate::type_system::TypeSystem;

pub const CONTROLS_NAMESPACE: &str = "DotHtml.Controls";
pub const CONTROLS_MODULE: &str = "DotHtml.Framework";

pub const BINDABLE_OBJECT: &str = "DotHtml.Controls.DotHtmlBindableObject";
pub const CONTROL_BASE: &str = "DotHtml.Controls.DotHtmlControl";
pub const HTML_GENERIC_CONTROL: &str = "DotHtml.Controls.HtmlGenericControl";
pub const MARKUP_CONTROL: &str = "DotHtml.Controls.MarkupControl";
/// Root of a compiled page or master page.
pub const VIEW: &str = "DotHtml.Controls.DotHtmlView";
pub const CONTENT_PLACEHOLDER: &str = "DotHtml.Controls.ContentPlaceHolder";
pub const CONTENT: &str = "DotHtml.Controls.Content";
/// Renders `{{value: ...}}` text bindings.
pub const LITERAL: &str = "DotHtml.Controls.Literal";

/// Name of the property every control inherits for switching data context.
pub const DATA_CONTEXT_PROPERTY: &str = "DataContext";

/// What markup may do with a control type.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMetadata {
    pub ty: DataType,
    pub allows_content: bool,
    pub properties: Vec<CapabilityProperty>,
    pub module: Option<Arc<str>>,
}

impl ControlMetadata {
    pub fn property(&self, name: &str) -> Option<&CapabilityProperty> {
        self.properties.iter().find(|p| &*p.name == name)
    }

    pub fn required_properties(&self) -> impl Iterator<Item = &CapabilityProperty> {
        self.properties.iter().filter(|p| p.markup.required)
    }
}

impl TypeRegistry {
    /// Register the standard control set under [`CONTROLS_NAMESPACE`].
    pub fn with_standard_controls() -> Self {
        let mut registry = Self::with_primitives();
        register_standard_controls(&mut registry);
        registry
    }

    /// Metadata for a control type, `None` if `ty` is not a control.
    pub fn control_metadata(&self, ty: &DataType) -> Option<ControlMetadata> {
        let flags = self.type_flags(ty);
        if !flags.contains(TypeFlags::CONTROL) {
            return None;
        }
        Some(ControlMetadata {
            ty: ty.clone(),
            allows_content: flags.contains(TypeFlags::ALLOWS_CONTENT),
            properties: self.capability_properties(ty),
            module: self.module_of(ty),
        })
    }
}

fn control(name: &str) -> TypeBuilder {
    TypeBuilder::new(name, CONTROLS_MODULE)
        .flags(TypeFlags::CONTROL)
        .base(DataType::named(CONTROL_BASE))
}

fn container(name: &str) -> TypeBuilder {
    control(name).flags(TypeFlags::ALLOWS_CONTENT)
}

pub(crate) fn register_standard_controls(registry: &mut TypeRegistry) {
    let string = DataType::string;
    let binding_only = MarkupOptions {
        allow_hard_coded: false,
        ..MarkupOptions::default()
    };
    let entries = [
        TypeBuilder::new(BINDABLE_OBJECT, CONTROLS_MODULE)
            .capability(DATA_CONTEXT_PROPERTY, DataType::object(), binding_only)
            .build(),
        TypeBuilder::new(CONTROL_BASE, CONTROLS_MODULE)
            .base(DataType::named(BINDABLE_OBJECT))
            .capability("ID", string(), MarkupOptions::hard_coded_only())
            .capability("Visible", DataType::bool(), MarkupOptions::default())
            .build(),
        container(HTML_GENERIC_CONTROL).build(),
        container(MARKUP_CONTROL).build(),
        container(VIEW).build(),
        control(LITERAL)
            .capability("Text", DataType::object(), MarkupOptions::default().required())
            .build(),
        control("DotHtml.Controls.TextBox")
            .capability("Text", string(), MarkupOptions::default().required())
            .capability("Enabled", DataType::bool(), MarkupOptions::default())
            .build(),
        control("DotHtml.Controls.CheckBox")
            .capability("Checked", DataType::bool(), MarkupOptions::default().required())
            .capability("Text", string(), MarkupOptions::default())
            .build(),
        container("DotHtml.Controls.Button")
            .capability("Text", string(), MarkupOptions::default())
            .capability("Click", DataType::object(), MarkupOptions::command().required())
            .build(),
        container(CONTENT_PLACEHOLDER)
            .capability("ID", string(), MarkupOptions::hard_coded_only().required())
            .build(),
        container(CONTENT)
            .capability("ContentPlaceHolderID", string(), MarkupOptions::hard_coded_only().required())
            .build(),
    ];
    for entry in entries {
        registry.insert(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_capability_overrides_base() {
        let registry = TypeRegistry::with_standard_controls();
        let metadata = registry
            .control_metadata(&DataType::named(CONTENT_PLACEHOLDER))
            .unwrap();
        let id = metadata.property("ID").unwrap();
        assert!(id.markup.required);
        assert_eq!(metadata.properties.iter().filter(|p| &*p.name == "ID").count(), 1);
        assert!(metadata.property(DATA_CONTEXT_PROPERTY).is_some());
    }

    #[test]
    fn base_control_is_not_usable_in_markup() {
        let registry = TypeRegistry::with_standard_controls();
        assert!(registry.control_metadata(&DataType::named(CONTROL_BASE)).is_none());
        assert!(registry.control_metadata(&DataType::string()).is_none());
    }

    #[test]
    fn button_click_is_a_required_command() {
        let registry = TypeRegistry::with_standard_controls();
        let metadata = registry
            .control_metadata(&DataType::named("DotHtml.Controls.Button"))
            .unwrap();
        let required: Vec<_> = metadata.required_properties().map(|p| &*p.name).collect();
        assert_eq!(required, ["Click"]);
        assert!(metadata.property("Click").unwrap().markup.is_command);
    }
}
