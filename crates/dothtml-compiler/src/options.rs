//! Compiler options shared by every view of a run.

use serde::{Deserialize, Serialize};

/// Tag prefix mapped to a namespace of code controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlNamespace {
    pub tag_prefix: String,
    pub namespace: String,
}

/// A markup control usable as `<tag_prefix:tag_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupControlRegistration {
    pub tag_prefix: String,
    pub tag_name: String,
    pub src: String,
}

/// A property value applied to every matching control by the styling pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    /// Tag as written in markup (`dot:TextBox`) or the control's type name.
    pub control: String,
    pub property: String,
    pub value: String,
    /// Replace a value set in markup instead of only filling a missing one.
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerOptions {
    #[serde(default = "default_control_namespaces")]
    pub control_namespaces: Vec<ControlNamespace>,
    #[serde(default)]
    pub markup_controls: Vec<MarkupControlRegistration>,
    #[serde(default)]
    pub styles: Vec<StyleRule>,
}

fn default_control_namespaces() -> Vec<ControlNamespace> {
    vec![ControlNamespace {
        tag_prefix: "dot".to_string(),
        namespace: dothtml_registry::CONTROLS_NAMESPACE.to_string(),
    }]
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            control_namespaces: default_control_namespaces(),
            markup_controls: Vec::new(),
            styles: Vec::new(),
        }
    }
}

impl CompilerOptions {
    pub fn control_namespace(&self, prefix: &str) -> Option<&str> {
        self.control_namespaces
            .iter()
            .find(|ns| ns.tag_prefix.eq_ignore_ascii_case(prefix))
            .map(|ns| ns.namespace.as_str())
    }

    pub fn markup_control(&self, prefix: &str, name: &str) -> Option<&MarkupControlRegistration> {
        self.markup_controls
            .iter()
            .find(|c| c.tag_prefix.eq_ignore_ascii_case(prefix) && c.tag_name.eq_ignore_ascii_case(name))
    }
}
