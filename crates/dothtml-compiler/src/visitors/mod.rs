//! Passes over the resolved control tree.
//!
//! Each pass implements [`ControlTreeVisitor`]. The default `visit_control`
//! walks the children, so a pass overrides it, does its work on the
//! control, and calls [`walk_control`] to continue.
//!
//! The pipeline runs the passes in a fixed order: error checking first
//! (node errors, then the first failed binding), then data-context
//! propagation, styling and usage validation.

mod data_context;
mod error_checking;
mod styling;
mod usage_validation;

pub use data_context::DataContextPropagation;
pub use error_checking::ErrorChecking;
pub use styling::Styling;
pub use usage_validation::UsageValidation;

use crate::control_tree::{ResolvedControl, ResolvedNode, ResolvedTree};

pub trait ControlTreeVisitor: Sized {
    fn visit_tree(&mut self, tree: &mut ResolvedTree) {
        self.visit_control(&mut tree.root);
    }

    fn visit_control(&mut self, control: &mut ResolvedControl) {
        walk_control(self, control);
    }
}

/// Visit every child control of `control`.
pub fn walk_control<V: ControlTreeVisitor>(visitor: &mut V, control: &mut ResolvedControl) {
    for child in &mut control.children {
        if let ResolvedNode::Control(child) = child {
            visitor.visit_control(child);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use dothtml_core::DataType;
    use dothtml_parser::markup::parse_markup;
    use dothtml_registry::{MethodBuilder, TypeBuilder, TypeRegistry};
    use rustc_hash::FxHashMap;

    use crate::control_tree::{ControlTreeResolver, ResolvedTree};
    use crate::options::CompilerOptions;
    use crate::view::ViewKind;

    pub fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_standard_controls();
        for entry in [
            TypeBuilder::new("App.Address", "App")
                .property("City", DataType::string())
                .build(),
            TypeBuilder::new("App.Customer", "App")
                .property("Name", DataType::string())
                .property("Age", DataType::int32())
                .property("IsActive", DataType::bool())
                .property("Address", DataType::named("App.Address"))
                .method(MethodBuilder::new("Save", DataType::Void))
                .build(),
        ] {
            registry.register_type(entry).unwrap();
        }
        registry
    }

    pub fn resolve_with(registry: &TypeRegistry, options: &CompilerOptions, markup: &str) -> ResolvedTree {
        let document = parse_markup(markup).unwrap();
        let markup_controls = FxHashMap::default();
        ControlTreeResolver::new(registry, options, &markup_controls)
            .resolve("Views/Test.dothtml", ViewKind::Page, &document)
            .unwrap()
    }

    pub fn resolve(markup: &str) -> ResolvedTree {
        resolve_with(&registry(), &CompilerOptions::default(), markup)
    }
}
