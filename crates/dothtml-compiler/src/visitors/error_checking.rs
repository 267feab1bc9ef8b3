//! Node errors and failed bindings.

use dothtml_core::{CompilationError, Report};

use super::{ControlTreeVisitor, walk_control};
use crate::control_tree::{PropertyValue, ResolvedControl, ResolvedTree};

pub struct ErrorChecking {
    path: String,
    node_errors: Vec<Report>,
}

impl ErrorChecking {
    /// Every node error in the tree if there are any, otherwise the first
    /// binding that failed to resolve as a single report.
    pub fn check(tree: &mut ResolvedTree) -> Result<(), Vec<Report>> {
        let mut pass = ErrorChecking {
            path: tree.path.clone(),
            node_errors: Vec::new(),
        };
        pass.visit_tree(tree);
        if !pass.node_errors.is_empty() {
            return Err(pass.node_errors);
        }
        match first_binding_error(tree) {
            Some(error) => Err(vec![Report::from_error(pass.path, error)]),
            None => Ok(()),
        }
    }
}

impl ControlTreeVisitor for ErrorChecking {
    fn visit_control(&mut self, control: &mut ResolvedControl) {
        for error in &control.node_errors {
            self.node_errors
                .push(Report::new(self.path.as_str(), Some(error.span), "ControlTree", error.message.clone()));
        }
        walk_control(self, control);
    }
}

/// The first binding in document order that failed to resolve.
fn first_binding_error(tree: &ResolvedTree) -> Option<&CompilationError> {
    tree.controls().into_iter().find_map(|control| {
        control.properties.iter().find_map(|p| match &p.value {
            PropertyValue::Failed(error) => Some(error),
            _ => None,
        })
    })
}
