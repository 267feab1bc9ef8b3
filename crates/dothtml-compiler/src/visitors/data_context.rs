//! Marks controls that switch data context.

use std::sync::Arc;

use super::{ControlTreeVisitor, walk_control};
use crate::control_tree::{DATA_CONTEXT_TYPE, InternalProperty, ResolvedControl, ResolvedTree};
use crate::data_context::DataContextStack;

/// Adds [`DATA_CONTEXT_TYPE`] to the root and to every control whose
/// data-context stack differs from its parent's.
#[derive(Default)]
pub struct DataContextPropagation {
    parents: Vec<Arc<DataContextStack>>,
    marked: usize,
}

impl DataContextPropagation {
    /// Run the pass, returning how many controls were marked.
    pub fn run(tree: &mut ResolvedTree) -> usize {
        let mut pass = Self::default();
        pass.visit_tree(tree);
        pass.marked
    }
}

impl ControlTreeVisitor for DataContextPropagation {
    fn visit_control(&mut self, control: &mut ResolvedControl) {
        let switched = match self.parents.last() {
            Some(parent) => !Arc::ptr_eq(parent, &control.data_context) && **parent != *control.data_context,
            None => true,
        };
        if switched && control.internal(DATA_CONTEXT_TYPE).is_none() {
            control.internal.push(InternalProperty {
                name: DATA_CONTEXT_TYPE,
                value: control.data_context.this().clone(),
            });
            self.marked += 1;
        }
        self.parents.push(Arc::clone(&control.data_context));
        walk_control(self, control);
        self.parents.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_core::DataType;

    use crate::visitors::test_support::resolve;

    #[test]
    fn root_and_switching_controls_are_marked() {
        let mut tree = resolve(
            "@viewModel App.Customer\n<div><section DataContext={value: Address}><p>{{value: City}}</p></section></div>",
        );
        assert_eq!(DataContextPropagation::run(&mut tree), 2);
        assert_eq!(tree.root.internal(DATA_CONTEXT_TYPE), Some(&DataType::named("App.Customer")));

        let div = tree.root.child_controls().next().unwrap();
        assert!(div.internal(DATA_CONTEXT_TYPE).is_none());
        let section = div.child_controls().next().unwrap();
        assert_eq!(section.internal(DATA_CONTEXT_TYPE), Some(&DataType::named("App.Address")));
        let p = section.child_controls().next().unwrap();
        assert!(p.internal(DATA_CONTEXT_TYPE).is_none());
    }

    #[test]
    fn running_twice_does_not_duplicate_markers() {
        let mut tree = resolve("@viewModel App.Customer\n<p></p>");
        DataContextPropagation::run(&mut tree);
        assert_eq!(DataContextPropagation::run(&mut tree), 0);
        assert_eq!(tree.root.internal.len(), 1);
    }
}
