//! Data-context stacks.
//!
//! Every control is bound against a stack of data-context types: `_this`
//! is the innermost, `_parent` (or `_parent1`) the next, `_parentN` the
//! N-th ancestor and `_root` the outermost. A `DataContext` binding pushes
//! a new level for an element and its children.

use std::sync::Arc;

use dothtml_core::DataType;

/// One level of a data-context stack, linked to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataContextStack {
    this: DataType,
    parent: Option<Arc<DataContextStack>>,
    /// Namespaces searched for type names, from `@import` directives.
    namespaces: Arc<[String]>,
}

impl DataContextStack {
    /// A root stack whose `_this` is the view model type.
    pub fn root(this: DataType, namespaces: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            this,
            parent: None,
            namespaces: namespaces.into(),
        })
    }

    /// Push `this` on top of `parent`.
    pub fn child(parent: &Arc<Self>, this: DataType) -> Arc<Self> {
        Arc::new(Self {
            this,
            parent: Some(Arc::clone(parent)),
            namespaces: Arc::clone(&parent.namespaces),
        })
    }

    pub fn this(&self) -> &DataType {
        &self.this
    }

    pub fn parent(&self) -> Option<&Arc<DataContextStack>> {
        self.parent.as_ref()
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// The `n`-th level up; `ancestor(0)` is this level.
    pub fn ancestor(&self, n: usize) -> Option<&DataContextStack> {
        let mut current = self;
        for _ in 0..n {
            current = current.parent.as_deref()?;
        }
        Some(current)
    }

    pub fn root_type(&self) -> &DataType {
        let mut current = self;
        while let Some(parent) = current.parent.as_deref() {
            current = parent;
        }
        &current.this
    }

    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self;
        while let Some(parent) = current.parent.as_deref() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Type of a data-context keyword (`_this`, `_parent`, `_parentN`, `_root`).
    pub fn keyword(&self, name: &str) -> Option<DataType> {
        match name {
            "_this" => Some(self.this.clone()),
            "_root" => Some(self.root_type().clone()),
            "_parent" => self.ancestor(1).map(|level| level.this.clone()),
            _ => {
                let n: usize = name.strip_prefix("_parent")?.parse().ok()?;
                self.ancestor(n).map(|level| level.this.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> Arc<DataContextStack> {
        let root = DataContextStack::root(DataType::named("App.Page"), vec!["App".to_string()]);
        let middle = DataContextStack::child(&root, DataType::named("App.Order"));
        DataContextStack::child(&middle, DataType::named("App.Line"))
    }

    #[test]
    fn keywords_walk_the_stack() {
        let stack = stack();
        assert_eq!(stack.keyword("_this"), Some(DataType::named("App.Line")));
        assert_eq!(stack.keyword("_parent"), Some(DataType::named("App.Order")));
        assert_eq!(stack.keyword("_parent2"), Some(DataType::named("App.Page")));
        assert_eq!(stack.keyword("_root"), Some(DataType::named("App.Page")));
        assert_eq!(stack.keyword("_parent3"), None);
        assert_eq!(stack.keyword("Name"), None);
    }

    #[test]
    fn children_share_namespaces() {
        let stack = stack();
        assert_eq!(stack.namespaces(), ["App".to_string()]);
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn stacks_compare_structurally() {
        assert_eq!(stack(), stack());
        let root = DataContextStack::root(DataType::named("App.Page"), Vec::new());
        assert_ne!(*stack(), *root);
    }
}
