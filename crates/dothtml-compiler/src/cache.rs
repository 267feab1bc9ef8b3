//! The View Cache: one canonical compiled view per path.
//!
//! Concurrent first requests for a path may both run the pipeline. The
//! cache's only synchronization is the insert: the first result stored
//! wins, and a later insert for the same path returns the stored view and
//! drops its own. Compiles are pure, so the dropped result is only wasted
//! work.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use crate::view::CompiledView;

#[derive(Debug, Default)]
pub struct ViewCache {
    views: DashMap<String, Arc<CompiledView>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Arc<CompiledView>> {
        let view = self.views.get(path).map(|entry| Arc::clone(entry.value()));
        debug!(path, hit = view.is_some(), "view cache lookup");
        view
    }

    /// Store `view` unless its path already has a result, and return the
    /// canonical result for the path.
    pub fn insert(&self, view: CompiledView) -> Arc<CompiledView> {
        match self.views.entry(view.path.clone()) {
            Entry::Occupied(existing) => {
                warn!(path = %view.path, "discarding duplicate compile result");
                Arc::clone(existing.get())
            }
            Entry::Vacant(slot) => {
                debug!(path = %view.path, success = view.is_success(), "caching compiled view");
                Arc::clone(slot.insert(Arc::new(view)).value())
            }
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.views.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Snapshot of every cached view, sorted by path.
    pub fn views(&self) -> Vec<Arc<CompiledView>> {
        let mut views: Vec<_> = self.views.iter().map(|entry| Arc::clone(entry.value())).collect();
        views.sort_by(|a, b| a.path.cmp(&b.path));
        views
    }
}
