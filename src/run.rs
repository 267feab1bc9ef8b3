//! Compiling every view a configuration names.

use std::collections::BTreeSet;
use std::sync::Arc;

use dothtml_compiler::{CompiledView, MarkupSource, ViewCompiler};
use dothtml_registry::TypeRegistry;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::CompilerConfig;

/// Outcome of a run. Whether a failed view fails the run is up to the
/// caller.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Markup controls first, then routes.
    pub views: Vec<Arc<CompiledView>>,
    /// Union of the modules every successful view references.
    pub referenced_modules: BTreeSet<String>,
    pub debug: bool,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.views.iter().all(|view| view.is_success())
    }

    pub fn failed_views(&self) -> impl Iterator<Item = &Arc<CompiledView>> {
        self.views.iter().filter(|view| !view.is_success())
    }

    pub fn view(&self, path: &str) -> Option<&Arc<CompiledView>> {
        let path = dothtml_compiler::normalize_path(path);
        self.views.iter().find(|view| view.path == path)
    }
}

pub struct StaticViewCompiler {
    compiler: ViewCompiler,
    config: CompilerConfig,
}

impl StaticViewCompiler {
    pub fn new(registry: Arc<TypeRegistry>, source: Arc<dyn MarkupSource>, config: CompilerConfig) -> Self {
        let compiler = ViewCompiler::new(registry, source, config.options.clone());
        Self { compiler, config }
    }

    pub fn compiler(&self) -> &ViewCompiler {
        &self.compiler
    }

    pub fn compile(&self) -> RunResult {
        #[cfg(feature = "profiling")]
        profiling::scope!("StaticViewCompiler::compile");

        let paths = self.config.view_paths();
        info!(views = paths.len(), debug = self.config.debug, "compiling views");

        let views: Vec<Arc<CompiledView>> = paths.par_iter().map(|path| self.compiler.compile(path)).collect();

        let referenced_modules = views
            .iter()
            .filter_map(|view| view.artifact())
            .flat_map(|artifact| artifact.referenced_modules.iter().cloned())
            .collect();
        let result = RunResult {
            views,
            referenced_modules,
            debug: self.config.debug,
        };

        let failed = result.failed_views().count();
        if failed > 0 {
            warn!(failed, "views failed to compile");
        }
        info!(views = result.views.len(), failed, "compilation finished");
        result
    }
}
