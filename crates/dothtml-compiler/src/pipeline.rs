//! View compilation pipeline.
//!
//! ## Stages
//!
//! ```text
//! Requested ─► Tokenizing ─► Parsing ─► Resolving ─► Validating ─► Emitting ─► Succeeded
//!     │            │            │           │             │            │
//!     └─ cache hit └────────────┴───────────┴─────────────┴────────────┴─────► Failed
//! ```
//!
//! - **Requested**: a cached result short-circuits the run.
//! - **Tokenizing / Parsing**: tokenizer failures are fatal; tree-building
//!   problems become node errors later.
//! - **Resolving**: markup controls the view uses are compiled first, then
//!   the control tree is built. Node errors, then the first failed binding,
//!   fail the view here.
//! - **Validating**: data-context propagation, styling and usage validation,
//!   in that order. Any usage report fails the view.
//! - **Emitting**: the master page, if any, is compiled through the same
//!   cache before the builder is emitted.
//!
//! A compile may recursively compile master pages and markup controls on
//! the same call stack. The chain of paths being compiled is carried along
//! so that a view requiring itself is rejected with a `DependencyCycle`
//! report instead of recursing.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use dashmap::DashMap;
use dothtml_core::{CompilationError, Report, Span};
use dothtml_parser::markup::{MarkupParser, tokenize_markup};
use dothtml_registry::{TypeRegistry, TypeSystem};
use dothtml_registry::controls;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::cache::ViewCache;
use crate::control_tree::{ControlTreeResolver, ResolvedTree, markup_control_references};
use crate::emitter::{Emitter, generated_names};
use crate::options::CompilerOptions;
use crate::view::{CompiledArtifact, CompiledView, ViewKind, normalize_path};
use crate::visitors::{DataContextPropagation, ErrorChecking, Styling, UsageValidation};

// ============================================================================
// Markup Sources
// ============================================================================

/// Raw markup for one view path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupFile {
    pub content: String,
    /// Logical file name, used to derive generated names.
    pub file_name: String,
    /// Seconds since the Unix epoch.
    pub last_modified: u64,
}

/// Provides markup text by view path.
pub trait MarkupSource: Send + Sync {
    /// `None` if no view exists at `path`.
    fn load(&self, path: &str) -> Option<MarkupFile>;
}

/// Markup files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MarkupSource for FileSystemSource {
    fn load(&self, path: &str) -> Option<MarkupFile> {
        let full = self.root.join(path);
        let content = match std::fs::read_to_string(&full) {
            Ok(content) => content,
            Err(error) => {
                debug!(path = %full.display(), %error, "markup file not readable");
                return None;
            }
        };
        let last_modified = std::fs::metadata(&full)
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |duration| duration.as_secs());
        Some(MarkupFile {
            content,
            file_name: path.to_string(),
            last_modified,
        })
    }
}

/// Markup held in memory; counts how often each path is loaded.
#[derive(Debug, Default)]
pub struct InMemorySource {
    files: DashMap<String, MarkupFile>,
    loads: DashMap<String, usize>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&self, path: &str, content: &str) {
        let path = normalize_path(path);
        self.files.insert(
            path.clone(),
            MarkupFile {
                content: content.to_string(),
                file_name: path,
                last_modified: 0,
            },
        );
    }

    /// How many times `path` has been loaded.
    pub fn load_count(&self, path: &str) -> usize {
        self.loads.get(&normalize_path(path)).map_or(0, |count| *count)
    }
}

impl MarkupSource for InMemorySource {
    fn load(&self, path: &str) -> Option<MarkupFile> {
        *self.loads.entry(path.to_string()).or_insert(0) += 1;
        self.files.get(path).map(|file| file.value().clone())
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Requested,
    Tokenizing,
    Parsing,
    Resolving,
    Validating,
    Emitting,
    Succeeded,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Requested => "requested",
            Stage::Tokenizing => "tokenizing",
            Stage::Parsing => "parsing",
            Stage::Resolving => "resolving",
            Stage::Validating => "validating",
            Stage::Emitting => "emitting",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended without an artifact.
enum Failure {
    Fatal(CompilationError),
    Reports(Vec<Report>),
    Dependency {
        error: CompilationError,
        dependency: Arc<CompiledView>,
    },
}

impl From<CompilationError> for Failure {
    fn from(error: CompilationError) -> Self {
        Failure::Fatal(error)
    }
}

impl Failure {
    fn into_view(self, path: &str) -> CompiledView {
        match self {
            Failure::Fatal(error) => CompiledView::from_error(path, &error),
            Failure::Reports(reports) => CompiledView::failed(path, reports),
            Failure::Dependency { error, dependency } => CompiledView::dependency_failed(path, &error, dependency),
        }
    }
}

/// Compiles views through a shared [`ViewCache`].
pub struct ViewCompiler {
    registry: Arc<TypeRegistry>,
    source: Arc<dyn MarkupSource>,
    options: CompilerOptions,
    cache: ViewCache,
}

impl ViewCompiler {
    pub fn new(registry: Arc<TypeRegistry>, source: Arc<dyn MarkupSource>, options: CompilerOptions) -> Self {
        Self {
            registry,
            source,
            options,
            cache: ViewCache::new(),
        }
    }

    pub fn cache(&self) -> &ViewCache {
        &self.cache
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The compiled view for `path`, compiling it on first request.
    pub fn compile(&self, path: &str) -> Arc<CompiledView> {
        let path = normalize_path(path);
        self.compile_in(&path, &mut Vec::new())
    }

    fn compile_in(&self, path: &str, chain: &mut Vec<String>) -> Arc<CompiledView> {
        debug!(path, stage = %Stage::Requested, "pipeline stage");
        if let Some(view) = self.cache.get(path) {
            return view;
        }
        chain.push(path.to_string());
        let view = self.run(path, chain);
        chain.pop();
        self.cache.insert(view)
    }

    /// Compile a master page or markup control required by the view at the
    /// end of `chain`.
    fn dependency(&self, path: &str, chain: &mut Vec<String>, span: Span) -> Result<Arc<CompiledView>, CompilationError> {
        if let Some(start) = chain.iter().position(|p| p == path) {
            let mut cycle = chain[start..].to_vec();
            cycle.push(path.to_string());
            let chain = cycle.join(" -> ");
            warn!(%chain, "dependency cycle detected");
            return Err(CompilationError::DependencyCycle { chain, span: Some(span) });
        }
        Ok(self.compile_in(path, chain))
    }

    fn enter(&self, path: &str, stage: Stage) {
        debug!(path, %stage, "pipeline stage");
    }

    fn run(&self, path: &str, chain: &mut Vec<String>) -> CompiledView {
        #[cfg(feature = "profiling")]
        profiling::scope!("ViewCompiler::run");

        match self.run_stages(path, chain) {
            Ok(view) => {
                self.enter(path, Stage::Succeeded);
                view
            }
            Err(failure) => {
                self.enter(path, Stage::Failed);
                failure.into_view(path)
            }
        }
    }

    fn run_stages(&self, path: &str, chain: &mut Vec<String>) -> Result<CompiledView, Failure> {
        let kind = ViewKind::from_path(path);
        let file = self.source.load(path).ok_or_else(|| CompilationError::SourceNotFound {
            path: path.to_string(),
        })?;

        self.enter(path, Stage::Tokenizing);
        let tokens = tokenize_markup(&file.content).map_err(CompilationError::from)?;
        self.enter(path, Stage::Parsing);
        let document = MarkupParser::parse_tokens(tokens);

        self.enter(path, Stage::Resolving);
        let mut dependencies = Vec::new();
        let mut markup_controls = FxHashMap::default();
        for (control_path, span) in markup_control_references(&document, &self.options) {
            let view = self.dependency(&control_path, chain, span)?;
            dependencies.push(control_path.clone());
            markup_controls.insert(control_path, view);
        }
        let mut tree = {
            #[cfg(feature = "profiling")]
            profiling::scope!("resolve control tree");
            ControlTreeResolver::new(&self.registry, &self.options, &markup_controls).resolve(path, kind, &document)?
        };
        ErrorChecking::check(&mut tree).map_err(Failure::Reports)?;

        self.enter(path, Stage::Validating);
        DataContextPropagation::run(&mut tree);
        Styling::run(&mut tree, &self.options.styles);
        let reports = UsageValidation::run(&mut tree, &*self.registry);
        if !reports.is_empty() {
            return Err(Failure::Reports(reports));
        }

        self.enter(path, Stage::Emitting);
        if let Some(master) = &tree.directives.master_page {
            self.check_master_page(&tree, master.path.as_str(), master.span, chain)?;
            dependencies.insert(0, master.path.clone());
        }
        let emitted = Emitter::emit(&*self.registry, &tree, generated_names(&file.file_name, file.last_modified));
        Ok(CompiledView::succeeded(
            path,
            CompiledArtifact {
                unit: emitted.unit,
                referenced_modules: emitted.referenced_modules,
                view_model: tree.directives.view_model.clone(),
                base_type: tree.root.ty().clone(),
                placeholders: emitted.placeholders,
                dependencies,
            },
        ))
    }

    /// Compile the master page and check the view against it.
    fn check_master_page(
        &self,
        tree: &ResolvedTree,
        master_path: &str,
        span: Span,
        chain: &mut Vec<String>,
    ) -> Result<(), Failure> {
        let master = self.dependency(master_path, chain, span)?;
        let Some(artifact) = master.artifact() else {
            return Err(Failure::Dependency {
                error: CompilationError::DependencyFailed {
                    kind: "master page",
                    path: master_path.to_string(),
                    span: Some(span),
                },
                dependency: master,
            });
        };

        let view_model = &tree.directives.view_model;
        if !self.registry.is_assignable(view_model, &artifact.view_model) {
            return Err(CompilationError::control_tree(
                format!(
                    "view model '{view_model}' is not assignable to '{}' required by master page '{master_path}'",
                    artifact.view_model
                ),
                Some(span),
            )
            .into());
        }

        let reports: Vec<Report> = tree
            .root
            .child_controls()
            .filter(|control| control.is(controls::CONTENT))
            .filter_map(|content| {
                let id = content.hard_coded("ContentPlaceHolderID")?;
                (!artifact.placeholders.iter().any(|p| p == id)).then(|| {
                    Report::new(
                        tree.path.as_str(),
                        Some(content.span),
                        "ControlTree",
                        format!("master page '{master_path}' has no ContentPlaceHolder with ID '{id}'"),
                    )
                })
            })
            .collect();
        if !reports.is_empty() {
            return Err(Failure::Reports(reports));
        }
        Ok(())
    }
}
