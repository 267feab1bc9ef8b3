//! Compiled views.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use dothtml_core::{CompilationError, DataType, Diagnostics, Report};

use crate::emitter::SyntaxUnit;

/// What a markup file compiles into, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Page,
    MasterPage,
    MarkupControl,
}

impl ViewKind {
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".dotmaster") {
            ViewKind::MasterPage
        } else if lower.ends_with(".dotcontrol") {
            ViewKind::MarkupControl
        } else {
            ViewKind::Page
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Page => "view",
            ViewKind::MasterPage => "master page",
            ViewKind::MarkupControl => "markup control",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key for a view path: forward slashes, no leading `./` or `/`.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let mut path = path.as_str();
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else if let Some(rest) = path.strip_prefix("~/") {
            path = rest;
        } else {
            return path.to_string();
        }
    }
}

/// Output of a successful compile.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
    pub unit: SyntaxUnit,
    /// Modules referenced by emitted code, sorted.
    pub referenced_modules: BTreeSet<String>,
    pub view_model: DataType,
    /// Control type of the root; markup controls expose its properties.
    pub base_type: DataType,
    /// `ContentPlaceHolder` ids declared by a master page.
    pub placeholders: Vec<String>,
    /// Master page and markup controls this view was built against.
    pub dependencies: Vec<String>,
}

/// The terminal state of one view path. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledView {
    pub path: String,
    pub kind: ViewKind,
    artifact: Option<CompiledArtifact>,
    diagnostics: Diagnostics,
    /// The dependency whose failure failed this view.
    failed_dependency: Option<Arc<CompiledView>>,
}

impl CompiledView {
    pub fn succeeded(path: &str, artifact: CompiledArtifact) -> Self {
        Self {
            path: path.to_string(),
            kind: ViewKind::from_path(path),
            artifact: Some(artifact),
            diagnostics: Diagnostics::new(),
            failed_dependency: None,
        }
    }

    /// A failed view; `reports` must not be empty.
    pub fn failed(path: &str, reports: Vec<Report>) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.extend(reports);
        Self {
            path: path.to_string(),
            kind: ViewKind::from_path(path),
            artifact: None,
            diagnostics,
            failed_dependency: None,
        }
    }

    /// A view failed by a single error.
    pub fn from_error(path: &str, error: &CompilationError) -> Self {
        Self::failed(path, vec![Report::from_error(path, error)])
    }

    /// A view failed because `dependency` failed; its reports stay on the dependency.
    pub fn dependency_failed(path: &str, error: &CompilationError, dependency: Arc<CompiledView>) -> Self {
        Self {
            failed_dependency: Some(dependency),
            ..Self::from_error(path, error)
        }
    }

    pub fn is_success(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn artifact(&self) -> Option<&CompiledArtifact> {
        self.artifact.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn failed_dependency(&self) -> Option<&Arc<CompiledView>> {
        self.failed_dependency.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(ViewKind::from_path("Views/Site.dotmaster"), ViewKind::MasterPage);
        assert_eq!(ViewKind::from_path("Controls/Card.DotControl"), ViewKind::MarkupControl);
        assert_eq!(ViewKind::from_path("Views/Default.dothtml"), ViewKind::Page);
    }

    #[test]
    fn paths_are_normalized() {
        assert_eq!(normalize_path("~/Views\\Site.dotmaster"), "Views/Site.dotmaster");
        assert_eq!(normalize_path(" ./Views/a.dothtml "), "Views/a.dothtml");
        assert_eq!(normalize_path("/Views/a.dothtml"), "Views/a.dothtml");
    }

    #[test]
    fn failed_view_has_no_artifact() {
        let error = CompilationError::SourceNotFound { path: "a.dothtml".into() };
        let view = CompiledView::from_error("a.dothtml", &error);
        assert!(!view.is_success());
        assert_eq!(view.diagnostics().len(), 1);
        assert_eq!(view.diagnostics().first().map(|r| r.line), Some(-1));
    }
}
