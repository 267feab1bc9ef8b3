//! Run configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use dothtml_compiler::CompilerOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    pub view_path: String,
}

/// Routes and markup controls to compile, plus the options every view
/// compiles with.
///
/// ```json
/// {
///   "routes": [{ "name": "Default", "view_path": "Views/Default.dothtml" }],
///   "markup_controls": [{ "tag_prefix": "cc", "tag_name": "Card", "src": "Controls/Card.dotcontrol" }],
///   "debug": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(flatten)]
    pub options: CompilerOptions,
    /// Recorded on the run result only.
    #[serde(default)]
    pub debug: bool,
}

impl CompilerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn with_route(mut self, name: &str, view_path: &str) -> Self {
        self.routes.push(RouteConfig {
            name: name.to_string(),
            view_path: view_path.to_string(),
        });
        self
    }

    /// View paths in compile order: markup controls, then routes. Blank
    /// paths are skipped and repeats dropped.
    pub fn view_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        let sources = self
            .options
            .markup_controls
            .iter()
            .map(|control| control.src.as_str())
            .chain(self.routes.iter().map(|route| route.view_path.as_str()));
        for path in sources {
            if path.trim().is_empty() {
                continue;
            }
            let path = dothtml_compiler::normalize_path(path);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }
}

impl FromStr for CompilerConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}
