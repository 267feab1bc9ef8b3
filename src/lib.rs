//! DotHtml: compiles markup views with data bindings into control builders.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dothtml::prelude::*;
//!
//! let registry = Arc::new(TypeRegistry::with_standard_controls());
//! let source = Arc::new(FileSystemSource::new("site"));
//! let config = CompilerConfig::from_file("site/dothtml.json").unwrap();
//!
//! let result = StaticViewCompiler::new(registry, source, config).compile();
//! for view in result.failed_views() {
//!     for report in view.diagnostics().iter() {
//!         eprintln!("{report}");
//!     }
//! }
//! ```

pub mod config;
pub mod run;

pub use dothtml_compiler as compiler;
pub use dothtml_core as core;
pub use dothtml_parser as parser;
pub use dothtml_registry as registry;

pub use config::{CompilerConfig, ConfigError, RouteConfig};
pub use run::{RunResult, StaticViewCompiler};

pub mod prelude {
    pub use crate::config::{CompilerConfig, ConfigError, RouteConfig};
    pub use crate::run::{RunResult, StaticViewCompiler};
    pub use dothtml_compiler::{
        CompiledArtifact, CompiledView, CompilerOptions, FileSystemSource, InMemorySource, MarkupSource, ViewCompiler,
        ViewKind,
    };
    pub use dothtml_core::{CompilationError, DataType, Diagnostics, Report};
    pub use dothtml_registry::{MethodBuilder, TypeBuilder, TypeRegistry, TypeSystem};
}
