//! DotHtml view compiler.
//!
//! Turns `.dothtml`, `.dotmaster` and `.dotcontrol` markup into control
//! builders, resolving every data binding against a [`TypeSystem`] on the
//! way.
//!
//! ## Architecture
//!
//! - **Binding resolution**: binding expressions are parsed by
//!   `dothtml-parser`, then resolved bottom-up into [`TypedExpr`] trees:
//!   member lookup, overloads, operators, indexers and conversions.
//! - **View pipeline**: markup is parsed, resolved into a control tree,
//!   validated by a fixed sequence of passes, then emitted. Results are
//!   cached per path in a [`ViewCache`].
//!
//! ## Modules
//!
//! - [`binder`]: binds one binding source inside a data-context stack
//! - [`member`]: member and identifier resolution
//! - [`overload`]: argument shaping, generic inference and ranking
//! - [`operators`]: binary, unary, comparison and indexer resolution
//! - [`conversion`]: implicit and primitive conversions
//! - [`control_tree`]: directives and the resolved control tree
//! - [`visitors`]: validation passes over the control tree
//! - [`emitter`]: control-builder emission
//! - [`pipeline`]: view compilation and markup sources
//! - [`cache`]: compile-once view cache
//!
//! [`TypeSystem`]: dothtml_registry::TypeSystem

mod assembler;
pub mod binder;
pub mod cache;
pub mod control_tree;
pub mod conversion;
pub mod data_context;
pub mod emitter;
pub mod member;
pub mod operators;
pub mod options;
pub mod overload;
pub mod pipeline;
pub mod typed_expr;
pub mod view;
pub mod visitors;

pub use binder::{BindError, BindingBinder, BoundBinding};
pub use cache::ViewCache;
pub use control_tree::{ControlTreeResolver, ResolvedControl, ResolvedTree, ViewDirectives};
pub use conversion::{Conversion, ConversionKind, find_conversion, implicit_conversion};
pub use data_context::DataContextStack;
pub use emitter::{Emitter, Statement, SyntaxUnit, generated_names};
pub use options::{CompilerOptions, ControlNamespace, MarkupControlRegistration, StyleRule};
pub use overload::{resolve_call, resolve_method_call};
pub use pipeline::{FileSystemSource, InMemorySource, MarkupFile, MarkupSource, Stage, ViewCompiler};
pub use typed_expr::{MethodGroup, TypedExpr};
pub use view::{CompiledArtifact, CompiledView, ViewKind, normalize_path};

pub use dothtml_core::{CompilationError, Diagnostics, Report};
