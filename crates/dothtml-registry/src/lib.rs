//! Type-system provider for binding resolution.
//!
//! [`TypeSystem`] is the query interface the resolver depends on;
//! [`TypeRegistry`] is the explicit symbol table implementing it, populated
//! with [`TypeBuilder`] and pre-seeded with built-in types and the standard
//! control set.

pub mod builder;
pub mod builtins;
pub mod controls;
pub mod entries;
pub mod hierarchy;
pub mod registry;
pub mod type_system;

pub use builder::{MethodBuilder, TypeBuilder};
pub use controls::{ControlMetadata, CONTROLS_NAMESPACE, DATA_CONTEXT_PROPERTY};
pub use entries::{
    CapabilityProperty, IndexerEntry, MarkupOptions, MemberEntry, MethodEntry, ParamEntry,
    PropertyEntry, TypeEntry, TypeFlags,
};
pub use hierarchy::TypeHierarchy;
pub use registry::TypeRegistry;
pub use type_system::TypeSystem;
