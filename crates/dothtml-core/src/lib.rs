//! Shared vocabulary for the dothtml view compiler.
//!
//! Everything here is used by more than one phase: source positions, type
//! identity, structural type references, literal constants, the error
//! hierarchy and positioned diagnostic reports.

pub mod constant;
pub mod data_type;
pub mod diagnostics;
pub mod error;
pub mod span;
pub mod type_hash;

pub use constant::Constant;
pub use data_type::{DataType, GenericParam, NamedType, ParamOwner, PrimitiveKind, strip_arity};
pub use diagnostics::{Diagnostics, Report};
pub use error::{
    CompilationError, LexError, ParseError, ParseErrorKind, ParseErrors, RegistrationError,
    ResolutionError,
};
pub use span::Span;
pub use type_hash::{TypeHash, hash_constants, primitives};
