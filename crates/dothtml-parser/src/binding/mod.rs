//! Binding expression language.
//!
//! The text between `{value:` and `}` is lexed into [`Token`]s and parsed
//! into an arena-allocated [`BindingExpr`] tree.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use dothtml_parser::binding::{BindingExpr, parse_binding};
//!
//! let arena = Bump::new();
//! let expr = parse_binding("Items.Count > 0 && !_root.IsBusy", &arena).unwrap();
//! assert!(matches!(expr, BindingExpr::Binary(_)));
//! ```

pub mod ast;
mod lexer;
pub mod ops;
mod parser;
pub mod token;

pub use ast::*;
pub use lexer::Lexer;
pub use ops::{BinaryOp, UnaryOp};
pub use parser::{BindingParser, parse_binding};
pub use token::{Token, TokenKind};
