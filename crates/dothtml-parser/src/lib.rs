//! dothtml parser crate.
//!
//! This crate provides the two front ends of the view compiler:
//! - the markup tokenizer and tree builder for view files
//! - the lexer and Pratt parser for binding expressions
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use dothtml_parser::{markup, binding};
//!
//! let document = markup::parse_markup("@viewModel App.Model\n<p>{{value: Title}}</p>").unwrap();
//! assert_eq!(document.directives.len(), 1);
//!
//! let arena = Bump::new();
//! let expr = binding::parse_binding("Title.Length + 1", &arena).unwrap();
//! assert_eq!(expr.to_string(), "Title.Length + 1");
//! ```

mod cursor;

pub mod binding;
pub mod markup;

pub use binding::{BindingExpr, parse_binding};
pub use markup::{MarkupDocument, MarkupNode, parse_markup};
