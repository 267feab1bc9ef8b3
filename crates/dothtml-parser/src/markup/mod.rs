//! View markup: directives, elements, attributes, text and inline bindings.

pub mod node;
mod parser;
mod tokenizer;

pub use node::*;
pub use parser::{MarkupParser, parse_markup};
pub use tokenizer::{MarkupToken, MarkupTokenizer, tokenize_markup};
