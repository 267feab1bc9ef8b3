//! Builds the markup tree from tokens.
//!
//! Tree-building problems are not fatal: an unclosed element keeps its
//! children and records an error, and a stray end tag becomes an
//! [`MarkupNode::Invalid`] node. The control-tree resolver turns both into
//! node errors positioned at the offending tag.

use dothtml_core::ParseError;
use tracing::trace;

use super::node::{Element, InvalidNode, MarkupDocument, MarkupNode, TextNode};
use super::tokenizer::{MarkupToken, tokenize_markup};

/// HTML elements that never have content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

fn is_void(prefix: Option<&str>, name: &str) -> bool {
    prefix.is_none() && VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

fn same_tag(element: &Element, prefix: Option<&str>, name: &str) -> bool {
    match (element.prefix.as_deref(), prefix) {
        (None, None) => element.name.eq_ignore_ascii_case(name),
        (Some(a), Some(b)) => a == b && element.name == name,
        _ => false,
    }
}

pub struct MarkupParser {
    document: MarkupDocument,
    /// Elements whose end tag has not been seen yet, innermost last.
    open: Vec<Element>,
}

impl Default for MarkupParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupParser {
    pub fn new() -> Self {
        Self {
            document: MarkupDocument::default(),
            open: Vec::new(),
        }
    }

    /// Parse a whole markup file.
    pub fn parse(source: &str) -> Result<MarkupDocument, ParseError> {
        #[cfg(feature = "profiling")]
        profiling::scope!("MarkupParser::parse");

        let tokens = tokenize_markup(source)?;
        Ok(Self::parse_tokens(tokens))
    }

    /// Build the tree from an already tokenized file.
    pub fn parse_tokens(tokens: Vec<MarkupToken>) -> MarkupDocument {
        let mut parser = MarkupParser::new();
        for token in tokens {
            parser.push_token(token);
        }
        let document = parser.finish();
        trace!(
            directives = document.directives.len(),
            nodes = document.nodes.len(),
            "parsed markup document"
        );
        document
    }

    fn append(&mut self, node: MarkupNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.document.nodes.push(node),
        }
    }

    fn push_token(&mut self, token: MarkupToken) {
        match token {
            MarkupToken::Directive(directive) => self.document.directives.push(directive),
            MarkupToken::Text { text, span } => self.append(MarkupNode::Text(TextNode { text, span })),
            MarkupToken::Binding(binding) => self.append(MarkupNode::Binding(binding)),
            MarkupToken::StartTag {
                prefix,
                name,
                attributes,
                self_closing,
                span,
            } => {
                let void = is_void(prefix.as_deref(), &name);
                let mut element = Element::new(prefix, name, span);
                element.attributes = attributes;
                element.self_closing = self_closing;
                if self_closing || void {
                    self.append(MarkupNode::Element(element));
                } else {
                    self.open.push(element);
                }
            }
            MarkupToken::EndTag { prefix, name, span } => {
                if is_void(prefix.as_deref(), &name) {
                    return;
                }
                let Some(depth) = self
                    .open
                    .iter()
                    .rposition(|e| same_tag(e, prefix.as_deref(), &name))
                else {
                    let full = match &prefix {
                        Some(prefix) => format!("{prefix}:{name}"),
                        None => name,
                    };
                    self.append(MarkupNode::Invalid(InvalidNode {
                        message: format!("closing tag </{full}> has no matching start tag"),
                        span,
                    }));
                    return;
                };
                while self.open.len() > depth + 1 {
                    self.close_unclosed();
                }
                if let Some(element) = self.open.pop() {
                    self.append(MarkupNode::Element(element));
                }
            }
        }
    }

    /// Pop the innermost element, marking it as never closed.
    fn close_unclosed(&mut self) {
        if let Some(mut element) = self.open.pop() {
            element
                .errors
                .push(format!("element <{}> is not closed", element.full_name()));
            self.append(MarkupNode::Element(element));
        }
    }

    fn finish(mut self) -> MarkupDocument {
        while !self.open.is_empty() {
            self.close_unclosed();
        }
        self.document
    }
}

/// Parse a markup file into a [`MarkupDocument`].
pub fn parse_markup(source: &str) -> Result<MarkupDocument, ParseError> {
    MarkupParser::parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::node::{AttributeValue, BindingKind};
    use dothtml_core::Span;

    fn element(node: &MarkupNode) -> &Element {
        match node {
            MarkupNode::Element(e) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn nested_elements() {
        let doc = parse_markup("<div><span>a</span><br></div>").unwrap();
        assert_eq!(doc.nodes.len(), 1);
        let div = element(&doc.nodes[0]);
        assert_eq!(div.children.len(), 2);
        assert_eq!(element(&div.children[1]).name, "br");
        assert!(!div.has_errors());
    }

    #[test]
    fn prefixed_controls_and_bindings() {
        let doc = parse_markup("@viewModel App.VM\n<dot:Button Click={command: Save()}>Go</dot:Button>").unwrap();
        assert_eq!(doc.directive("viewmodel").map(|d| d.value.as_str()), Some("App.VM"));
        let button = doc.elements().into_iter().find(|e| e.name == "Button").unwrap();
        assert_eq!(button.prefix.as_deref(), Some("dot"));
        let AttributeValue::Binding(binding) = &button.attribute("Click").unwrap().value else {
            panic!("expected binding");
        };
        assert_eq!(binding.kind, BindingKind::Command);
        assert_eq!(binding.expression, "Save()");
    }

    #[test]
    fn unclosed_element_is_a_node_error() {
        let doc = parse_markup("<div><p>text</div>").unwrap();
        let div = element(&doc.nodes[0]);
        assert!(!div.has_errors());
        let p = element(&div.children[0]);
        assert_eq!(p.errors, vec!["element <p> is not closed".to_string()]);
        assert_eq!(p.span, Span::new(1, 6, 3));
    }

    #[test]
    fn stray_end_tag_is_invalid_node() {
        let doc = parse_markup("text</span>").unwrap();
        assert!(matches!(&doc.nodes[1], MarkupNode::Invalid(i) if i.span == Span::new(1, 5, 7)));
    }

    #[test]
    fn unclosed_at_end_of_file() {
        let doc = parse_markup("<section>").unwrap();
        assert!(element(&doc.nodes[0]).has_errors());
    }

    #[test]
    fn text_bindings() {
        let doc = parse_markup("<p>{{value: Name}}</p>").unwrap();
        let p = element(&doc.nodes[0]);
        assert!(matches!(&p.children[0], MarkupNode::Binding(b) if b.expression == "Name"));
    }
}
