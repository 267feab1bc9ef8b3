//! Raw markup syntax tree.
//!
//! The tree is untyped: element names are kept as written and attribute
//! values are either text or unparsed binding sources. The control-tree
//! resolver gives them meaning.

use std::fmt;

use dothtml_core::Span;

/// A parsed markup file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkupDocument {
    pub directives: Vec<Directive>,
    pub nodes: Vec<MarkupNode>,
}

impl MarkupDocument {
    /// The first directive with `name`, compared case-insensitively.
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn directives_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Directive> + use<'a, 'n> {
        self.directives
            .iter()
            .filter(move |d| d.name.eq_ignore_ascii_case(name))
    }

    /// Depth-first iteration over every element in the document.
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_elements(&self.nodes, &mut out);
        out
    }
}

fn collect_elements<'a>(nodes: &'a [MarkupNode], out: &mut Vec<&'a Element>) {
    for node in nodes {
        if let MarkupNode::Element(element) = node {
            out.push(element);
            collect_elements(&element.children, out);
        }
    }
}

/// `@name value` at the top of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(Element),
    Text(TextNode),
    /// `{{value: expr}}` in text content.
    Binding(BindingSource),
    /// Markup the parser could not place, such as a stray end tag.
    Invalid(InvalidNode),
}

impl MarkupNode {
    pub fn span(&self) -> Span {
        match self {
            MarkupNode::Element(e) => e.span,
            MarkupNode::Text(t) => t.span,
            MarkupNode::Binding(b) => b.span,
            MarkupNode::Invalid(i) => i.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub prefix: Option<String>,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<MarkupNode>,
    /// Position of the opening `<`.
    pub span: Span,
    pub self_closing: bool,
    /// Structural problems found while building the tree.
    pub errors: Vec<String>,
}

impl Element {
    pub fn new(prefix: Option<String>, name: impl Into<String>, span: Span) -> Self {
        Self {
            prefix,
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            span,
            self_closing: false,
            errors: Vec::new(),
        }
    }

    /// Tag name as written, including the prefix.
    pub fn full_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.prefix.is_none() && a.name.eq_ignore_ascii_case(name))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub name: String,
    pub value: AttributeValue,
    pub span: Span,
}

impl Attribute {
    pub fn full_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// A bare attribute such as `disabled`.
    None,
    Text(String),
    Binding(BindingSource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Value,
    Command,
    Resource,
}

impl BindingKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "value" => Some(BindingKind::Value),
            "command" => Some(BindingKind::Command),
            "resource" => Some(BindingKind::Resource),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::Value => "value",
            BindingKind::Command => "command",
            BindingKind::Resource => "resource",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unparsed binding text together with where it sits in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSource {
    pub kind: BindingKind,
    pub expression: String,
    /// Position of the opening brace.
    pub span: Span,
    /// Position of the first character of `expression`; binding spans are
    /// translated against it with [`Span::offset`].
    pub expression_span: Span,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}: {}}}", self.kind, self.expression)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    pub span: Span,
}

impl TextNode {
    pub fn is_whitespace(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNode {
    pub message: String,
    pub span: Span,
}
