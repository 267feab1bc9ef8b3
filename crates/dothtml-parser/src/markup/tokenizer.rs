//! Markup tokenizer.
//!
//! Splits a view file into directives, tags, text and inline bindings.
//! Anything the tokenizer cannot delimit (an unterminated tag, quote,
//! comment or binding) is a fatal [`ParseError`] for the whole file.

use dothtml_core::{ParseError, ParseErrorKind, Span};

use super::node::{Attribute, AttributeValue, BindingKind, BindingSource, Directive};
use crate::cursor::{Cursor, is_ident_continue, is_ident_start};

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupToken {
    Directive(Directive),
    StartTag {
        prefix: Option<String>,
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
        span: Span,
    },
    EndTag {
        prefix: Option<String>,
        name: String,
        span: Span,
    },
    Text {
        text: String,
        span: Span,
    },
    Binding(BindingSource),
}

pub struct MarkupTokenizer<'src> {
    cursor: Cursor<'src>,
}

fn is_name_char(c: char) -> bool {
    is_ident_continue(c) || c == '-' || c == '.'
}

impl<'src> MarkupTokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<MarkupToken>, ParseError> {
        let mut tokens = Vec::new();
        self.scan_directives(&mut tokens)?;

        while !self.cursor.is_eof() {
            if self.cursor.check_str("<!--") {
                self.skip_comment()?;
            } else if self.cursor.check_str("</") {
                tokens.push(self.scan_end_tag()?);
            } else if self.cursor.peek() == Some('<') && self.cursor.peek_nth(1).is_some_and(is_ident_start) {
                tokens.push(self.scan_start_tag()?);
            } else if self.cursor.check_str("{{") {
                tokens.push(MarkupToken::Binding(self.scan_binding("}}")?));
            } else {
                tokens.push(self.scan_text());
            }
        }

        Ok(tokens)
    }

    // ==========================================================================
    // Directives
    // ==========================================================================

    fn scan_directives(&mut self, tokens: &mut Vec<MarkupToken>) -> Result<(), ParseError> {
        loop {
            let checkpoint = self.cursor.clone();
            self.cursor.eat_while(char::is_whitespace);
            if self.cursor.peek() != Some('@') {
                // Whitespace after the last directive belongs to the content.
                self.cursor = checkpoint;
                return Ok(());
            }
            let start = self.cursor.position();
            let offset = self.cursor.offset();
            self.cursor.advance();
            let name = self.cursor.eat_while(is_ident_continue);
            if name.is_empty() {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidDirective,
                    start,
                    "expected directive name after '@'",
                ));
            }
            self.cursor.eat_while(|c| c == ' ' || c == '\t');
            let value = self.cursor.eat_while(|c| c != '\n' && c != '\r').trim();
            tokens.push(MarkupToken::Directive(Directive {
                name: name.to_string(),
                value: value.to_string(),
                span: self.cursor.span_from(start, offset),
            }));
        }
    }

    // ==========================================================================
    // Tags
    // ==========================================================================

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let start = self.cursor.position();
        self.cursor.eat_str("<!--");
        while !self.cursor.eat_str("-->") {
            if self.cursor.advance().is_none() {
                return Err(ParseError::new(ParseErrorKind::UnexpectedEof, start, "unterminated comment"));
            }
        }
        Ok(())
    }

    fn scan_qualified_name(&mut self) -> Result<(Option<String>, String), ParseError> {
        let position = self.cursor.position();
        let first = self.cursor.eat_while(is_name_char);
        if first.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier,
                position,
                "expected element name",
            ));
        }
        if self.cursor.peek() == Some(':') && self.cursor.peek_nth(1).is_some_and(is_ident_start) {
            self.cursor.advance();
            let name = self.cursor.eat_while(is_name_char);
            return Ok((Some(first.to_string()), name.to_string()));
        }
        Ok((None, first.to_string()))
    }

    fn scan_end_tag(&mut self) -> Result<MarkupToken, ParseError> {
        let start = self.cursor.position();
        let offset = self.cursor.offset();
        self.cursor.eat_str("</");
        let (prefix, name) = self.scan_qualified_name()?;
        self.cursor.eat_while(char::is_whitespace);
        if !self.cursor.eat('>') {
            return Err(self.unterminated_tag(start));
        }
        Ok(MarkupToken::EndTag {
            prefix,
            name,
            span: self.cursor.span_from(start, offset),
        })
    }

    fn scan_start_tag(&mut self) -> Result<MarkupToken, ParseError> {
        let start = self.cursor.position();
        let offset = self.cursor.offset();
        self.cursor.advance();
        let (prefix, name) = self.scan_qualified_name()?;
        let mut attributes = Vec::new();

        let self_closing = loop {
            self.cursor.eat_while(char::is_whitespace);
            if self.cursor.eat_str("/>") {
                break true;
            }
            if self.cursor.eat('>') {
                break false;
            }
            if self.cursor.is_eof() || self.cursor.peek() == Some('<') {
                return Err(self.unterminated_tag(start));
            }
            attributes.push(self.scan_attribute()?);
        };

        Ok(MarkupToken::StartTag {
            prefix,
            name,
            attributes,
            self_closing,
            span: self.cursor.span_from(start, offset),
        })
    }

    fn unterminated_tag(&self, start: Span) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedEof,
            start,
            "tag is not terminated with '>'",
        )
    }

    fn scan_attribute(&mut self) -> Result<Attribute, ParseError> {
        let start = self.cursor.position();
        let offset = self.cursor.offset();
        let raw_name = self
            .cursor
            .eat_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '<' | '"' | '\''));
        if raw_name.is_empty() {
            let found = self.cursor.peek().unwrap_or_default();
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                start,
                format!("unexpected '{found}' in tag"),
            ));
        }
        let (prefix, name) = match raw_name.split_once(':') {
            Some((prefix, name)) if !prefix.is_empty() && !name.is_empty() => {
                (Some(prefix.to_string()), name.to_string())
            }
            _ => (None, raw_name.to_string()),
        };

        self.cursor.eat_while(char::is_whitespace);
        let value = if self.cursor.eat('=') {
            self.cursor.eat_while(char::is_whitespace);
            self.scan_attribute_value()?
        } else {
            AttributeValue::None
        };

        Ok(Attribute {
            prefix,
            name,
            value,
            span: self.cursor.span_from(start, offset),
        })
    }

    fn scan_attribute_value(&mut self) -> Result<AttributeValue, ParseError> {
        let start = self.cursor.position();
        match self.cursor.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.cursor.advance();
                if self.cursor.peek() == Some('{') {
                    let binding = self.scan_binding("}")?;
                    if !self.cursor.eat(quote) {
                        return Err(ParseError::new(
                            ParseErrorKind::InvalidBinding,
                            binding.span,
                            "binding must be the whole attribute value",
                        ));
                    }
                    return Ok(AttributeValue::Binding(binding));
                }
                let text = self.cursor.eat_while(|c| c != quote);
                if !self.cursor.eat(quote) {
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedEof,
                        start,
                        "unterminated attribute value",
                    ));
                }
                Ok(AttributeValue::Text(text.to_string()))
            }
            Some('{') => Ok(AttributeValue::Binding(self.scan_binding("}")?)),
            _ => {
                let text = self.cursor.eat_while(|c| !c.is_whitespace() && c != '>' && c != '/');
                Ok(AttributeValue::Text(text.to_string()))
            }
        }
    }

    // ==========================================================================
    // Bindings and text
    // ==========================================================================

    /// Scan `{kind: expression}` (or `{{kind: expression}}` when `close` is
    /// `"}}"`). The cursor must be on the opening brace.
    fn scan_binding(&mut self, close: &str) -> Result<BindingSource, ParseError> {
        let start = self.cursor.position();
        let open = if close == "}}" { "{{" } else { "{" };
        self.cursor.eat_str(open);
        self.cursor.eat_while(char::is_whitespace);

        let kind_position = self.cursor.position();
        let kind_name = self.cursor.eat_while(is_ident_continue);
        let kind = BindingKind::from_name(kind_name).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::InvalidBinding,
                kind_position,
                format!("unknown binding kind '{kind_name}'"),
            )
        })?;
        self.cursor.eat_while(char::is_whitespace);
        if !self.cursor.eat(':') {
            return Err(ParseError::expected_token(
                self.cursor.position(),
                "':'",
                &self.describe_next(),
            ));
        }
        self.cursor.eat_while(char::is_whitespace);

        let expression_span = self.cursor.position();
        let expression_offset = self.cursor.offset();
        let mut quote: Option<char> = None;
        loop {
            match (quote, self.cursor.peek()) {
                (_, None) => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidBinding,
                        start,
                        "binding is not closed",
                    ));
                }
                (Some(q), Some(c)) => {
                    self.cursor.advance();
                    if c == '\\' {
                        self.cursor.advance();
                    } else if c == q {
                        quote = None;
                    }
                }
                (None, Some(c @ ('"' | '\''))) => {
                    quote = Some(c);
                    self.cursor.advance();
                }
                (None, Some(_)) if self.cursor.check_str(close) => break,
                (None, Some(_)) => {
                    self.cursor.advance();
                }
            }
        }
        let expression = self.cursor.slice_from(expression_offset).trim_end().to_string();
        self.cursor.eat_str(close);

        Ok(BindingSource {
            kind,
            expression,
            span: start,
            expression_span,
        })
    }

    fn describe_next(&self) -> String {
        match self.cursor.peek() {
            Some(c) => format!("'{c}'"),
            None => "end of file".to_string(),
        }
    }

    fn scan_text(&mut self) -> MarkupToken {
        let start = self.cursor.position();
        let offset = self.cursor.offset();
        // Always consume at least one character so a lone '<' makes progress.
        self.cursor.advance();
        loop {
            let at_tag = self.cursor.peek() == Some('<')
                && (self.cursor.peek_nth(1).is_some_and(|c| is_ident_start(c) || c == '/' || c == '!'));
            if self.cursor.is_eof() || at_tag || self.cursor.check_str("{{") {
                break;
            }
            self.cursor.advance();
        }
        MarkupToken::Text {
            text: self.cursor.slice_from(offset).to_string(),
            span: self.cursor.span_from(start, offset),
        }
    }
}

/// Tokenize a markup file.
pub fn tokenize_markup(source: &str) -> Result<Vec<MarkupToken>, ParseError> {
    MarkupTokenizer::new(source).tokenize()
}
