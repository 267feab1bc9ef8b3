//! Binding expression lexer.
//!
//! Spans are relative to the start of the expression text; callers translate
//! them into file positions with [`Span::offset`].

use dothtml_core::{LexError, Span};

use super::token::{Token, TokenKind};
use crate::cursor::{Cursor, is_ident_continue, is_ident_start};

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Tokenize the whole expression, ending with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token<'src>>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token<'src>, LexError> {
        self.cursor.eat_while(char::is_whitespace);
        let start = self.cursor.position();
        let offset = self.cursor.offset();

        let Some(ch) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        let kind = if is_ident_start(ch) {
            self.cursor.eat_while(is_ident_continue);
            match self.cursor.slice_from(offset) {
                "true" => TokenKind::True,
                "false" => TokenKind::False,
                "null" => TokenKind::Null,
                _ => TokenKind::Identifier,
            }
        } else if ch.is_ascii_digit() {
            self.scan_number(start, offset)?
        } else if ch == '"' || ch == '\'' {
            self.scan_string(ch, start)?
        } else {
            self.scan_operator(ch, start)?
        };

        Ok(Token::new(
            kind,
            self.cursor.slice_from(offset),
            self.cursor.span_from(start, offset),
        ))
    }

    fn scan_number(&mut self, start: Span, offset: u32) -> Result<TokenKind, LexError> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut kind = TokenKind::IntLiteral;

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::RealLiteral;
        }
        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            self.cursor.advance();
            if !self.cursor.eat('-') {
                self.cursor.eat('+');
            }
            if self.cursor.eat_while(|c| c.is_ascii_digit()).is_empty() {
                return Err(LexError::InvalidNumber {
                    span: self.cursor.span_from(start, offset),
                    detail: "missing exponent digits".into(),
                });
            }
            kind = TokenKind::RealLiteral;
        }
        match self.cursor.peek() {
            Some('m' | 'M') => {
                self.cursor.advance();
                kind = TokenKind::DecimalLiteral;
            }
            Some('l' | 'L') if kind == TokenKind::IntLiteral => {
                self.cursor.advance();
            }
            Some('d' | 'D') => {
                self.cursor.advance();
                kind = TokenKind::RealLiteral;
            }
            _ => {}
        }
        if self.cursor.check(is_ident_continue) {
            return Err(LexError::InvalidNumber {
                span: self.cursor.span_from(start, offset),
                detail: format!("unexpected suffix '{}'", self.cursor.peek().unwrap_or_default()),
            });
        }
        Ok(kind)
    }

    fn scan_string(&mut self, quote: char, start: Span) -> Result<TokenKind, LexError> {
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None => return Err(LexError::UnterminatedString { span: start }),
                Some('\\') => {
                    if self.cursor.advance().is_none() {
                        return Err(LexError::UnterminatedString { span: start });
                    }
                }
                Some(c) if c == quote => return Ok(TokenKind::StringLiteral),
                Some(_) => {}
            }
        }
    }

    fn scan_operator(&mut self, ch: char, start: Span) -> Result<TokenKind, LexError> {
        use TokenKind::*;
        self.cursor.advance();
        let kind = match ch {
            '.' => Dot,
            ',' => Comma,
            ':' => Colon,
            '(' => LeftParen,
            ')' => RightParen,
            '[' => LeftBracket,
            ']' => RightBracket,
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,
            '~' => Tilde,
            '^' => Caret,
            '?' => {
                if self.cursor.eat('?') {
                    QuestionQuestion
                } else {
                    Question
                }
            }
            '!' => {
                if self.cursor.eat('=') {
                    BangEqual
                } else {
                    Bang
                }
            }
            '&' => {
                if self.cursor.eat('&') {
                    AmpAmp
                } else {
                    Amp
                }
            }
            '|' => {
                if self.cursor.eat('|') {
                    PipePipe
                } else {
                    Pipe
                }
            }
            '<' => {
                if self.cursor.eat('=') {
                    LessEqual
                } else if self.cursor.eat('<') {
                    LessLess
                } else {
                    Less
                }
            }
            '>' => {
                if self.cursor.eat('=') {
                    GreaterEqual
                } else {
                    Greater
                }
            }
            '=' => {
                if self.cursor.eat('=') {
                    EqualEqual
                } else {
                    Equal
                }
            }
            other => return Err(LexError::UnexpectedChar { ch: other, span: start }),
        };
        Ok(kind)
    }
}
