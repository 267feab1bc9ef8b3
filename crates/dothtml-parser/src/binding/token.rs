//! Token types for binding expressions.

use std::fmt;

use dothtml_core::Span;

/// A token borrowed from the binding source text.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// `42`, `42L`
    IntLiteral,
    /// `4.5`, `1e3`
    RealLiteral,
    /// `4.5M`
    DecimalLiteral,
    /// `'text'` or `"text"`
    StringLiteral,
    Identifier,
    True,
    False,
    Null,

    // =========================================
    // Punctuation
    // =========================================
    Dot,
    Comma,
    Colon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Question,
    QuestionQuestion,

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Tilde,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Less,
    LessEqual,
    LessLess,
    /// `>>` is never produced; the parser joins adjacent `>` tokens so that
    /// `List<List<int>>` closes two argument lists.
    Greater,
    GreaterEqual,
    Equal,
    EqualEqual,
    BangEqual,

    Eof,
}

impl TokenKind {
    pub fn description(&self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral | RealLiteral | DecimalLiteral => "number",
            StringLiteral => "string",
            Identifier => "identifier",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            Dot => "'.'",
            Comma => "','",
            Colon => "':'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            Question => "'?'",
            QuestionQuestion => "'??'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Bang => "'!'",
            Tilde => "'~'",
            Amp => "'&'",
            AmpAmp => "'&&'",
            Pipe => "'|'",
            PipePipe => "'||'",
            Caret => "'^'",
            Less => "'<'",
            LessEqual => "'<='",
            LessLess => "'<<'",
            Greater => "'>'",
            GreaterEqual => "'>='",
            Equal => "'='",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            Eof => "end of binding",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
