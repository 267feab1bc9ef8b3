//! Error types for every phase of view compilation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompilationError        - view-level failure, one per failed view
//! ├── ParseError          - markup or binding syntax (with ParseErrorKind)
//! ├── ResolutionError     - binding expression resolution
//! └── DependencyCycle / DependencyFailed / SourceNotFound / ControlTree
//! LexError                - binding tokenization, folded into ParseError
//! RegistrationError       - building the type registry
//! ```
//!
//! Resolution errors are never swallowed: the binder returns them, the
//! error-checking pass turns the first one into the view's single report.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors raised while tokenizing a binding expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of input.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// A binding was opened but never closed, or names an unknown binding kind.
    InvalidBinding,
    /// A `@directive` line is malformed.
    InvalidDirective,
    /// A start tag has no matching end tag, or an end tag has no start tag.
    MismatchedElement,
    /// A literal value could not be parsed.
    InvalidLiteral,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of input",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::InvalidBinding => "invalid binding",
            ParseErrorKind::InvalidDirective => "invalid directive",
            ParseErrorKind::MismatchedElement => "mismatched element",
            ParseErrorKind::InvalidLiteral => "invalid literal",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(span: Span, token: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected {token}"),
        )
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        let kind = match error {
            LexError::InvalidNumber { .. } => ParseErrorKind::InvalidLiteral,
            LexError::UnterminatedString { .. } => ParseErrorKind::UnexpectedEof,
            LexError::UnexpectedChar { .. } => ParseErrorKind::UnexpectedToken,
        };
        ParseError::new(kind, error.span(), error.to_string())
    }
}

/// A collection of non-fatal parse errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }

    /// Ok if empty, otherwise the first error.
    pub fn into_result(self) -> Result<(), ParseError> {
        match self.errors.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while populating the type registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    #[error("type not found: {0}")]
    TypeNotFound(String),

    #[error("duplicate type: {0}")]
    DuplicateType(String),

    #[error("duplicate member '{member}' on type '{type_name}'")]
    DuplicateMember { type_name: String, member: String },

    /// Extension methods need a first parameter naming the extended type.
    #[error("extension method '{0}' has no parameters")]
    InvalidExtension(String),

    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),
}

// ============================================================================
// Resolution Errors
// ============================================================================

fn member_scope(is_static: &bool) -> &'static str {
    if *is_static { "static" } else { "instance" }
}

/// Hard failures of binding expression resolution.
///
/// Candidate rejection inside overload and operator search never produces
/// one of these; only the final outcome of a resolution call does.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("type of '{expr}' could not be resolved")]
    UnresolvedType { expr: String },

    #[error("could not find {} member '{member}' on type '{type_name}'", member_scope(.is_static))]
    MemberNotFound {
        member: String,
        type_name: String,
        is_static: bool,
    },

    #[error("method group '{name}' cannot be used as a value")]
    MethodGroupNotValue { name: String },

    #[error("cannot access member '{member}' on method group '{group}'")]
    MemberAccessOnMethodGroup { member: String, group: String },

    #[error("expression '{expr}' of type '{type_name}' cannot be called")]
    NotCallable { expr: String, type_name: String },

    #[error("could not find method overload nor extension method that matched '{name}({args})'")]
    NoApplicableOverload { name: String, args: String },

    #[error("found ambiguous overloads of method '{name}': {candidates}")]
    AmbiguousOverload { name: String, candidates: String },

    #[error("cannot apply operator '{op}' to {operands}")]
    NoApplicableOperator { op: String, operands: String },

    #[error("neither '{left}' nor '{right}' implements an ordering comparison")]
    ComparisonNotSupported { left: String, right: String },

    #[error("could not find an indexer on type '{type_name}' accepting '{index_type}'")]
    IndexerNotFound { type_name: String, index_type: String },

    #[error("more than one indexer on type '{type_name}' accepts '{index_type}'")]
    AmbiguousIndexer { type_name: String, index_type: String },

    #[error("cannot implicitly convert '{from}' to '{to}'")]
    NoImplicitConversion { from: String, to: String },

    #[error("expression '{expr}' cannot be assigned to")]
    NotAssignable { expr: String },

    #[error("identifier '{name}' could not be resolved")]
    UnknownIdentifier { name: String },

    #[error("type '{name}' could not be found")]
    UnknownType { name: String },
}

impl ResolutionError {
    /// The diagnostic class name, used to classify reports.
    pub fn class(&self) -> &'static str {
        match self {
            ResolutionError::UnresolvedType { .. } => "UnresolvedType",
            ResolutionError::MemberNotFound { .. } => "MemberNotFound",
            ResolutionError::MethodGroupNotValue { .. } => "MethodGroupNotValue",
            ResolutionError::MemberAccessOnMethodGroup { .. } => "MemberAccessOnMethodGroup",
            ResolutionError::NotCallable { .. } => "NotCallable",
            ResolutionError::NoApplicableOverload { .. } => "NoApplicableOverload",
            ResolutionError::AmbiguousOverload { .. } => "AmbiguousOverload",
            ResolutionError::NoApplicableOperator { .. } => "NoApplicableOperator",
            ResolutionError::ComparisonNotSupported { .. } => "ComparisonNotSupported",
            ResolutionError::IndexerNotFound { .. } => "IndexerNotFound",
            ResolutionError::AmbiguousIndexer { .. } => "AmbiguousIndexer",
            ResolutionError::NoImplicitConversion { .. } => "NoImplicitConversion",
            ResolutionError::NotAssignable { .. } => "NotAssignable",
            ResolutionError::UnknownIdentifier { .. } => "UnknownIdentifier",
            ResolutionError::UnknownType { .. } => "UnknownType",
        }
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Why a single view failed to compile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    #[error("view '{path}' does not exist")]
    SourceNotFound { path: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{error}")]
    Binding { error: ResolutionError, span: Span },

    #[error("{message}")]
    ControlTree { message: String, span: Option<Span> },

    #[error("dependency cycle detected: {chain}")]
    DependencyCycle { chain: String, span: Option<Span> },

    #[error("{kind} '{path}' failed to compile")]
    DependencyFailed {
        kind: &'static str,
        path: String,
        span: Option<Span>,
    },
}

impl CompilationError {
    /// Best available source position.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompilationError::SourceNotFound { .. } => None,
            CompilationError::Parse(error) => Some(error.span),
            CompilationError::Binding { span, .. } => Some(*span),
            CompilationError::ControlTree { span, .. } => *span,
            CompilationError::DependencyCycle { span, .. } => *span,
            CompilationError::DependencyFailed { span, .. } => *span,
        }
    }

    /// Diagnostic class name for reports.
    pub fn class(&self) -> &'static str {
        match self {
            CompilationError::SourceNotFound { .. } => "SourceNotFound",
            CompilationError::Parse(_) => "Parse",
            CompilationError::Binding { error, .. } => error.class(),
            CompilationError::ControlTree { .. } => "ControlTree",
            CompilationError::DependencyCycle { .. } => "DependencyCycle",
            CompilationError::DependencyFailed { .. } => "DependencyFailed",
        }
    }

    pub fn control_tree(message: impl Into<String>, span: Option<Span>) -> Self {
        CompilationError::ControlTree {
            message: message.into(),
            span,
        }
    }
}
