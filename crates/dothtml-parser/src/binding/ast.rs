//! Arena-allocated binding expression syntax tree.
//!
//! All nodes live in a `bumpalo::Bump` owned by the caller; the tree is
//! dropped with the arena once the binder has produced a typed expression.

use std::fmt;

use dothtml_core::{Constant, Span};

use super::ops::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// Suffix applied to a type name: `[]` or `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSuffix {
    Array,
    Nullable,
}

/// A type written in an explicit generic argument list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeExpr<'ast> {
    /// Dotted name as written.
    pub name: &'ast str,
    pub args: &'ast [TypeExpr<'ast>],
    pub suffixes: &'ast [TypeSuffix],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingExpr<'ast> {
    Literal(&'ast LiteralExpr),
    Ident(&'ast IdentExpr<'ast>),
    Member(&'ast MemberExpr<'ast>),
    Call(&'ast CallExpr<'ast>),
    Index(&'ast IndexExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    Assign(&'ast AssignExpr<'ast>),
    Paren(&'ast ParenExpr<'ast>),
}

impl<'ast> BindingExpr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            BindingExpr::Literal(e) => e.span,
            BindingExpr::Ident(e) => e.span,
            BindingExpr::Member(e) => e.span,
            BindingExpr::Call(e) => e.span,
            BindingExpr::Index(e) => e.span,
            BindingExpr::Unary(e) => e.span,
            BindingExpr::Binary(e) => e.span,
            BindingExpr::Assign(e) => e.span,
            BindingExpr::Paren(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub value: Constant,
    pub span: Span,
}

/// A bare identifier, optionally with explicit type arguments (`Method<int>`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentExpr<'ast> {
    pub ident: Ident<'ast>,
    pub type_args: &'ast [TypeExpr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub target: &'ast BindingExpr<'ast>,
    pub member: Ident<'ast>,
    pub type_args: &'ast [TypeExpr<'ast>],
    pub span: Span,
}

/// A call argument, positional or `name: value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Argument<'ast> {
    pub name: Option<Ident<'ast>>,
    pub value: &'ast BindingExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: &'ast BindingExpr<'ast>,
    pub args: &'ast [Argument<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub target: &'ast BindingExpr<'ast>,
    pub index: &'ast BindingExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast BindingExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast BindingExpr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast BindingExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignExpr<'ast> {
    pub target: &'ast BindingExpr<'ast>,
    pub value: &'ast BindingExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: &'ast BindingExpr<'ast>,
    pub span: Span,
}

// ============================================================================
// Source-like rendering, used in diagnostics
// ============================================================================

fn write_type_args(f: &mut fmt::Formatter<'_>, args: &[TypeExpr<'_>]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "<")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    write!(f, ">")
}

impl fmt::Display for TypeExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        write_type_args(f, self.args)?;
        for suffix in self.suffixes {
            match suffix {
                TypeSuffix::Array => write!(f, "[]")?,
                TypeSuffix::Nullable => write!(f, "?")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for BindingExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingExpr::Literal(e) => write!(f, "{}", e.value),
            BindingExpr::Ident(e) => {
                write!(f, "{}", e.ident.name)?;
                write_type_args(f, e.type_args)
            }
            BindingExpr::Member(e) => {
                write!(f, "{}.{}", e.target, e.member.name)?;
                write_type_args(f, e.type_args)
            }
            BindingExpr::Call(e) => {
                write!(f, "{}(", e.callee)?;
                for (i, arg) in e.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(name) = arg.name {
                        write!(f, "{}: ", name.name)?;
                    }
                    write!(f, "{}", arg.value)?;
                }
                write!(f, ")")
            }
            BindingExpr::Index(e) => write!(f, "{}[{}]", e.target, e.index),
            BindingExpr::Unary(e) => write!(f, "{}{}", e.op, e.operand),
            BindingExpr::Binary(e) => write!(f, "{} {} {}", e.left, e.op, e.right),
            BindingExpr::Assign(e) => write!(f, "{} = {}", e.target, e.value),
            BindingExpr::Paren(e) => write!(f, "({})", e.expr),
        }
    }
}
