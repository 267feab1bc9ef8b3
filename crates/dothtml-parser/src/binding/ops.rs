//! Binding operators with precedence and associativity for the Pratt parser.

use std::fmt;

use super::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Coalesce,
    OrElse,
    AndAlso,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    ShiftLeft,
    ShiftRight,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Get the binding power (precedence) for this operator.
    ///
    /// Returns (left_bp, right_bp). Everything is left-associative except
    /// `??`, which is right-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            Coalesce => (4, 3),
            OrElse => (5, 6),
            AndAlso => (7, 8),
            BitOr => (9, 10),
            BitXor => (11, 12),
            BitAnd => (13, 14),
            Equal | NotEqual => (15, 16),
            Less | LessEqual | Greater | GreaterEqual => (17, 18),
            ShiftLeft | ShiftRight => (19, 20),
            Add | Sub => (21, 22),
            Mul | Div | Mod => (23, 24),
        }
    }

    /// Map a single token to an operator. `>>` is assembled by the parser.
    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            QuestionQuestion => BinaryOp::Coalesce,
            PipePipe => BinaryOp::OrElse,
            AmpAmp => BinaryOp::AndAlso,
            Pipe => BinaryOp::BitOr,
            Caret => BinaryOp::BitXor,
            Amp => BinaryOp::BitAnd,
            EqualEqual => BinaryOp::Equal,
            BangEqual => BinaryOp::NotEqual,
            Less => BinaryOp::Less,
            LessEqual => BinaryOp::LessEqual,
            Greater => BinaryOp::Greater,
            GreaterEqual => BinaryOp::GreaterEqual,
            LessLess => BinaryOp::ShiftLeft,
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Sub,
            Star => BinaryOp::Mul,
            Slash => BinaryOp::Div,
            Percent => BinaryOp::Mod,
            _ => return None,
        })
    }

    pub fn is_comparison(&self) -> bool {
        use BinaryOp::*;
        matches!(self, Less | LessEqual | Greater | GreaterEqual)
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    /// Name of a user-defined operator method implementing this operator.
    pub fn method_name(&self) -> Option<&'static str> {
        use BinaryOp::*;
        Some(match self {
            Add => "op_Addition",
            Sub => "op_Subtraction",
            Mul => "op_Multiply",
            Div => "op_Division",
            Mod => "op_Modulus",
            BitAnd => "op_BitwiseAnd",
            BitOr => "op_BitwiseOr",
            BitXor => "op_ExclusiveOr",
            ShiftLeft => "op_LeftShift",
            ShiftRight => "op_RightShift",
            Equal => "op_Equality",
            NotEqual => "op_Inequality",
            Less => "op_LessThan",
            LessEqual => "op_LessThanOrEqual",
            Greater => "op_GreaterThan",
            GreaterEqual => "op_GreaterThanOrEqual",
            Coalesce | OrElse | AndAlso => return None,
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOp::*;
        let s = match self {
            Coalesce => "??",
            OrElse => "||",
            AndAlso => "&&",
            BitOr => "|",
            BitXor => "^",
            BitAnd => "&",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `~`
    BitNot,
}

impl UnaryOp {
    pub fn binding_power() -> u8 {
        25
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        Some(match token {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return None,
        })
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            UnaryOp::Not => "op_LogicalNot",
            UnaryOp::Neg => "op_UnaryNegation",
            UnaryOp::Plus => "op_UnaryPlus",
            UnaryOp::BitNot => "op_OnesComplement",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
        };
        write!(f, "{s}")
    }
}

/// Binding power of member access, calls and indexers.
pub const POSTFIX_BP: u8 = 27;

/// Binding power of `=`, right-associative and lowest.
pub const ASSIGN_BP: (u8, u8) = (2, 1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert!(BinaryOp::Mul.binding_power().0 > BinaryOp::Add.binding_power().0);
    }

    #[test]
    fn coalesce_is_right_associative() {
        let (l, r) = BinaryOp::Coalesce.binding_power();
        assert!(l > r);
    }

    #[test]
    fn short_circuit_operators_have_no_method() {
        assert_eq!(BinaryOp::AndAlso.method_name(), None);
        assert_eq!(BinaryOp::Add.method_name(), Some("op_Addition"));
    }
}
