//! Built-in operators on primitive operands.
//!
//! The table is keyed by operator and the operand type classes. Nullable
//! operands never match here; the resolver lifts them separately.

use dothtml_core::{DataType, PrimitiveKind};
use dothtml_parser::binding::{BinaryOp, UnaryOp};

/// Operand types to convert to, and the result type.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorSignature {
    pub left: DataType,
    pub right: DataType,
    pub result: DataType,
}

impl OperatorSignature {
    fn new(left: DataType, right: DataType, result: DataType) -> Self {
        Self { left, right, result }
    }

    fn uniform(ty: DataType) -> Self {
        Self::new(ty.clone(), ty.clone(), ty)
    }

    fn predicate(ty: DataType) -> Self {
        Self::new(ty.clone(), ty, DataType::bool())
    }
}

/// Numeric rank for binary promotion; `None` for non-numeric kinds.
fn numeric_rank(kind: PrimitiveKind) -> Option<u8> {
    use PrimitiveKind::*;
    Some(match kind {
        Char | Int32 => 0,
        Int64 => 1,
        Single => 2,
        Double => 3,
        Decimal => 4,
        Bool | String | Object => return None,
    })
}

/// Binary numeric promotion: the wider operand type, at least `int`.
/// `decimal` does not mix with floating point.
pub fn promote(left: PrimitiveKind, right: PrimitiveKind) -> Option<PrimitiveKind> {
    use PrimitiveKind::*;
    let (l, r) = (numeric_rank(left)?, numeric_rank(right)?);
    let floating = |k| matches!(k, Single | Double);
    if (left == Decimal && floating(right)) || (right == Decimal && floating(left)) {
        return None;
    }
    Some(match l.max(r) {
        0 => Int32,
        1 => Int64,
        2 => Single,
        3 => Double,
        _ => Decimal,
    })
}

fn promote_integral(kind: PrimitiveKind) -> Option<PrimitiveKind> {
    match kind {
        PrimitiveKind::Char | PrimitiveKind::Int32 => Some(PrimitiveKind::Int32),
        PrimitiveKind::Int64 => Some(PrimitiveKind::Int64),
        _ => None,
    }
}

fn accepts_null(ty: &DataType) -> bool {
    match ty {
        DataType::Nullable(_) | DataType::Array(_) | DataType::Null => true,
        DataType::Named(_) => ty.primitive().is_none_or(|kind| !kind.is_value_type()),
        _ => false,
    }
}

/// Look up a built-in binary operator for the operand types.
pub fn binary_signature(op: BinaryOp, left: &DataType, right: &DataType) -> Option<OperatorSignature> {
    use BinaryOp::*;

    if op.is_equality() {
        match (left, right) {
            (DataType::Null, DataType::Null) => return Some(OperatorSignature::predicate(DataType::object())),
            (DataType::Null, other) | (other, DataType::Null) if accepts_null(other) => {
                return Some(OperatorSignature::predicate(other.clone()));
            }
            _ => {}
        }
    }

    if op == Add && (*left == DataType::string() || *right == DataType::string()) {
        let operand_ok = |ty: &DataType| !matches!(ty, DataType::Unknown | DataType::Void);
        return (operand_ok(left) && operand_ok(right)).then(|| OperatorSignature::uniform(DataType::string()));
    }

    let (l, r) = (left.primitive()?, right.primitive()?);
    match op {
        Add | Sub | Mul | Div | Mod => promote(l, r).map(|p| OperatorSignature::uniform(p.data_type())),
        Less | LessEqual | Greater | GreaterEqual => {
            promote(l, r).map(|p| OperatorSignature::predicate(p.data_type()))
        }
        Equal | NotEqual => {
            if let Some(p) = promote(l, r) {
                return Some(OperatorSignature::predicate(p.data_type()));
            }
            match (l, r) {
                (PrimitiveKind::Bool, PrimitiveKind::Bool) => Some(OperatorSignature::predicate(DataType::bool())),
                (PrimitiveKind::String, PrimitiveKind::String) => {
                    Some(OperatorSignature::predicate(DataType::string()))
                }
                _ => None,
            }
        }
        BitAnd | BitOr | BitXor => {
            if l == PrimitiveKind::Bool && r == PrimitiveKind::Bool {
                return Some(OperatorSignature::uniform(DataType::bool()));
            }
            let p = promote(promote_integral(l)?, promote_integral(r)?)?;
            Some(OperatorSignature::uniform(p.data_type()))
        }
        ShiftLeft | ShiftRight => {
            let shifted = promote_integral(l)?.data_type();
            promote_integral(r)
                .filter(|k| *k == PrimitiveKind::Int32)
                .map(|_| OperatorSignature::new(shifted.clone(), DataType::int32(), shifted))
        }
        Coalesce | AndAlso | OrElse => None,
    }
}

/// Look up a built-in unary operator: (operand type, result type).
pub fn unary_signature(op: UnaryOp, operand: &DataType) -> Option<(DataType, DataType)> {
    let kind = operand.primitive()?;
    let ty = match op {
        UnaryOp::Not => (kind == PrimitiveKind::Bool).then(DataType::bool)?,
        UnaryOp::Neg | UnaryOp::Plus => match kind {
            PrimitiveKind::Char => DataType::int32(),
            k if k.is_numeric() => operand.clone(),
            _ => return None,
        },
        UnaryOp::BitNot => promote_integral(kind)?.data_type(),
    };
    Some((ty.clone(), ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Promotion
    // ========================================================================

    #[test]
    fn promotion_widens_to_larger_operand() {
        use PrimitiveKind::*;
        assert_eq!(promote(Int32, Int64), Some(Int64));
        assert_eq!(promote(Char, Char), Some(Int32));
        assert_eq!(promote(Int64, Double), Some(Double));
        assert_eq!(promote(Int32, Decimal), Some(Decimal));
        assert_eq!(promote(Double, Decimal), None);
        assert_eq!(promote(Bool, Int32), None);
    }

    // ========================================================================
    // Binary table
    // ========================================================================

    #[test]
    fn arithmetic_on_mixed_numbers() {
        let sig = binary_signature(BinaryOp::Add, &DataType::int32(), &DataType::double()).unwrap();
        assert_eq!(sig, OperatorSignature::uniform(DataType::double()));
    }

    #[test]
    fn comparison_yields_bool() {
        let sig = binary_signature(BinaryOp::Less, &DataType::int32(), &DataType::int64()).unwrap();
        assert_eq!(sig.left, DataType::int64());
        assert_eq!(sig.result, DataType::bool());
    }

    #[test]
    fn string_concatenation_accepts_any_value() {
        let sig = binary_signature(BinaryOp::Add, &DataType::string(), &DataType::int32()).unwrap();
        assert_eq!(sig.result, DataType::string());
        assert!(binary_signature(BinaryOp::Sub, &DataType::string(), &DataType::int32()).is_none());
    }

    #[test]
    fn null_equality_needs_nullable_operand() {
        let nullable = DataType::nullable(DataType::int32());
        let sig = binary_signature(BinaryOp::Equal, &nullable, &DataType::Null).unwrap();
        assert_eq!(sig.left, nullable);
        assert!(binary_signature(BinaryOp::Equal, &DataType::int32(), &DataType::Null).is_none());
    }

    #[test]
    fn nullable_operands_are_not_in_the_table() {
        let nullable = DataType::nullable(DataType::int32());
        assert!(binary_signature(BinaryOp::Add, &nullable, &nullable).is_none());
    }

    #[test]
    fn logical_and_shift_operators() {
        let sig = binary_signature(BinaryOp::BitAnd, &DataType::bool(), &DataType::bool()).unwrap();
        assert_eq!(sig.result, DataType::bool());
        let sig = binary_signature(BinaryOp::ShiftLeft, &DataType::int64(), &DataType::int32()).unwrap();
        assert_eq!(sig.result, DataType::int64());
        assert!(binary_signature(BinaryOp::ShiftLeft, &DataType::int32(), &DataType::int64()).is_none());
        assert!(binary_signature(BinaryOp::BitOr, &DataType::double(), &DataType::int32()).is_none());
    }

    // ========================================================================
    // Unary table
    // ========================================================================

    #[test]
    fn unary_operators() {
        assert_eq!(
            unary_signature(UnaryOp::Not, &DataType::bool()),
            Some((DataType::bool(), DataType::bool()))
        );
        assert_eq!(unary_signature(UnaryOp::Neg, &DataType::char()).map(|s| s.1), Some(DataType::int32()));
        assert!(unary_signature(UnaryOp::Not, &DataType::int32()).is_none());
        assert!(unary_signature(UnaryOp::BitNot, &DataType::double()).is_none());
    }
}
