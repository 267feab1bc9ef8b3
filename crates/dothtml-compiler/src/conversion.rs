//! Implicit conversions between binding types.
//!
//! [`find_conversion`] answers "can a value of type A be used where B is
//! expected, and at what cost"; [`implicit_conversion`] applies the answer
//! to an expression.
//!
//! ## Conversion Priority
//!
//! 1. Identity
//! 2. `null` literal to a reference or nullable type
//! 3. Numeric widening (`int` to `long`, `float` to `double`, ...)
//! 4. Integer to floating point
//! 5. Wrapping `T` into `T?`
//! 6. Reference conversion to a base class or interface
//! 7. Boxing a value type to `object` or an interface
//! 8. `ToString()`, only where the caller allows it (assignment targets)

use dothtml_core::{DataType, PrimitiveKind};
use dothtml_registry::{MemberEntry, TypeSystem};

use crate::typed_expr::TypedExpr;

/// A conversion with its cost for overload ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub kind: ConversionKind,
    /// Lower is better.
    pub cost: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    Identity,
    NullLiteral,
    NumericWidening,
    IntToFloat,
    NullableWrap,
    Reference,
    Boxing,
    ToString,
}

impl Conversion {
    pub const COST_EXACT: u32 = 0;
    pub const COST_NULL_LITERAL: u32 = 1;
    pub const COST_PRIMITIVE_WIDENING: u32 = 4;
    pub const COST_INT_TO_FLOAT: u32 = 8;
    pub const COST_NULLABLE_WRAP: u32 = 9;
    pub const COST_REFERENCE_CAST: u32 = 10;
    pub const COST_BOXING: u32 = 11;
    pub const COST_TO_STRING: u32 = 20;

    pub(crate) fn identity() -> Self {
        Self::new(ConversionKind::Identity, Self::COST_EXACT)
    }

    fn new(kind: ConversionKind, cost: u32) -> Self {
        Self { kind, cost }
    }

    /// Whether the value keeps its representation.
    pub fn is_exact(&self) -> bool {
        matches!(self.kind, ConversionKind::Identity)
    }
}

/// Implicit numeric conversion between primitives.
pub fn find_primitive_conversion(from: PrimitiveKind, to: PrimitiveKind) -> Option<Conversion> {
    use PrimitiveKind::*;
    if from == to {
        return Some(Conversion::identity());
    }
    let kind = match (from, to) {
        (Char, Int32 | Int64 | Decimal) | (Int32, Int64 | Decimal) | (Int64, Decimal) | (Single, Double) => {
            ConversionKind::NumericWidening
        }
        (Char | Int32 | Int64, Single | Double) => ConversionKind::IntToFloat,
        _ => return None,
    };
    let cost = match kind {
        ConversionKind::IntToFloat => Conversion::COST_INT_TO_FLOAT,
        _ => Conversion::COST_PRIMITIVE_WIDENING,
    };
    Some(Conversion::new(kind, cost))
}

pub fn is_primitive_numeric(ty: &DataType) -> bool {
    ty.primitive().is_some_and(PrimitiveKind::is_numeric)
}

/// Find the implicit conversion from `from` to `to`, if any.
pub fn find_conversion(types: &dyn TypeSystem, from: &DataType, to: &DataType) -> Option<Conversion> {
    if from == to {
        return Some(Conversion::identity());
    }
    match from {
        DataType::Unknown | DataType::Void => return None,
        DataType::Null => {
            let accepts_null = match to {
                DataType::Nullable(_) | DataType::Array(_) => true,
                DataType::Named(_) => !types.is_value_type(to),
                _ => false,
            };
            return accepts_null.then(|| Conversion::new(ConversionKind::NullLiteral, Conversion::COST_NULL_LITERAL));
        }
        _ => {}
    }

    if let (Some(source), Some(target)) = (from.primitive(), to.primitive())
        && let Some(conversion) = find_primitive_conversion(source, target)
    {
        return Some(conversion);
    }

    if let DataType::Nullable(inner) = to
        && from.nullable_inner().is_none()
    {
        return find_conversion(types, from, inner)
            .filter(|c| matches!(c.kind, ConversionKind::Identity | ConversionKind::NumericWidening | ConversionKind::IntToFloat))
            .map(|c| Conversion::new(ConversionKind::NullableWrap, Conversion::COST_NULLABLE_WRAP + c.cost));
    }

    if to.is_object() || types.is_assignable(from, to) {
        return Some(if types.is_value_type(from) {
            Conversion::new(ConversionKind::Boxing, Conversion::COST_BOXING)
        } else {
            Conversion::new(ConversionKind::Reference, Conversion::COST_REFERENCE_CAST)
        });
    }

    None
}

/// Convert `expr` to `to`, returning `None` if no implicit conversion exists.
///
/// With `allow_to_string`, any value converts to `string` through its
/// `ToString()` method.
pub fn implicit_conversion(
    types: &dyn TypeSystem,
    expr: TypedExpr,
    to: &DataType,
    allow_to_string: bool,
) -> Option<TypedExpr> {
    let from = expr.ty();
    if let Some(conversion) = find_conversion(types, &from, to) {
        return Some(apply(expr, to, conversion));
    }
    if allow_to_string && *to == DataType::string() && expr.is_value() {
        return to_string_call(types, expr);
    }
    None
}

/// Wrap `expr` according to a conversion found by [`find_conversion`].
pub fn apply(expr: TypedExpr, to: &DataType, conversion: Conversion) -> TypedExpr {
    if conversion.is_exact() {
        return expr;
    }
    TypedExpr::Convert {
        expr: Box::new(expr),
        ty: to.clone(),
        kind: conversion.kind,
    }
}

fn to_string_call(types: &dyn TypeSystem, expr: TypedExpr) -> Option<TypedExpr> {
    let method = types
        .lookup_members(&expr.ty(), "ToString", false)
        .into_iter()
        .find_map(|member| match member {
            MemberEntry::Method(method) if method.params.is_empty() => Some(method),
            _ => None,
        })?;
    Some(TypedExpr::Call {
        target: Some(Box::new(expr)),
        method,
        args: Vec::new(),
    })
}
