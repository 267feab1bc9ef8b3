//! Operator resolution.
//!
//! ## Binary operators
//!
//! `??`, `&&` and `||` are typed directly. Every other operator goes
//! through this chain, stopping at the first hit:
//!
//! 1. The built-in operator table ([`primitive`])
//! 2. User-defined `op_*` static methods on either operand type
//! 3. `==`/`!=`: an equality method ([`equals_method`])
//! 4. Relational operators: `CompareTo(...)` against zero
//! 5. One retry with `Nullable<T>` operands unwrapped through `.Value`
//!
//! The lifting retry runs at most once; an operator still unresolved on
//! the unwrapped operands reports the original operand types.

mod equality;
mod indexer;
pub mod primitive;

pub use equality::{Comparison, equals_method, resolve_comparison};
pub use indexer::get_indexer;

use dothtml_core::{Constant, DataType, ResolutionError};
use dothtml_parser::binding::{BinaryOp, UnaryOp};
use dothtml_registry::{MemberEntry, MethodEntry, TypeSystem};
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::conversion::{find_conversion, implicit_conversion};
use crate::member::{resolve_member, update_member};
use crate::overload::{find_best_match, viable_candidates};
use crate::typed_expr::TypedExpr;

use self::primitive::{binary_signature, unary_signature};

fn no_binary_operator(op: BinaryOp, left: &TypedExpr, right: &TypedExpr) -> ResolutionError {
    ResolutionError::NoApplicableOperator {
        op: op.to_string(),
        operands: format!("operands of type '{}' and '{}'", left.ty(), right.ty()),
    }
}

fn no_unary_operator(op: UnaryOp, operand: &TypedExpr) -> ResolutionError {
    ResolutionError::NoApplicableOperator {
        op: op.to_string(),
        operands: format!("operand of type '{}'", operand.ty()),
    }
}

/// Resolve `left op right`.
pub fn resolve_binary(
    types: &dyn TypeSystem,
    left: &TypedExpr,
    op: BinaryOp,
    right: &TypedExpr,
) -> Result<TypedExpr, ResolutionError> {
    match op {
        BinaryOp::Coalesce => resolve_coalesce(types, left, right),
        BinaryOp::AndAlso | BinaryOp::OrElse => {
            let bool_ty = DataType::bool();
            let l = implicit_conversion(types, left.clone(), &bool_ty, false);
            let r = implicit_conversion(types, right.clone(), &bool_ty, false);
            match (l, r) {
                (Some(l), Some(r)) => Ok(binary(l, op, r, bool_ty, None)),
                _ => Err(no_binary_operator(op, left, right)),
            }
        }
        _ => resolve_operator(types, left, op, right, true),
    }
}

/// Resolve `target = value`.
pub fn resolve_assign(types: &dyn TypeSystem, target: &TypedExpr, value: &TypedExpr) -> Result<TypedExpr, ResolutionError> {
    update_member(types, target, value.clone())?.ok_or_else(|| ResolutionError::NotAssignable {
        expr: target.to_string(),
    })
}

fn binary(left: TypedExpr, op: BinaryOp, right: TypedExpr, ty: DataType, method: Option<MethodEntry>) -> TypedExpr {
    TypedExpr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        ty,
        method,
    }
}

fn resolve_coalesce(types: &dyn TypeSystem, left: &TypedExpr, right: &TypedExpr) -> Result<TypedExpr, ResolutionError> {
    let left_ty = left.ty();
    let right_ty = right.ty();
    let result_ty = match &left_ty {
        DataType::Nullable(inner) if find_conversion(types, &right_ty, inner).is_some() => inner.as_ref().clone(),
        DataType::Nullable(_) => left_ty.clone(),
        DataType::Null => right_ty,
        DataType::Unknown | DataType::Void => return Err(no_binary_operator(BinaryOp::Coalesce, left, right)),
        ty if !types.is_value_type(ty) => ty.clone(),
        _ => return Err(no_binary_operator(BinaryOp::Coalesce, left, right)),
    };
    let converted = implicit_conversion(types, right.clone(), &result_ty, false)
        .ok_or_else(|| no_binary_operator(BinaryOp::Coalesce, left, right))?;
    Ok(binary(left.clone(), BinaryOp::Coalesce, converted, result_ty, None))
}

fn resolve_operator(
    types: &dyn TypeSystem,
    left: &TypedExpr,
    op: BinaryOp,
    right: &TypedExpr,
    allow_lift: bool,
) -> Result<TypedExpr, ResolutionError> {
    let (left_ty, right_ty) = (left.ty(), right.ty());

    if let Some(signature) = binary_signature(op, &left_ty, &right_ty) {
        let concat = signature.result == DataType::string() && op == BinaryOp::Add;
        let l = implicit_conversion(types, left.clone(), &signature.left, concat);
        let r = implicit_conversion(types, right.clone(), &signature.right, concat);
        if let (Some(l), Some(r)) = (l, r) {
            trace!(%op, result = %signature.result, "built-in operator");
            return Ok(binary(l, op, r, signature.result, None));
        }
    }

    if let Some(expr) = user_binary_operator(types, left, op, right)? {
        return Ok(expr);
    }

    if op.is_equality()
        && let Some(call) = equals_method(types, left, right)
    {
        trace!(%op, "equality through method call");
        return Ok(match op {
            BinaryOp::NotEqual => TypedExpr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(call),
                ty: DataType::bool(),
                method: None,
            },
            _ => call,
        });
    }

    if op.is_comparison()
        && let Ok(comparison) = resolve_comparison(types, left, right)
    {
        trace!(%op, swapped = comparison.swapped, "ordering through CompareTo");
        let op = if comparison.swapped { mirror(op) } else { op };
        let zero = TypedExpr::constant(Constant::Int(0));
        return Ok(binary(comparison.call, op, zero, DataType::bool(), None));
    }

    let nullable = left_ty.nullable_inner().is_some() || right_ty.nullable_inner().is_some();
    if allow_lift && nullable {
        trace!(%op, left = %left_ty, right = %right_ty, "lifting nullable operands");
        let l = unwrap_nullable(types, left)?;
        let r = unwrap_nullable(types, right)?;
        return resolve_operator(types, &l, op, &r, false).map_err(|_| no_binary_operator(op, left, right));
    }

    Err(no_binary_operator(op, left, right))
}

fn mirror(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Less => BinaryOp::Greater,
        BinaryOp::LessEqual => BinaryOp::GreaterEqual,
        BinaryOp::Greater => BinaryOp::Less,
        BinaryOp::GreaterEqual => BinaryOp::LessEqual,
        other => other,
    }
}

/// `x.Value` for a nullable `x`, `x` otherwise.
fn unwrap_nullable(types: &dyn TypeSystem, expr: &TypedExpr) -> Result<TypedExpr, ResolutionError> {
    if expr.ty().nullable_inner().is_none() {
        return Ok(expr.clone());
    }
    resolve_member(types, expr, "Value", &[], true)?.ok_or_else(|| ResolutionError::MemberNotFound {
        member: "Value".to_string(),
        type_name: expr.ty().to_string(),
        is_static: false,
    })
}

/// Static operator methods named `name` on any of `operand_types`.
fn operator_methods(types: &dyn TypeSystem, name: &str, operand_types: &[DataType]) -> Vec<MethodEntry> {
    let mut seen = FxHashSet::default();
    let mut methods = Vec::new();
    for ty in operand_types {
        if ty.primitive().is_some() || !matches!(ty, DataType::Named(_)) {
            continue;
        }
        for member in types.lookup_members(ty, name, true) {
            if let MemberEntry::Method(method) = member
                && seen.insert(method.hash)
            {
                methods.push(method);
            }
        }
    }
    methods
}

fn user_binary_operator(
    types: &dyn TypeSystem,
    left: &TypedExpr,
    op: BinaryOp,
    right: &TypedExpr,
) -> Result<Option<TypedExpr>, ResolutionError> {
    let Some(name) = op.method_name() else {
        return Ok(None);
    };
    let methods = operator_methods(types, name, &[left.ty(), right.ty()]);
    if methods.is_empty() {
        return Ok(None);
    }
    let viable = viable_candidates(types, &methods, &[], &[left.clone(), right.clone()], &[]);
    if viable.is_empty() {
        return Ok(None);
    }
    let best = find_best_match(name, viable)?;
    let mut args = best.args.into_iter();
    let (Some(l), Some(r)) = (args.next(), args.next()) else {
        return Ok(None);
    };
    let ty = best.method.return_type.clone();
    Ok(Some(binary(l, op, r, ty, Some(best.method))))
}

/// Resolve `op operand`.
pub fn resolve_unary(types: &dyn TypeSystem, op: UnaryOp, operand: &TypedExpr) -> Result<TypedExpr, ResolutionError> {
    resolve_unary_operator(types, op, operand, true)
}

fn resolve_unary_operator(
    types: &dyn TypeSystem,
    op: UnaryOp,
    operand: &TypedExpr,
    allow_lift: bool,
) -> Result<TypedExpr, ResolutionError> {
    let ty = operand.ty();
    if let Some((operand_ty, result)) = unary_signature(op, &ty)
        && let Some(converted) = implicit_conversion(types, operand.clone(), &operand_ty, false)
    {
        return Ok(TypedExpr::Unary {
            op,
            operand: Box::new(converted),
            ty: result,
            method: None,
        });
    }

    let name = op.method_name();
    let methods = operator_methods(types, name, std::slice::from_ref(&ty));
    let viable = viable_candidates(types, &methods, &[], std::slice::from_ref(operand), &[]);
    if !viable.is_empty() {
        let best = find_best_match(name, viable)?;
        if let Some(arg) = best.args.into_iter().next() {
            return Ok(TypedExpr::Unary {
                op,
                operand: Box::new(arg),
                ty: best.method.return_type.clone(),
                method: Some(best.method),
            });
        }
    }

    if allow_lift && ty.nullable_inner().is_some() {
        let inner = unwrap_nullable(types, operand)?;
        return resolve_unary_operator(types, op, &inner, false).map_err(|_| no_unary_operator(op, operand));
    }

    Err(no_unary_operator(op, operand))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_registry::{MethodBuilder, TypeBuilder, TypeRegistry};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_primitives();
        let money = DataType::named("App.Money");
        registry
            .register_type(
                TypeBuilder::new("App.Money", "App")
                    .value_type()
                    .method(
                        MethodBuilder::new("op_Addition", money.clone())
                            .static_method()
                            .param("a", money.clone())
                            .param("b", money.clone()),
                    )
                    .method(
                        MethodBuilder::new("op_UnaryNegation", money.clone())
                            .static_method()
                            .param("a", money),
                    )
                    .build(),
            )
            .unwrap();
        registry
            .register_type(TypeBuilder::new("App.Plain", "App").value_type().build())
            .unwrap();
        registry
    }

    fn param(name: &str, ty: DataType) -> TypedExpr {
        TypedExpr::parameter(name, ty)
    }

    fn int(value: i32) -> TypedExpr {
        TypedExpr::constant(Constant::Int(value))
    }

    // ========================================================================
    // Directly typed operators
    // ========================================================================

    #[test]
    fn coalesce_nullable_with_value() {
        let registry = registry();
        let left = param("a", DataType::nullable(DataType::int32()));
        let result = resolve_binary(&registry, &left, BinaryOp::Coalesce, &int(0)).unwrap();
        assert_eq!(result.ty(), DataType::int32());
    }

    #[test]
    fn coalesce_reference_types() {
        let registry = registry();
        let left = param("a", DataType::string());
        let right = TypedExpr::constant(Constant::string("none"));
        assert_eq!(
            resolve_binary(&registry, &left, BinaryOp::Coalesce, &right).unwrap().ty(),
            DataType::string()
        );
        assert!(resolve_binary(&registry, &int(1), BinaryOp::Coalesce, &int(2)).is_err());
    }

    #[test]
    fn logical_operators_need_bool() {
        let registry = registry();
        let flag = param("f", DataType::bool());
        assert_eq!(
            resolve_binary(&registry, &flag, BinaryOp::AndAlso, &flag).unwrap().ty(),
            DataType::bool()
        );
        let err = resolve_binary(&registry, &flag, BinaryOp::OrElse, &int(1)).unwrap_err();
        assert!(matches!(err, ResolutionError::NoApplicableOperator { .. }));
    }

    #[test]
    fn assignment_to_readonly_value_fails() {
        let registry = registry();
        let err = resolve_assign(&registry, &int(1), &int(2)).unwrap_err();
        assert!(matches!(err, ResolutionError::NotAssignable { .. }));
        let target = param("x", DataType::int64());
        let assign = resolve_assign(&registry, &target, &int(2)).unwrap();
        assert!(matches!(assign, TypedExpr::Assign { .. }));
    }

    // ========================================================================
    // Fallback chain
    // ========================================================================

    #[test]
    fn built_in_arithmetic_converts_operands() {
        let registry = registry();
        let result = resolve_binary(&registry, &int(1), BinaryOp::Add, &param("d", DataType::double())).unwrap();
        let TypedExpr::Binary { left, ty, .. } = &result else {
            panic!("expected binary");
        };
        assert_eq!(*ty, DataType::double());
        assert_eq!(left.ty(), DataType::double());
    }

    #[test]
    fn string_concatenation_calls_to_string() {
        let registry = registry();
        let text = TypedExpr::constant(Constant::string("n = "));
        let result = resolve_binary(&registry, &text, BinaryOp::Add, &int(1)).unwrap();
        let TypedExpr::Binary { right, .. } = &result else {
            panic!("expected binary");
        };
        assert!(matches!(**right, TypedExpr::Call { .. }));
    }

    #[test]
    fn user_defined_operator() {
        let registry = registry();
        let money = param("m", DataType::named("App.Money"));
        let result = resolve_binary(&registry, &money, BinaryOp::Add, &money).unwrap();
        assert!(matches!(result, TypedExpr::Binary { method: Some(_), .. }));
        let negated = resolve_unary(&registry, UnaryOp::Neg, &money).unwrap();
        assert!(matches!(negated, TypedExpr::Unary { method: Some(_), .. }));
    }

    #[test]
    fn not_equal_negates_equals_call() {
        let registry = registry();
        let plain = param("p", DataType::named("App.Plain"));
        let result = resolve_binary(&registry, &plain, BinaryOp::NotEqual, &plain).unwrap();
        let TypedExpr::Unary { op, operand, .. } = &result else {
            panic!("expected negation");
        };
        assert_eq!(*op, UnaryOp::Not);
        assert!(matches!(**operand, TypedExpr::Call { .. }));
    }

    #[test]
    fn relational_operator_through_compare_to() {
        let registry = registry();
        let text = param("s", DataType::string());
        let result = resolve_binary(&registry, &text, BinaryOp::Less, &text).unwrap();
        let TypedExpr::Binary { left, right, op, .. } = &result else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Less);
        assert!(matches!(**left, TypedExpr::Call { .. }));
        assert_eq!(**right, int(0));
    }

    // ========================================================================
    // Nullable lifting
    // ========================================================================

    #[test]
    fn nullable_operands_are_lifted_once() {
        let registry = registry();
        let nullable = param("n", DataType::nullable(DataType::int32()));
        let result = resolve_binary(&registry, &nullable, BinaryOp::Mul, &nullable).unwrap();
        let TypedExpr::Binary { left, ty, .. } = &result else {
            panic!("expected binary");
        };
        assert_eq!(*ty, DataType::int32());
        assert!(matches!(**left, TypedExpr::MemberAccess { ref member, .. } if &*member.name == "Value"));
    }

    #[test]
    fn lifting_does_not_repeat() {
        let registry = registry();
        let nested = param("n", DataType::nullable(DataType::named("App.Plain")));
        let err = resolve_binary(&registry, &nested, BinaryOp::Sub, &nested).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::NoApplicableOperator {
                op: "-".into(),
                operands: "operands of type 'App.Plain?' and 'App.Plain?'".into(),
            }
        );
    }

    #[test]
    fn unary_lifting() {
        let registry = registry();
        let nullable = param("n", DataType::nullable(DataType::bool()));
        assert_eq!(resolve_unary(&registry, UnaryOp::Not, &nullable).unwrap().ty(), DataType::bool());
        let err = resolve_unary(&registry, UnaryOp::Not, &param("s", DataType::string())).unwrap_err();
        assert!(matches!(err, ResolutionError::NoApplicableOperator { .. }));
    }
}
