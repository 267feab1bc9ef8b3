//! Equality and ordering through interface methods.
//!
//! Used when neither the operator table nor a user-defined operator
//! applies to `==`, `!=` or a relational operator.

use dothtml_core::{DataType, ResolutionError, primitives};
use dothtml_registry::{MemberEntry, MethodEntry, TypeSystem};

use crate::conversion::implicit_conversion;
use crate::typed_expr::TypedExpr;

/// A `CompareTo` call ordering two operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// `a.CompareTo(b)`, returning `int`.
    pub call: TypedExpr,
    /// The call compares right to left; relational operators must be mirrored.
    pub swapped: bool,
}

fn implements(types: &dyn TypeSystem, ty: &DataType, interface: &DataType) -> bool {
    ty == interface || types.supertypes(ty).contains(interface)
}

/// The single-parameter instance method `name(param)` on `ty`.
fn find_method(types: &dyn TypeSystem, ty: &DataType, name: &str, param: &DataType) -> Option<MethodEntry> {
    types
        .lookup_members(ty, name, false)
        .into_iter()
        .find_map(|member| match member {
            MemberEntry::Method(method) if method.params.len() == 1 && method.params[0].ty == *param => Some(method),
            _ => None,
        })
}

fn instance_call(target: &TypedExpr, method: MethodEntry, arg: TypedExpr) -> TypedExpr {
    TypedExpr::Call {
        target: Some(Box::new(target.clone())),
        method,
        args: vec![arg],
    }
}

/// `left.Equals(right)` through `IEquatable<T>` on either side.
fn typed_equals(types: &dyn TypeSystem, left: &TypedExpr, right: &TypedExpr) -> Option<TypedExpr> {
    let (lt, rt) = (left.ty(), right.ty());
    let equatable = |arg: &DataType| DataType::generic(primitives::EQUATABLE_NAME, vec![arg.clone()]);
    if implements(types, &lt, &equatable(&rt))
        && let Some(method) = find_method(types, &lt, "Equals", &rt)
    {
        return Some(instance_call(left, method, right.clone()));
    }
    if implements(types, &rt, &equatable(&lt))
        && let Some(method) = find_method(types, &rt, "Equals", &lt)
    {
        return Some(instance_call(right, method, left.clone()));
    }
    None
}

/// Build an equality test for two operands with no equality operator.
///
/// Prefers `IEquatable<T>` on either operand, then value-type equality
/// after converting one operand to the other's type, then `object.Equals`.
pub fn equals_method(types: &dyn TypeSystem, left: &TypedExpr, right: &TypedExpr) -> Option<TypedExpr> {
    let (lt, rt) = (left.ty(), right.ty());
    if matches!(lt, DataType::Unknown | DataType::Void) || matches!(rt, DataType::Unknown | DataType::Void) {
        return None;
    }

    if let Some(call) = typed_equals(types, left, right) {
        return Some(call);
    }

    if types.is_value_type(&lt)
        && let Some(converted) = implicit_conversion(types, right.clone(), &lt, false)
        && let Some(call) = typed_equals(types, left, &converted)
    {
        return Some(call);
    }
    if types.is_value_type(&rt)
        && let Some(converted) = implicit_conversion(types, left.clone(), &rt, false)
        && let Some(call) = typed_equals(types, &converted, right)
    {
        return Some(call);
    }

    if !left.is_value() || left.is_null_literal() {
        return None;
    }
    let object = DataType::object();
    let method = find_method(types, &object, "Equals", &object)?;
    let arg = implicit_conversion(types, right.clone(), &object, false)?;
    Some(instance_call(left, method, arg))
}

fn compare_one_way(types: &dyn TypeSystem, left: &TypedExpr, right: &TypedExpr) -> Option<TypedExpr> {
    let (lt, rt) = (left.ty(), right.ty());
    if !left.is_value() || left.is_null_literal() {
        return None;
    }

    let generic = DataType::generic(primitives::COMPARABLE_GENERIC_NAME, vec![rt.clone()]);
    if implements(types, &lt, &generic)
        && let Some(method) = find_method(types, &lt, "CompareTo", &rt)
    {
        return Some(instance_call(left, method, right.clone()));
    }

    let untyped = DataType::named(primitives::COMPARABLE_NAME);
    let object = DataType::object();
    if implements(types, &lt, &untyped)
        && let Some(method) = find_method(types, &lt, "CompareTo", &object)
        && let Some(arg) = implicit_conversion(types, right.clone(), &object, false)
    {
        return Some(instance_call(left, method, arg));
    }
    None
}

/// Build a `CompareTo` call ordering `left` against `right`.
///
/// Tries `IComparable<T>` then `IComparable` on the left operand, then the
/// same on the right with the result marked as swapped.
pub fn resolve_comparison(
    types: &dyn TypeSystem,
    left: &TypedExpr,
    right: &TypedExpr,
) -> Result<Comparison, ResolutionError> {
    if let Some(call) = compare_one_way(types, left, right) {
        return Ok(Comparison { call, swapped: false });
    }
    if let Some(call) = compare_one_way(types, right, left) {
        return Ok(Comparison { call, swapped: true });
    }
    Err(ResolutionError::ComparisonNotSupported {
        left: left.ty().to_string(),
        right: right.ty().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_core::Constant;
    use dothtml_registry::{MethodBuilder, TypeBuilder, TypeRegistry};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_primitives();
        let money = DataType::named("App.Money");
        registry
            .register_type(
                TypeBuilder::new("App.Money", "App")
                    .value_type()
                    .base(DataType::generic(primitives::EQUATABLE_NAME, vec![money.clone()]))
                    .base(DataType::generic(primitives::COMPARABLE_GENERIC_NAME, vec![money.clone()]))
                    .base(DataType::named(primitives::COMPARABLE_NAME))
                    .method(MethodBuilder::new("Equals", DataType::bool()).param("other", money.clone()))
                    .method(MethodBuilder::new("CompareTo", DataType::int32()).param("other", money))
                    .build(),
            )
            .unwrap();
        registry
            .register_type(TypeBuilder::new("App.Plain", "App").build())
            .unwrap();
        registry
    }

    fn param(name: &str, ty: DataType) -> TypedExpr {
        TypedExpr::parameter(name, ty)
    }

    fn called_method(expr: &TypedExpr) -> (&str, String) {
        match expr {
            TypedExpr::Call { method, .. } => (&method.name, method.declaring.to_string()),
            other => panic!("expected call, got {other}"),
        }
    }

    #[test]
    fn typed_equality_is_preferred() {
        let registry = registry();
        let money = DataType::named("App.Money");
        let call = equals_method(&registry, &param("a", money.clone()), &param("b", money)).unwrap();
        assert_eq!(called_method(&call), ("Equals", "App.Money".to_string()));
    }

    #[test]
    fn value_equality_through_conversion() {
        let registry = registry();
        let long = param("a", DataType::int64());
        let int = TypedExpr::constant(Constant::Int(1));
        let call = equals_method(&registry, &long, &int).unwrap();
        let TypedExpr::Call { args, method, .. } = &call else {
            panic!("expected call");
        };
        assert_eq!(args[0].ty(), DataType::int64());
        assert_eq!(method.params[0].ty, DataType::int64());
    }

    #[test]
    fn object_equals_fallback() {
        let registry = registry();
        let plain = DataType::named("App.Plain");
        let call = equals_method(&registry, &param("a", plain.clone()), &param("b", plain)).unwrap();
        assert_eq!(called_method(&call), ("Equals", "object".to_string()));
    }

    #[test]
    fn comparison_through_generic_interface() {
        let registry = registry();
        let money = DataType::named("App.Money");
        let comparison = resolve_comparison(&registry, &param("a", money.clone()), &param("b", money)).unwrap();
        assert!(!comparison.swapped);
        assert_eq!(comparison.call.ty(), DataType::int32());
    }

    #[test]
    fn comparison_from_the_right_is_swapped() {
        let registry = registry();
        let money = DataType::named("App.Money");
        let plain = param("a", DataType::named("App.Plain"));
        let comparison = resolve_comparison(&registry, &plain, &param("b", money)).unwrap();
        assert!(comparison.swapped);
    }

    #[test]
    fn comparison_not_supported() {
        let registry = registry();
        let plain = DataType::named("App.Plain");
        let err = resolve_comparison(&registry, &param("a", plain.clone()), &param("b", plain)).unwrap_err();
        assert!(matches!(err, ResolutionError::ComparisonNotSupported { .. }));
    }
}
