//! Argument shaping: mapping positional and named arguments onto a
//! parameter list.
//!
//! Positional arguments fill parameters left to right. Named arguments may
//! only fill parameters after the last positional one, and every named
//! argument must be used. Remaining parameters take their default value or,
//! for the variadic tail, an empty sequence. Arguments beyond the parameter
//! count are only allowed with a variadic tail, which absorbs them later
//! during conversion.

use std::sync::Arc;

use dothtml_core::Constant;
use dothtml_registry::ParamEntry;

use crate::typed_expr::TypedExpr;

/// A call argument supplied by name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArgument {
    pub name: Arc<str>,
    pub value: TypedExpr,
}

impl NamedArgument {
    pub fn new(name: &str, value: TypedExpr) -> Self {
        Self {
            name: Arc::from(name),
            value,
        }
    }
}

/// What fills one parameter slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedArg {
    Value(TypedExpr),
    /// The parameter's declared default.
    Default(Constant),
    /// Variadic tail with no trailing arguments.
    EmptyParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedArguments {
    /// One entry per parameter.
    pub args: Vec<ShapedArg>,
    /// Parameters filled from defaults; each counts as a cast when ranking.
    pub defaults_used: u32,
}

/// Map arguments onto `params`, or `None` if they cannot fit.
pub fn shape_arguments(
    params: &[ParamEntry],
    positional: &[TypedExpr],
    named: &[NamedArgument],
) -> Option<ShapedArguments> {
    let has_params = params.last().is_some_and(|p| p.is_params);
    if !has_params && params.len() < positional.len() {
        return None;
    }

    let mut args: Vec<Option<ShapedArg>> = vec![None; params.len()];
    let mut copy_count = if has_params { params.len() } else { positional.len() };

    if has_params && params.len() > positional.len() {
        if let Some(last) = args.last_mut() {
            *last = Some(ShapedArg::EmptyParams);
        }
        copy_count -= 1;
    }

    if copy_count > positional.len() {
        let defaults = params[positional.len()..]
            .iter()
            .filter(|p| p.default.is_some())
            .count();
        if defaults + positional.len() < copy_count {
            return None;
        }
        copy_count = positional.len();
    }

    for (slot, value) in args.iter_mut().zip(&positional[..copy_count]) {
        *slot = Some(ShapedArg::Value(value.clone()));
    }

    let mut defaults_used = 0;
    let mut named_used = 0;
    for (i, param) in params.iter().enumerate().skip(positional.len()) {
        if let Some(arg) = named.iter().find(|n| n.name == param.name) {
            args[i] = Some(ShapedArg::Value(arg.value.clone()));
            named_used += 1;
        } else if let Some(default) = &param.default {
            args[i] = Some(ShapedArg::Default(default.clone()));
            defaults_used += 1;
        } else if param.is_params {
            break;
        } else {
            return None;
        }
    }

    if named_used != named.len() {
        return None;
    }

    let args = args.into_iter().collect::<Option<Vec<_>>>()?;
    Some(ShapedArguments { args, defaults_used })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_core::DataType;

    fn int_param(name: &str) -> ParamEntry {
        ParamEntry::new(name, DataType::int32())
    }

    fn int_arg(value: i32) -> TypedExpr {
        TypedExpr::constant(Constant::Int(value))
    }

    fn params_tail() -> ParamEntry {
        ParamEntry::new("xs", DataType::array(DataType::int32())).params()
    }

    #[test]
    fn exact_positional() {
        let shaped = shape_arguments(&[int_param("a"), int_param("b")], &[int_arg(1), int_arg(2)], &[]).unwrap();
        assert_eq!(shaped.args.len(), 2);
        assert_eq!(shaped.defaults_used, 0);
    }

    #[test]
    fn too_many_arguments_without_params() {
        assert!(shape_arguments(&[int_param("a")], &[int_arg(1), int_arg(2)], &[]).is_none());
    }

    #[test]
    fn missing_argument_without_default() {
        assert!(shape_arguments(&[int_param("a"), int_param("b")], &[int_arg(1)], &[]).is_none());
    }

    #[test]
    fn named_fills_after_default() {
        // f(a, b = 5, c) called as f(1, c: 3)
        let params = [
            int_param("a"),
            int_param("b").with_default(Constant::Int(5)),
            int_param("c"),
        ];
        let shaped = shape_arguments(&params, &[int_arg(1)], &[NamedArgument::new("c", int_arg(3))]).unwrap();
        assert_eq!(shaped.args[1], ShapedArg::Default(Constant::Int(5)));
        assert_eq!(shaped.args[2], ShapedArg::Value(int_arg(3)));
        assert_eq!(shaped.defaults_used, 1);
    }

    #[test]
    fn unknown_named_argument_fails() {
        let params = [int_param("a"), int_param("b").with_default(Constant::Int(5))];
        assert!(shape_arguments(&params, &[int_arg(1)], &[NamedArgument::new("z", int_arg(3))]).is_none());
    }

    #[test]
    fn named_argument_cannot_refill_positional_slot() {
        let params = [int_param("a"), int_param("b").with_default(Constant::Int(5))];
        assert!(shape_arguments(&params, &[int_arg(1)], &[NamedArgument::new("a", int_arg(3))]).is_none());
    }

    #[test]
    fn empty_params_tail() {
        let shaped = shape_arguments(&[int_param("a"), params_tail()], &[int_arg(1)], &[]).unwrap();
        assert_eq!(shaped.args[1], ShapedArg::EmptyParams);
    }

    #[test]
    fn extra_arguments_left_for_params_tail() {
        let shaped = shape_arguments(&[params_tail()], &[int_arg(1), int_arg(2), int_arg(3)], &[]).unwrap();
        assert_eq!(shaped.args, vec![ShapedArg::Value(int_arg(1))]);
    }
}
