//! Generic argument inference for method calls.
//!
//! Explicit type arguments are taken positionally; each remaining method
//! type parameter is inferred from the first parameter whose declared type
//! mentions it, matching the argument's type structurally one level at a
//! time (array element, nullable inner type, generic arguments).

use dothtml_core::{DataType, ParamOwner};
use dothtml_registry::TypeSystem;

/// Result of inference: the full argument list and how many were inferred.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredArgs {
    pub args: Vec<DataType>,
    pub inferred: u32,
}

/// Infer the type arguments of a method with `type_param_count` generic
/// parameters.
///
/// `param_types` and `arg_types` are aligned; an argument of
/// [`DataType::Unknown`] carries no information (defaults, empty variadic
/// tails). Returns `None` if too many explicit arguments are given or a
/// parameter cannot be inferred.
pub fn infer_type_args(
    types: &dyn TypeSystem,
    type_param_count: usize,
    explicit: &[DataType],
    param_types: &[DataType],
    arg_types: &[DataType],
) -> Option<InferredArgs> {
    if explicit.len() > type_param_count {
        return None;
    }

    let mut args = Vec::with_capacity(type_param_count);
    let mut inferred = 0;
    for position in 0..type_param_count {
        if let Some(ty) = explicit.get(position) {
            args.push(ty.clone());
            continue;
        }
        let found = find_generic_parameter_type(types, position as u16, param_types, arg_types)?;
        inferred += 1;
        args.push(found);
    }
    Some(InferredArgs { args, inferred })
}

fn is_target(ty: &DataType, index: u16) -> bool {
    matches!(ty, DataType::Param(p) if p.owner == ParamOwner::Method && p.index == index)
}

fn find_generic_parameter_type(
    types: &dyn TypeSystem,
    index: u16,
    searched: &[DataType],
    expressions: &[DataType],
) -> Option<DataType> {
    for (declared, actual) in searched.iter().zip(expressions) {
        if matches!(actual, DataType::Unknown | DataType::Null) {
            continue;
        }
        if let Some(found) = match_one(types, index, declared, actual) {
            return Some(found);
        }
    }
    None
}

fn match_one(types: &dyn TypeSystem, index: u16, declared: &DataType, actual: &DataType) -> Option<DataType> {
    if is_target(declared, index) {
        return Some(actual.clone());
    }
    match declared {
        DataType::Array(element) => {
            let actual_element = actual.element_type()?;
            match_one(types, index, element, actual_element)
        }
        DataType::Nullable(inner) => {
            let actual_inner = actual.nullable_inner()?;
            match_one(types, index, inner, actual_inner)
        }
        DataType::Named(named) if !named.args.is_empty() => {
            let actual_args = constructed_args(types, declared, actual)?;
            find_generic_parameter_type(types, index, &named.args, &actual_args)
        }
        _ => None,
    }
}

/// Generic arguments of `actual` viewed as an instance of `declared`'s
/// definition, looking through its supertypes (`List<int>` as
/// `IEnumerable<int>`, `int[]` as `IEnumerable<int>`).
fn constructed_args(types: &dyn TypeSystem, declared: &DataType, actual: &DataType) -> Option<Vec<DataType>> {
    let definition = declared.definition()?;
    if actual.definition() == Some(definition) {
        return Some(actual.generic_args().to_vec());
    }
    types
        .supertypes(actual)
        .into_iter()
        .find(|base| base.definition() == Some(definition))
        .map(|base| base.generic_args().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_registry::TypeRegistry;

    fn t() -> DataType {
        DataType::method_param(0, "T")
    }

    fn list_of(ty: DataType) -> DataType {
        DataType::generic("System.Collections.Generic.List`1", vec![ty])
    }

    #[test]
    fn direct_parameter() {
        let registry = TypeRegistry::with_primitives();
        let result = infer_type_args(&registry, 1, &[], &[t()], &[DataType::string()]).unwrap();
        assert_eq!(result.args, vec![DataType::string()]);
        assert_eq!(result.inferred, 1);
    }

    #[test]
    fn explicit_arguments_are_not_counted() {
        let registry = TypeRegistry::with_primitives();
        let result = infer_type_args(&registry, 1, &[DataType::int64()], &[t()], &[DataType::int32()]).unwrap();
        assert_eq!(result.args, vec![DataType::int64()]);
        assert_eq!(result.inferred, 0);
    }

    #[test]
    fn too_many_explicit_arguments() {
        let registry = TypeRegistry::with_primitives();
        assert!(infer_type_args(&registry, 0, &[DataType::int32()], &[], &[]).is_none());
    }

    #[test]
    fn through_array_element() {
        let registry = TypeRegistry::with_primitives();
        let result = infer_type_args(
            &registry,
            1,
            &[],
            &[DataType::array(t())],
            &[DataType::array(DataType::double())],
        )
        .unwrap();
        assert_eq!(result.args, vec![DataType::double()]);
    }

    #[test]
    fn through_implemented_interface() {
        let registry = TypeRegistry::with_primitives();
        let declared = DataType::enumerable(t());
        let from_list = infer_type_args(&registry, 1, &[], &[declared.clone()], &[list_of(DataType::int32())]).unwrap();
        assert_eq!(from_list.args, vec![DataType::int32()]);
        let from_array = infer_type_args(&registry, 1, &[], &[declared], &[DataType::array(DataType::string())]).unwrap();
        assert_eq!(from_array.args, vec![DataType::string()]);
    }

    #[test]
    fn unrelated_argument_fails() {
        let registry = TypeRegistry::with_primitives();
        assert!(infer_type_args(&registry, 1, &[], &[DataType::enumerable(t())], &[DataType::int32()]).is_none());
    }

    #[test]
    fn null_argument_gives_no_information() {
        let registry = TypeRegistry::with_primitives();
        assert!(infer_type_args(&registry, 1, &[], &[t()], &[DataType::Null]).is_none());
    }
}
