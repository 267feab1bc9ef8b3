//! Overload resolution for method calls.
//!
//! ## Algorithm
//!
//! 1. Collect methods named on the target (static or instance)
//! 2. Shape positional and named arguments onto each candidate's parameters
//! 3. Substitute explicit type arguments and infer the rest
//! 4. Convert every argument implicitly, counting representation changes as casts
//! 5. Rank survivors by (casts, inferred generic arguments, variadic)
//! 6. With no survivor on an instance target, retry against extension
//!    methods with the target prepended as the first argument
//!
//! A candidate that does not fit is dropped with `None`; only the final
//! outcome (nothing applicable, or a tie) is an error.

mod inference;
mod ranking;
mod shaping;

pub use inference::{InferredArgs, infer_type_args};
pub use ranking::find_best_match;
pub use shaping::{NamedArgument, ShapedArg, ShapedArguments, shape_arguments};

use dothtml_core::{DataType, ParamOwner, ResolutionError};
use dothtml_registry::{MemberEntry, MethodEntry, TypeSystem};
use tracing::{debug, trace};

use crate::conversion::{find_conversion, implicit_conversion};
use crate::typed_expr::TypedExpr;

/// An applicable overload with its arguments converted to parameter types.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The method, closed over inferred and explicit type arguments.
    pub method: MethodEntry,
    /// One converted argument per parameter; for extensions the receiver is first.
    pub args: Vec<TypedExpr>,
    pub cast_count: u32,
    pub inferred_count: u32,
    /// Whether the method has a variadic tail.
    pub is_params: bool,
    pub is_extension: bool,
}

impl Candidate {
    /// Ordering key; lower is better.
    pub fn rank_key(&self) -> (u32, u32, bool) {
        (self.cast_count, self.inferred_count, self.is_params)
    }

    /// `Declaring.Name(param types)` for diagnostics.
    pub fn describe(&self) -> String {
        let params: Vec<String> = self.method.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{}.{}({})", self.method.declaring, self.method.name, params.join(", "))
    }
}

/// Try one method against the call's arguments.
pub fn try_candidate(
    types: &dyn TypeSystem,
    method: &MethodEntry,
    type_args: &[DataType],
    positional: &[TypedExpr],
    named: &[NamedArgument],
) -> Option<Candidate> {
    let shaped = shape_arguments(&method.params, positional, named)?;
    let is_params = method.params_index().is_some();

    let mut method = method.clone();
    let mut inferred_count = 0;
    if method.is_generic() {
        let mut param_types: Vec<DataType> = method.params.iter().map(|p| p.ty.clone()).collect();
        if let Some(last) = param_types.last_mut()
            && is_params
            && let Some(element) = last.element_type().cloned()
        {
            *last = element;
        }
        let arg_types: Vec<DataType> = shaped
            .args
            .iter()
            .map(|arg| match arg {
                ShapedArg::Value(value) => value.ty(),
                ShapedArg::Default(_) | ShapedArg::EmptyParams => DataType::Unknown,
            })
            .collect();
        let inferred = infer_type_args(types, method.type_params.len(), type_args, &param_types, &arg_types)?;
        inferred_count = inferred.inferred;
        method = close_method(&method, &inferred.args);
    } else if !type_args.is_empty() {
        return None;
    }

    let mut cast_count = shaped.defaults_used;
    let mut args = Vec::with_capacity(shaped.args.len());
    let last_index = shaped.args.len().saturating_sub(1);
    for (i, (shaped_arg, param)) in shaped.args.into_iter().zip(&method.params).enumerate() {
        let element = param.ty.element_type().cloned().unwrap_or(DataType::Unknown);
        let arg = match shaped_arg {
            ShapedArg::Default(value) => TypedExpr::Constant {
                value,
                ty: param.ty.clone(),
            },
            ShapedArg::EmptyParams => TypedExpr::NewArray {
                element,
                items: Vec::new(),
            },
            ShapedArg::Value(value) => {
                let wraps = is_params
                    && i == last_index
                    && i < positional.len()
                    && needs_params_wrap(types, &value, &param.ty, positional.len(), method.params.len());
                if wraps {
                    let mut items = Vec::with_capacity(positional.len() - i);
                    for item in &positional[i..] {
                        let converted = implicit_conversion(types, item.clone(), &element, false)?;
                        if converted != *item {
                            cast_count += 1;
                        }
                        items.push(converted);
                    }
                    TypedExpr::NewArray { element, items }
                } else {
                    let converted = implicit_conversion(types, value.clone(), &param.ty, false)?;
                    if converted != value {
                        cast_count += 1;
                    }
                    converted
                }
            }
        };
        args.push(arg);
    }

    Some(Candidate {
        method,
        args,
        cast_count,
        inferred_count,
        is_params,
        is_extension: false,
    })
}

/// A variadic argument passes through only when it is the last positional
/// argument and already converts to the array type.
fn needs_params_wrap(
    types: &dyn TypeSystem,
    value: &TypedExpr,
    param_ty: &DataType,
    positional_count: usize,
    param_count: usize,
) -> bool {
    if positional_count != param_count {
        return true;
    }
    let ty = value.ty();
    let array_like = matches!(ty, DataType::Array(_) | DataType::Null);
    !(array_like && find_conversion(types, &ty, param_ty).is_some())
}

fn close_method(method: &MethodEntry, args: &[DataType]) -> MethodEntry {
    let mut closed = method.clone();
    for param in &mut closed.params {
        param.ty = param.ty.substitute(ParamOwner::Method, args);
    }
    closed.return_type = closed.return_type.substitute(ParamOwner::Method, args);
    closed
}

fn describe_args(positional: &[TypedExpr], named: &[NamedArgument]) -> String {
    positional
        .iter()
        .map(|a| a.ty().to_string())
        .chain(named.iter().map(|n| format!("{}: {}", n.name, n.value.ty())))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn viable_candidates<'a>(
    types: &dyn TypeSystem,
    methods: impl IntoIterator<Item = &'a MethodEntry>,
    type_args: &[DataType],
    positional: &[TypedExpr],
    named: &[NamedArgument],
) -> Vec<Candidate> {
    methods
        .into_iter()
        .filter_map(|method| {
            let candidate = try_candidate(types, method, type_args, positional, named);
            if candidate.is_none() {
                trace!(method = %method.name, declaring = %method.declaring, "candidate rejected");
            }
            candidate
        })
        .collect()
}

/// Select the overload of `name` on `receiver` for the given arguments.
///
/// `receiver` is a value for instance calls or a
/// [`TypedExpr::StaticTypeReference`] for static calls.
pub fn find_valid_overload(
    types: &dyn TypeSystem,
    receiver: &TypedExpr,
    name: &str,
    type_args: &[DataType],
    positional: &[TypedExpr],
    named: &[NamedArgument],
) -> Result<Candidate, ResolutionError> {
    let ty = receiver.ty();
    let is_static = matches!(receiver, TypedExpr::StaticTypeReference(_));

    let methods: Vec<MethodEntry> = types
        .lookup_members(&ty, name, is_static)
        .into_iter()
        .filter_map(|member| match member {
            MemberEntry::Method(method) => Some(method),
            _ => None,
        })
        .collect();
    let viable = viable_candidates(types, &methods, type_args, positional, named);
    if !viable.is_empty() {
        return find_best_match(name, viable);
    }

    if !is_static {
        let extensions = types.lookup_extensions(&ty, name);
        let mut extended_args = Vec::with_capacity(positional.len() + 1);
        extended_args.push(receiver.clone());
        extended_args.extend_from_slice(positional);
        let mut viable = viable_candidates(types, &extensions, type_args, &extended_args, named);
        for candidate in &mut viable {
            candidate.is_extension = true;
        }
        if !viable.is_empty() {
            debug!(method = name, "resolved through extension methods");
            return find_best_match(name, viable);
        }
    }

    Err(ResolutionError::NoApplicableOverload {
        name: name.to_string(),
        args: describe_args(positional, named),
    })
}

/// Resolve a method call and build the call expression.
///
/// Extension methods become static calls with the receiver prepended.
pub fn resolve_method_call(
    types: &dyn TypeSystem,
    receiver: &TypedExpr,
    name: &str,
    type_args: &[DataType],
    positional: &[TypedExpr],
    named: &[NamedArgument],
) -> Result<TypedExpr, ResolutionError> {
    let candidate = find_valid_overload(types, receiver, name, type_args, positional, named)?;
    let is_static = candidate.is_extension || candidate.method.is_static;
    Ok(TypedExpr::Call {
        target: (!is_static).then(|| Box::new(receiver.clone())),
        method: candidate.method,
        args: candidate.args,
    })
}

/// Call `target`, which must be a method group.
pub fn resolve_call(
    types: &dyn TypeSystem,
    target: &TypedExpr,
    positional: &[TypedExpr],
    named: &[NamedArgument],
) -> Result<TypedExpr, ResolutionError> {
    match target {
        TypedExpr::MethodGroup(group) => {
            resolve_method_call(types, &group.target, &group.name, &group.type_args, positional, named)
        }
        other => Err(ResolutionError::NotCallable {
            expr: other.to_string(),
            type_name: other.ty().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_core::Constant;
    use dothtml_registry::{MethodBuilder, TypeBuilder, TypeRegistry};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_primitives();
        registry
            .register_type(
                TypeBuilder::new("App.Calc", "App")
                    .method(MethodBuilder::new("F", DataType::string()).param("x", DataType::int32()))
                    .method(MethodBuilder::new("F", DataType::string()).param("x", DataType::int64()))
                    .method(MethodBuilder::new("Sum", DataType::int32()).params_tail("xs", DataType::int32()))
                    .method(
                        MethodBuilder::new("Make", DataType::method_param(0, "T"))
                            .generic(&["T"])
                            .param("value", DataType::method_param(0, "T")),
                    )
                    .method(
                        MethodBuilder::new("Pad", DataType::string())
                            .param("text", DataType::string())
                            .default_param("width", DataType::int32(), Constant::Int(10))
                            .param("fill", DataType::char()),
                    )
                    .build(),
            )
            .unwrap();
        registry
    }

    fn calc() -> TypedExpr {
        TypedExpr::parameter("_this", DataType::named("App.Calc"))
    }

    fn int(value: i32) -> TypedExpr {
        TypedExpr::constant(Constant::Int(value))
    }

    #[test]
    fn exact_match_beats_widening() {
        let registry = registry();
        let best = find_valid_overload(&registry, &calc(), "F", &[], &[int(1)], &[]).unwrap();
        assert_eq!(best.method.params[0].ty, DataType::int32());
        assert_eq!(best.cast_count, 0);
    }

    #[test]
    fn narrowing_is_not_implicit() {
        let registry = registry();
        let long = TypedExpr::constant(Constant::Long(1));
        let best = find_valid_overload(&registry, &calc(), "F", &[], &[long], &[]).unwrap();
        assert_eq!(best.method.params[0].ty, DataType::int64());
        assert_eq!(best.cast_count, 0);
    }

    #[test]
    fn widening_counts_a_cast() {
        let registry = registry();
        let ch = TypedExpr::constant(Constant::Char('a'));
        let err = find_valid_overload(&registry, &calc(), "F", &[], &[ch], &[]).unwrap_err();
        // char widens to both int and long at one cast each
        assert!(matches!(err, ResolutionError::AmbiguousOverload { .. }));
    }

    #[test]
    fn resolution_is_deterministic() {
        let registry = registry();
        let first = find_valid_overload(&registry, &calc(), "F", &[], &[int(1)], &[]).unwrap();
        let second = find_valid_overload(&registry, &calc(), "F", &[], &[int(1)], &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn params_with_no_trailing_arguments() {
        let registry = registry();
        let best = find_valid_overload(&registry, &calc(), "Sum", &[], &[], &[]).unwrap();
        assert!(matches!(&best.args[0], TypedExpr::NewArray { items, .. } if items.is_empty()));
    }

    #[test]
    fn params_with_three_trailing_arguments() {
        let registry = registry();
        let best = find_valid_overload(&registry, &calc(), "Sum", &[], &[int(1), int(2), int(3)], &[]).unwrap();
        assert!(matches!(&best.args[0], TypedExpr::NewArray { items, .. } if items.len() == 3));
    }

    #[test]
    fn params_with_array_passes_through() {
        let registry = registry();
        let array = TypedExpr::parameter("xs", DataType::array(DataType::int32()));
        let best = find_valid_overload(&registry, &calc(), "Sum", &[], &[array.clone()], &[]).unwrap();
        assert_eq!(best.args[0], array);
    }

    #[test]
    fn generic_inference() {
        let registry = registry();
        let text = TypedExpr::constant(Constant::string("a"));
        let best = find_valid_overload(&registry, &calc(), "Make", &[], &[text], &[]).unwrap();
        assert_eq!(best.method.return_type, DataType::string());
        assert_eq!(best.inferred_count, 1);
    }

    #[test]
    fn explicit_type_argument_on_non_generic_rejects() {
        let registry = registry();
        let err = find_valid_overload(&registry, &calc(), "Sum", &[DataType::int32()], &[int(1)], &[]).unwrap_err();
        assert!(matches!(err, ResolutionError::NoApplicableOverload { .. }));
    }

    #[test]
    fn default_then_named() {
        let registry = registry();
        let text = TypedExpr::constant(Constant::string("a"));
        let fill = TypedExpr::constant(Constant::Char('.'));
        let best = find_valid_overload(&registry, &calc(), "Pad", &[], &[text], &[NamedArgument::new("fill", fill.clone())])
            .unwrap();
        assert_eq!(best.args[1], TypedExpr::Constant { value: Constant::Int(10), ty: DataType::int32() });
        assert_eq!(best.args[2], fill);
    }

    #[test]
    fn extension_call_prepends_receiver() {
        let registry = registry();
        let items = TypedExpr::parameter("items", DataType::array(DataType::string()));
        let call = resolve_method_call(&registry, &items, "Any", &[], &[], &[]).unwrap();
        let TypedExpr::Call { target, args, method } = call else {
            panic!("expected call");
        };
        assert!(target.is_none());
        assert_eq!(args.len(), 1);
        assert_eq!(method.return_type, DataType::bool());
    }

    #[test]
    fn calling_a_value_is_not_supported() {
        let registry = registry();
        let err = resolve_call(&registry, &int(1), &[], &[]).unwrap_err();
        assert!(matches!(err, ResolutionError::NotCallable { .. }));
    }
}
