//! Member resolution on typed expressions.
//!
//! ## Lookup order
//!
//! 1. Bindable objects: the capability property registry (non-generic lookups only)
//! 2. Ordinary members, static or instance depending on the target
//! 3. Extension methods whose first parameter accepts the target
//!
//! One property or field yields an access node, one nested type yields a
//! static type reference, and anything else becomes a method group that a
//! call site resolves later.

use std::sync::Arc;

use dothtml_core::{DataType, ResolutionError};
use dothtml_registry::{MemberEntry, TypeSystem};
use tracing::trace;

use crate::conversion::implicit_conversion;
use crate::typed_expr::{MethodGroup, TypedExpr};

/// Resolve `name` on `target`.
///
/// With `strict`, a missing member or an unresolved target type is an
/// error; otherwise it is `Ok(None)`.
pub fn resolve_member(
    types: &dyn TypeSystem,
    target: &TypedExpr,
    name: &str,
    type_args: &[DataType],
    strict: bool,
) -> Result<Option<TypedExpr>, ResolutionError> {
    if let TypedExpr::MethodGroup(group) = target {
        return Err(ResolutionError::MemberAccessOnMethodGroup {
            member: name.to_string(),
            group: group.name.to_string(),
        });
    }

    let ty = target.ty();
    if ty.is_unknown() {
        if strict {
            return Err(ResolutionError::UnresolvedType {
                expr: target.to_string(),
            });
        }
        return Ok(None);
    }

    let is_static = matches!(target, TypedExpr::StaticTypeReference(_));
    let is_generic = !type_args.is_empty();

    if !is_generic
        && !is_static
        && let Some(property) = types.capability_property(&ty, name)
    {
        trace!(member = name, ty = %ty, "resolved through capability registry");
        return Ok(Some(TypedExpr::CapabilityGet {
            target: Box::new(target.clone()),
            property,
        }));
    }

    let mut members: Vec<MemberEntry> = types
        .lookup_members(&ty, name, is_static)
        .into_iter()
        .filter(|m| !(is_generic && matches!(m, MemberEntry::NestedType(_))))
        .collect();
    if is_generic {
        let generic_name = format!("{name}`{}", type_args.len());
        members.extend(
            types
                .lookup_members(&ty, &generic_name, is_static)
                .into_iter()
                .filter(|m| matches!(m, MemberEntry::NestedType(_))),
        );
    }

    if members.is_empty() {
        members = types
            .lookup_extensions(&ty, name)
            .into_iter()
            .map(MemberEntry::Method)
            .collect();
    }

    if members.is_empty() {
        if strict {
            return Err(ResolutionError::MemberNotFound {
                member: name.to_string(),
                type_name: ty.to_string(),
                is_static,
            });
        }
        return Ok(None);
    }

    if let [single] = members.as_slice() {
        match single {
            MemberEntry::Property(property) => {
                return Ok(Some(TypedExpr::MemberAccess {
                    target: (!is_static).then(|| Box::new(target.clone())),
                    member: property.clone(),
                }));
            }
            MemberEntry::NestedType(nested) => {
                let nested = match nested {
                    DataType::Named(named) if is_generic => DataType::generic(&named.name, type_args.to_vec()),
                    other => other.clone(),
                };
                return Ok(Some(TypedExpr::StaticTypeReference(nested)));
            }
            MemberEntry::Method(_) => {}
        }
    }

    Ok(Some(TypedExpr::MethodGroup(MethodGroup {
        name: Arc::from(name),
        target: Box::new(target.clone()),
        type_args: type_args.to_vec(),
    })))
}

/// Build an expression storing `value` into `node`.
///
/// Writable properties, fields, parameters and indexers become an
/// assignment; a capability-property read becomes a capability-property
/// write. Anything else is not assignable and yields `Ok(None)`.
pub fn update_member(
    types: &dyn TypeSystem,
    node: &TypedExpr,
    value: TypedExpr,
) -> Result<Option<TypedExpr>, ResolutionError> {
    let assignable = match node {
        TypedExpr::MemberAccess { member, .. } => member.writable,
        TypedExpr::Parameter { .. } => true,
        TypedExpr::Index { indexer, .. } => indexer.as_ref().is_none_or(|i| i.writable),
        _ => false,
    };
    if assignable {
        let target_ty = node.ty();
        let value = convert_for_store(types, value, &target_ty)?;
        return Ok(Some(TypedExpr::Assign {
            target: Box::new(node.clone()),
            value: Box::new(value),
        }));
    }

    if let TypedExpr::CapabilityGet { target, property } = node.unwrap_converts() {
        let value = convert_for_store(types, value, &property.ty)?;
        return Ok(Some(TypedExpr::CapabilitySet {
            target: target.clone(),
            property: property.clone(),
            value: Box::new(value),
        }));
    }

    Ok(None)
}

fn convert_for_store(types: &dyn TypeSystem, value: TypedExpr, to: &DataType) -> Result<TypedExpr, ResolutionError> {
    let from = value.ty();
    implicit_conversion(types, value, to, true).ok_or_else(|| ResolutionError::NoImplicitConversion {
        from: from.to_string(),
        to: to.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_core::Constant;
    use dothtml_registry::{MarkupOptions, MethodBuilder, TypeBuilder, TypeRegistry};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_primitives();
        registry
            .register_type(
                TypeBuilder::new("App.Customer", "App")
                    .property("Name", DataType::string())
                    .readonly_property("Id", DataType::int32())
                    .static_property("Default", DataType::named("App.Customer"))
                    .nested("Address")
                    .method(MethodBuilder::new("Greet", DataType::string()))
                    .method(MethodBuilder::new("Greet", DataType::string()).param("name", DataType::string()))
                    .build(),
            )
            .unwrap();
        registry
            .register_type(
                TypeBuilder::new("App.Widget", "App")
                    .bindable()
                    .capability("Text", DataType::string(), MarkupOptions::default())
                    .build(),
            )
            .unwrap();
        registry
    }

    fn this(ty: &str) -> TypedExpr {
        TypedExpr::parameter("_this", DataType::named(ty))
    }

    #[test]
    fn property_access() {
        let registry = registry();
        let result = resolve_member(&registry, &this("App.Customer"), "Name", &[], true)
            .unwrap()
            .unwrap();
        assert_eq!(result.ty(), DataType::string());
        assert!(matches!(result, TypedExpr::MemberAccess { target: Some(_), .. }));
    }

    #[test]
    fn static_member_needs_type_reference() {
        let registry = registry();
        let err = resolve_member(&registry, &this("App.Customer"), "Default", &[], true).unwrap_err();
        assert!(matches!(err, ResolutionError::MemberNotFound { is_static: false, .. }));

        let type_ref = TypedExpr::StaticTypeReference(DataType::named("App.Customer"));
        let result = resolve_member(&registry, &type_ref, "Default", &[], true).unwrap().unwrap();
        assert!(matches!(result, TypedExpr::MemberAccess { target: None, .. }));
    }

    #[test]
    fn nested_type_is_static_reference() {
        let registry = registry();
        let type_ref = TypedExpr::StaticTypeReference(DataType::named("App.Customer"));
        let result = resolve_member(&registry, &type_ref, "Address", &[], true).unwrap().unwrap();
        assert_eq!(
            result,
            TypedExpr::StaticTypeReference(DataType::named("App.Customer+Address"))
        );
    }

    #[test]
    fn overloads_become_method_group() {
        let registry = registry();
        let result = resolve_member(&registry, &this("App.Customer"), "Greet", &[], true)
            .unwrap()
            .unwrap();
        assert!(matches!(result, TypedExpr::MethodGroup(ref g) if &*g.name == "Greet"));
    }

    #[test]
    fn extension_fallback() {
        let registry = registry();
        let list = TypedExpr::parameter("items", DataType::array(DataType::int32()));
        let result = resolve_member(&registry, &list, "Any", &[], true).unwrap().unwrap();
        assert!(matches!(result, TypedExpr::MethodGroup(_)));
    }

    #[test]
    fn extension_fallback_on_type_reference() {
        let mut registry = registry();
        registry
            .register_type(
                TypeBuilder::new("App.CustomerExtensions", "App")
                    .extension(
                        MethodBuilder::new("Describe", DataType::string()).param("customer", DataType::named("App.Customer")),
                    )
                    .build(),
            )
            .unwrap();
        let type_ref = TypedExpr::StaticTypeReference(DataType::named("App.Customer"));
        let result = resolve_member(&registry, &type_ref, "Describe", &[], true).unwrap().unwrap();
        assert!(matches!(result, TypedExpr::MethodGroup(ref g) if &*g.name == "Describe"));
    }

    #[test]
    fn missing_member_strict_and_lenient() {
        let registry = registry();
        assert!(resolve_member(&registry, &this("App.Customer"), "Nope", &[], false).unwrap().is_none());
        assert!(matches!(
            resolve_member(&registry, &this("App.Customer"), "Nope", &[], true),
            Err(ResolutionError::MemberNotFound { .. })
        ));
    }

    #[test]
    fn unknown_target_type() {
        let registry = registry();
        let err = resolve_member(&registry, &TypedExpr::UnknownType, "X", &[], true).unwrap_err();
        assert!(matches!(err, ResolutionError::UnresolvedType { .. }));
    }

    #[test]
    fn member_on_method_group_is_rejected() {
        let registry = registry();
        let group = resolve_member(&registry, &this("App.Customer"), "Greet", &[], true)
            .unwrap()
            .unwrap();
        let err = resolve_member(&registry, &group, "Length", &[], true).unwrap_err();
        assert!(matches!(err, ResolutionError::MemberAccessOnMethodGroup { .. }));
    }

    #[test]
    fn capability_property_read_and_write() {
        let registry = registry();
        let widget = this("App.Widget");
        let read = resolve_member(&registry, &widget, "Text", &[], true).unwrap().unwrap();
        assert!(matches!(read, TypedExpr::CapabilityGet { .. }));

        let write = update_member(&registry, &read, TypedExpr::constant(Constant::string("x")))
            .unwrap()
            .unwrap();
        assert!(matches!(write, TypedExpr::CapabilitySet { .. }));
    }

    #[test]
    fn update_readonly_property_is_none() {
        let registry = registry();
        let id = resolve_member(&registry, &this("App.Customer"), "Id", &[], true).unwrap().unwrap();
        assert!(update_member(&registry, &id, TypedExpr::constant(Constant::Int(1))).unwrap().is_none());

        let name = resolve_member(&registry, &this("App.Customer"), "Name", &[], true).unwrap().unwrap();
        let assign = update_member(&registry, &name, TypedExpr::constant(Constant::Int(1))).unwrap().unwrap();
        // int converts to string through ToString() for stores
        assert!(matches!(assign, TypedExpr::Assign { ref value, .. } if matches!(**value, TypedExpr::Call { .. })));
    }
}
