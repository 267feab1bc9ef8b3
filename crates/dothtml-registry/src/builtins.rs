//! Built-in types every view can reference without registration.

use dothtml_core::{Constant, DataType, primitives};

use crate::builder::{MethodBuilder, TypeBuilder};
use crate::entries::{ParamEntry, TypeEntry};
use crate::registry::TypeRegistry;

pub const CORE_MODULE: &str = "System.Runtime";
pub const LINQ_MODULE: &str = "System.Linq";
pub const COLLECTIONS_MODULE: &str = "System.Collections";

pub const LIST_NAME: &str = "System.Collections.Generic.List`1";
pub const DICTIONARY_NAME: &str = "System.Collections.Generic.Dictionary`2";
pub const ENUMERABLE_EXTENSIONS_NAME: &str = "System.Linq.Enumerable";
pub const MATH_NAME: &str = "System.Math";

/// Namespaces searched for type names in every binding.
pub const DEFAULT_NAMESPACES: &[&str] = &["System", "System.Collections.Generic", "System.Linq"];

fn t(index: u16, name: &str) -> DataType {
    DataType::type_param(index, name)
}

fn m(index: u16, name: &str) -> DataType {
    DataType::method_param(index, name)
}

fn object_type() -> TypeEntry {
    TypeBuilder::new(primitives::OBJECT_NAME, CORE_MODULE)
        .method(MethodBuilder::new("Equals", DataType::bool()).param("obj", DataType::object()))
        .method(MethodBuilder::new("ToString", DataType::string()))
        .method(MethodBuilder::new("GetHashCode", DataType::int32()))
        .build()
}

fn interfaces() -> Vec<TypeEntry> {
    vec![
        TypeBuilder::new(primitives::ENUMERABLE_NAME, CORE_MODULE)
            .interface()
            .generic(&["T"])
            .build(),
        TypeBuilder::new(primitives::EQUATABLE_NAME, CORE_MODULE)
            .interface()
            .generic(&["T"])
            .method(MethodBuilder::new("Equals", DataType::bool()).param("other", t(0, "T")))
            .build(),
        TypeBuilder::new(primitives::COMPARABLE_NAME, CORE_MODULE)
            .interface()
            .method(MethodBuilder::new("CompareTo", DataType::int32()).param("obj", DataType::object()))
            .build(),
        TypeBuilder::new(primitives::COMPARABLE_GENERIC_NAME, CORE_MODULE)
            .interface()
            .generic(&["T"])
            .method(MethodBuilder::new("CompareTo", DataType::int32()).param("other", t(0, "T")))
            .build(),
    ]
}

/// Value-type primitive implementing equality and ordering over itself.
fn value_primitive(name: &str) -> TypeEntry {
    let this = DataType::named(name);
    TypeBuilder::new(name, CORE_MODULE)
        .value_type()
        .base(DataType::generic(primitives::EQUATABLE_NAME, vec![this.clone()]))
        .base(DataType::generic(primitives::COMPARABLE_GENERIC_NAME, vec![this]))
        .base(DataType::named(primitives::COMPARABLE_NAME))
        .build()
}

fn string_type() -> TypeEntry {
    let string = DataType::string;
    TypeBuilder::new(primitives::STRING_NAME, CORE_MODULE)
        .base(DataType::generic(primitives::EQUATABLE_NAME, vec![string()]))
        .base(DataType::generic(primitives::COMPARABLE_GENERIC_NAME, vec![string()]))
        .base(DataType::named(primitives::COMPARABLE_NAME))
        .base(DataType::enumerable(DataType::char()))
        .readonly_property("Length", DataType::int32())
        .method(MethodBuilder::new("ToUpper", string()))
        .method(MethodBuilder::new("ToLower", string()))
        .method(MethodBuilder::new("Trim", string()))
        .method(MethodBuilder::new("Contains", DataType::bool()).param("value", string()))
        .method(MethodBuilder::new("StartsWith", DataType::bool()).param("value", string()))
        .method(MethodBuilder::new("Substring", string()).param("startIndex", DataType::int32()))
        .method(
            MethodBuilder::new("Substring", string())
                .param("startIndex", DataType::int32())
                .param("length", DataType::int32()),
        )
        .method(
            MethodBuilder::new("Format", string())
                .static_method()
                .param("format", string())
                .params_tail("args", DataType::object()),
        )
        .method(
            MethodBuilder::new("Join", string())
                .static_method()
                .param("separator", string())
                .params_tail("values", string()),
        )
        .method(
            MethodBuilder::new("IsNullOrEmpty", DataType::bool())
                .static_method()
                .param("value", string()),
        )
        .indexer(ParamEntry::new("index", DataType::int32()), DataType::char(), false)
        .build()
}

fn collections() -> Vec<TypeEntry> {
    vec![
        TypeBuilder::new(LIST_NAME, COLLECTIONS_MODULE)
            .generic(&["T"])
            .base(DataType::enumerable(t(0, "T")))
            .readonly_property("Count", DataType::int32())
            .method(MethodBuilder::new("Add", DataType::Void).param("item", t(0, "T")))
            .method(MethodBuilder::new("Contains", DataType::bool()).param("item", t(0, "T")))
            .method(MethodBuilder::new("IndexOf", DataType::int32()).param("item", t(0, "T")))
            .indexer(ParamEntry::new("index", DataType::int32()), t(0, "T"), true)
            .build(),
        TypeBuilder::new(DICTIONARY_NAME, COLLECTIONS_MODULE)
            .generic(&["TKey", "TValue"])
            .readonly_property("Count", DataType::int32())
            .method(MethodBuilder::new("ContainsKey", DataType::bool()).param("key", t(0, "TKey")))
            .indexer(ParamEntry::new("key", t(0, "TKey")), t(1, "TValue"), true)
            .build(),
    ]
}

fn enumerable_extensions() -> TypeEntry {
    let source = || DataType::enumerable(m(0, "TSource"));
    TypeBuilder::new(ENUMERABLE_EXTENSIONS_NAME, LINQ_MODULE)
        .extension(
            MethodBuilder::new("Count", DataType::int32())
                .generic(&["TSource"])
                .param("source", source()),
        )
        .extension(
            MethodBuilder::new("Any", DataType::bool())
                .generic(&["TSource"])
                .param("source", source()),
        )
        .extension(
            MethodBuilder::new("Contains", DataType::bool())
                .generic(&["TSource"])
                .param("source", source())
                .param("value", m(0, "TSource")),
        )
        .extension(
            MethodBuilder::new("First", m(0, "TSource"))
                .generic(&["TSource"])
                .param("source", source()),
        )
        .build()
}

fn math() -> TypeEntry {
    let binary = |name: &str, ty: DataType| {
        MethodBuilder::new(name, ty.clone())
            .static_method()
            .param("a", ty.clone())
            .param("b", ty)
    };
    TypeBuilder::new(MATH_NAME, CORE_MODULE)
        .static_class()
        .method(binary("Max", DataType::int32()))
        .method(binary("Max", DataType::int64()))
        .method(binary("Max", DataType::double()))
        .method(binary("Min", DataType::int32()))
        .method(binary("Min", DataType::double()))
        .method(
            MethodBuilder::new("Round", DataType::double())
                .static_method()
                .param("value", DataType::double())
                .default_param("digits", DataType::int32(), Constant::Int(0)),
        )
        .build()
}

pub(crate) fn register_builtins(registry: &mut TypeRegistry) {
    registry.insert(object_type());
    for entry in interfaces() {
        registry.insert(entry);
    }
    for name in [
        primitives::BOOL_NAME,
        primitives::CHAR_NAME,
        primitives::INT32_NAME,
        primitives::INT64_NAME,
        primitives::SINGLE_NAME,
        primitives::DOUBLE_NAME,
        primitives::DECIMAL_NAME,
    ] {
        registry.insert(value_primitive(name));
    }
    registry.insert(string_type());
    for entry in collections() {
        registry.insert(entry);
    }
    registry.insert(enumerable_extensions());
    registry.insert(math());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeSystem;

    #[test]
    fn builtins_register_cleanly() {
        let mut registry = TypeRegistry::new();
        for entry in [object_type(), string_type(), math(), enumerable_extensions()] {
            registry.register_type(entry).unwrap();
        }
    }

    #[test]
    fn int_is_equatable_and_comparable() {
        let registry = TypeRegistry::with_primitives();
        let supertypes = registry.supertypes(&DataType::int32());
        assert!(supertypes.contains(&DataType::generic(
            primitives::EQUATABLE_NAME,
            vec![DataType::int32()]
        )));
        assert!(supertypes.contains(&DataType::named(primitives::COMPARABLE_NAME)));
        assert_eq!(supertypes.last(), Some(&DataType::object()));
    }

    #[test]
    fn string_is_a_reference_type() {
        let registry = TypeRegistry::with_primitives();
        assert!(!registry.is_value_type(&DataType::string()));
        assert!(registry.is_value_type(&DataType::decimal()));
    }
}
