//! Structural type references used throughout binding resolution.
//!
//! A [`DataType`] names a type the way a binding sees it: a registry type
//! (possibly a constructed generic such as `List<int>`), an array, a nullable
//! wrapper, an open generic parameter awaiting inference, or the
//! [`DataType::Unknown`] sentinel for expressions whose type could not be
//! determined.

use std::fmt;
use std::sync::Arc;

use crate::type_hash::{TypeHash, primitives};

/// Whether a generic parameter belongs to a type or to a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamOwner {
    /// Declared on the containing generic type (`List<T>`).
    Type,
    /// Declared on a generic method (`Select<TResult>`).
    Method,
}

/// An open generic parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericParam {
    pub owner: ParamOwner,
    pub index: u16,
    pub name: Arc<str>,
}

/// A registry type, possibly constructed with generic arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    /// Hash of the definition name (`List`1`, not `List<int>`).
    pub hash: TypeHash,
    /// Qualified definition name, including any arity suffix.
    pub name: Arc<str>,
    /// Generic arguments, empty for non-generic types.
    pub args: Vec<DataType>,
}

/// Built-in types with fixed conversion and operator semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Char,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Object,
}

impl PrimitiveKind {
    /// Numeric types participate in arithmetic promotion.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Char
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::Single
                | PrimitiveKind::Double
                | PrimitiveKind::Decimal
        )
    }

    pub fn is_integral(self) -> bool {
        matches!(self, PrimitiveKind::Char | PrimitiveKind::Int32 | PrimitiveKind::Int64)
    }

    pub fn is_value_type(self) -> bool {
        !matches!(self, PrimitiveKind::String | PrimitiveKind::Object)
    }

    pub fn data_type(self) -> DataType {
        match self {
            PrimitiveKind::Bool => DataType::bool(),
            PrimitiveKind::Char => DataType::char(),
            PrimitiveKind::Int32 => DataType::int32(),
            PrimitiveKind::Int64 => DataType::int64(),
            PrimitiveKind::Single => DataType::single(),
            PrimitiveKind::Double => DataType::double(),
            PrimitiveKind::Decimal => DataType::decimal(),
            PrimitiveKind::String => DataType::string(),
            PrimitiveKind::Object => DataType::object(),
        }
    }
}

/// A type as seen by the binding resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Sentinel for an expression whose type could not be determined.
    Unknown,
    /// Result type of a method without a return value.
    Void,
    /// Type of the `null` literal before conversion.
    Null,
    Named(NamedType),
    Array(Box<DataType>),
    /// `T?` for a value type `T`.
    Nullable(Box<DataType>),
    Param(GenericParam),
}

impl DataType {
    /// A non-generic registry type.
    pub fn named(name: &str) -> Self {
        DataType::Named(NamedType {
            hash: TypeHash::from_name(name),
            name: Arc::from(name),
            args: Vec::new(),
        })
    }

    /// A constructed generic registry type.
    pub fn generic(name: &str, args: Vec<DataType>) -> Self {
        DataType::Named(NamedType {
            hash: TypeHash::from_name(name),
            name: Arc::from(name),
            args,
        })
    }

    pub fn array(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    pub fn nullable(inner: DataType) -> Self {
        DataType::Nullable(Box::new(inner))
    }

    pub fn type_param(index: u16, name: &str) -> Self {
        DataType::Param(GenericParam {
            owner: ParamOwner::Type,
            index,
            name: Arc::from(name),
        })
    }

    pub fn method_param(index: u16, name: &str) -> Self {
        DataType::Param(GenericParam {
            owner: ParamOwner::Method,
            index,
            name: Arc::from(name),
        })
    }

    pub fn object() -> Self {
        Self::named(primitives::OBJECT_NAME)
    }

    pub fn bool() -> Self {
        Self::named(primitives::BOOL_NAME)
    }

    pub fn char() -> Self {
        Self::named(primitives::CHAR_NAME)
    }

    pub fn int32() -> Self {
        Self::named(primitives::INT32_NAME)
    }

    pub fn int64() -> Self {
        Self::named(primitives::INT64_NAME)
    }

    pub fn single() -> Self {
        Self::named(primitives::SINGLE_NAME)
    }

    pub fn double() -> Self {
        Self::named(primitives::DOUBLE_NAME)
    }

    pub fn decimal() -> Self {
        Self::named(primitives::DECIMAL_NAME)
    }

    pub fn string() -> Self {
        Self::named(primitives::STRING_NAME)
    }

    /// `IEnumerable<T>`, the interface arrays implement.
    pub fn enumerable(element: DataType) -> Self {
        Self::generic(primitives::ENUMERABLE_NAME, vec![element])
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, DataType::Unknown)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, DataType::Void)
    }

    /// The definition hash of a registry type.
    pub fn definition(&self) -> Option<TypeHash> {
        match self {
            DataType::Named(named) => Some(named.hash),
            _ => None,
        }
    }

    /// Generic arguments of a constructed registry type.
    pub fn generic_args(&self) -> &[DataType] {
        match self {
            DataType::Named(named) => &named.args,
            _ => &[],
        }
    }

    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn nullable_inner(&self) -> Option<&DataType> {
        match self {
            DataType::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// The built-in kind, if this is a primitive.
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        let hash = match self {
            DataType::Named(named) if named.args.is_empty() => named.hash,
            _ => return None,
        };
        Some(match hash {
            primitives::BOOL => PrimitiveKind::Bool,
            primitives::CHAR => PrimitiveKind::Char,
            primitives::INT32 => PrimitiveKind::Int32,
            primitives::INT64 => PrimitiveKind::Int64,
            primitives::SINGLE => PrimitiveKind::Single,
            primitives::DOUBLE => PrimitiveKind::Double,
            primitives::DECIMAL => PrimitiveKind::Decimal,
            primitives::STRING => PrimitiveKind::String,
            primitives::OBJECT => PrimitiveKind::Object,
            _ => return None,
        })
    }

    pub fn is_object(&self) -> bool {
        self.primitive() == Some(PrimitiveKind::Object)
    }

    /// Whether any generic parameter of `owner` appears in this type.
    pub fn contains_params(&self, owner: ParamOwner) -> bool {
        match self {
            DataType::Param(param) => param.owner == owner,
            DataType::Array(inner) | DataType::Nullable(inner) => inner.contains_params(owner),
            DataType::Named(named) => named.args.iter().any(|arg| arg.contains_params(owner)),
            DataType::Unknown | DataType::Void | DataType::Null => false,
        }
    }

    /// Replace the generic parameters of `owner` with `args` by index.
    ///
    /// Parameters whose index is out of range are left open.
    pub fn substitute(&self, owner: ParamOwner, args: &[DataType]) -> DataType {
        match self {
            DataType::Param(param) if param.owner == owner => args
                .get(param.index as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            DataType::Array(inner) => DataType::array(inner.substitute(owner, args)),
            DataType::Nullable(inner) => DataType::nullable(inner.substitute(owner, args)),
            DataType::Named(named) if !named.args.is_empty() => DataType::Named(NamedType {
                hash: named.hash,
                name: named.name.clone(),
                args: named.args.iter().map(|arg| arg.substitute(owner, args)).collect(),
            }),
            _ => self.clone(),
        }
    }

    /// Short name with any arity suffix removed (`List`, not `System.Collections.Generic.List`1`).
    pub fn simple_name(&self) -> String {
        match self {
            DataType::Named(named) => {
                let base = strip_arity(&named.name);
                base.rsplit('.').next().unwrap_or(base).to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Remove a trailing "`n" generic arity suffix.
pub fn strip_arity(name: &str) -> &str {
    match name.rfind('`') {
        Some(pos) if name[pos + 1..].chars().all(|c| c.is_ascii_digit()) => &name[..pos],
        _ => name,
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Unknown => write!(f, "?"),
            DataType::Void => write!(f, "void"),
            DataType::Null => write!(f, "null"),
            DataType::Named(named) => {
                write!(f, "{}", strip_arity(&named.name))?;
                if !named.args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in named.args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            DataType::Array(element) => write!(f, "{element}[]"),
            DataType::Nullable(inner) => write!(f, "{inner}?"),
            DataType::Param(param) => write!(f, "{}", param.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(arg: DataType) -> DataType {
        DataType::generic("System.Collections.Generic.List`1", vec![arg])
    }

    #[test]
    fn primitives_are_recognised() {
        assert_eq!(DataType::int32().primitive(), Some(PrimitiveKind::Int32));
        assert_eq!(DataType::string().primitive(), Some(PrimitiveKind::String));
        assert_eq!(DataType::named("App.Customer").primitive(), None);
        assert!(!PrimitiveKind::String.is_value_type());
        assert!(PrimitiveKind::Decimal.is_numeric());
    }

    #[test]
    fn display_strips_arity_and_renders_arguments() {
        let ty = list_of(DataType::array(DataType::nullable(DataType::int32())));
        assert_eq!(ty.to_string(), "System.Collections.Generic.List<int?[]>");
        assert_eq!(ty.simple_name(), "List");
    }

    #[test]
    fn substitute_replaces_only_matching_owner() {
        let ty = list_of(DataType::method_param(0, "T"));
        let closed = ty.substitute(ParamOwner::Method, &[DataType::string()]);
        assert_eq!(closed, list_of(DataType::string()));

        let untouched = ty.substitute(ParamOwner::Type, &[DataType::string()]);
        assert_eq!(untouched, ty);
    }

    #[test]
    fn substitute_leaves_out_of_range_parameters_open() {
        let ty = DataType::array(DataType::method_param(1, "U"));
        let result = ty.substitute(ParamOwner::Method, &[DataType::int32()]);
        assert_eq!(result, ty);
        assert!(result.contains_params(ParamOwner::Method));
    }

    #[test]
    fn strip_arity_only_removes_numeric_suffix() {
        assert_eq!(strip_arity("List`1"), "List");
        assert_eq!(strip_arity("Odd`Name"), "Odd`Name");
        assert_eq!(strip_arity("Plain"), "Plain");
    }
}
