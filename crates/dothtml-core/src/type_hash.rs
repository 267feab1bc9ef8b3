//! Deterministic hash-based type identity.
//!
//! [`TypeHash`] identifies registry types and members by a 64-bit hash of
//! their qualified name, so a type can be referenced (for example by a
//! generic argument or a base type) before it has been registered.
//!
//! # Examples
//!
//! ```
//! use dothtml_core::TypeHash;
//!
//! let a = TypeHash::from_name("App.Customer");
//! let b = TypeHash::from_name("App.Customer");
//! assert_eq!(a, b);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::const_xxh64::xxh64 as const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain mixing constants.
pub mod hash_constants {
    /// Separator constant for path components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for member (method, property, field) hashes.
    pub const MEMBER: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for extension method hashes.
    pub const EXTENSION: u64 = 0x5ea77ffbcdf5f302;

    /// Parameter position mixing constants.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a type or a member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a qualified type name.
    ///
    /// Usable in constant position, which is how [`primitives`] is built.
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ const_xxh64(name.as_bytes(), 0))
    }

    /// Create a member hash from its owner, name and parameter type hashes.
    ///
    /// Parameter order matters: `(int, string)` and `(string, int)` differ.
    pub fn from_member(owner: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        Self::mix(hash_constants::MEMBER ^ owner.0 ^ xxh64(name.as_bytes(), 0), param_hashes)
    }

    /// Create an extension method hash. Extensions are keyed by their
    /// declaring static class so two classes may extend the same type with
    /// identically named methods.
    pub fn from_extension(declaring: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        Self::mix(hash_constants::EXTENSION ^ declaring.0 ^ xxh64(name.as_bytes(), 0), param_hashes)
    }

    /// Hash of a constructed generic type, e.g. `List<int>`.
    pub fn from_generic_instance(definition: TypeHash, args: &[TypeHash]) -> Self {
        Self::mix(definition.0, args)
    }

    fn mix(seed: u64, parts: &[TypeHash]) -> Self {
        let mut hash = seed;
        for (i, part) in parts.iter().enumerate() {
            let marker = hash_constants::PARAM_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
            hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ part.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Hashes and names of the built-in types.
///
/// Built-ins use their keyword spelling as the qualified name so diagnostics
/// read `int` rather than a runtime type name.
pub mod primitives {
    use super::TypeHash;

    pub const OBJECT_NAME: &str = "object";
    pub const VOID_NAME: &str = "void";
    pub const BOOL_NAME: &str = "bool";
    pub const CHAR_NAME: &str = "char";
    pub const INT32_NAME: &str = "int";
    pub const INT64_NAME: &str = "long";
    pub const SINGLE_NAME: &str = "float";
    pub const DOUBLE_NAME: &str = "double";
    pub const DECIMAL_NAME: &str = "decimal";
    pub const STRING_NAME: &str = "string";

    pub const OBJECT: TypeHash = TypeHash::from_name(OBJECT_NAME);
    pub const VOID: TypeHash = TypeHash::from_name(VOID_NAME);
    pub const BOOL: TypeHash = TypeHash::from_name(BOOL_NAME);
    pub const CHAR: TypeHash = TypeHash::from_name(CHAR_NAME);
    pub const INT32: TypeHash = TypeHash::from_name(INT32_NAME);
    pub const INT64: TypeHash = TypeHash::from_name(INT64_NAME);
    pub const SINGLE: TypeHash = TypeHash::from_name(SINGLE_NAME);
    pub const DOUBLE: TypeHash = TypeHash::from_name(DOUBLE_NAME);
    pub const DECIMAL: TypeHash = TypeHash::from_name(DECIMAL_NAME);
    pub const STRING: TypeHash = TypeHash::from_name(STRING_NAME);

    /// Well-known generic definitions the resolver treats specially.
    pub const NULLABLE_NAME: &str = "System.Nullable`1";
    pub const ENUMERABLE_NAME: &str = "System.Collections.Generic.IEnumerable`1";
    pub const EQUATABLE_NAME: &str = "System.IEquatable`1";
    pub const COMPARABLE_NAME: &str = "System.IComparable";
    pub const COMPARABLE_GENERIC_NAME: &str = "System.IComparable`1";

    pub const ENUMERABLE: TypeHash = TypeHash::from_name(ENUMERABLE_NAME);
    pub const EQUATABLE: TypeHash = TypeHash::from_name(EQUATABLE_NAME);
    pub const COMPARABLE: TypeHash = TypeHash::from_name(COMPARABLE_NAME);
    pub const COMPARABLE_GENERIC: TypeHash = TypeHash::from_name(COMPARABLE_GENERIC_NAME);
}
