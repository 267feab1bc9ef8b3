//! Registry storage entries.
//!
//! Entries describe members in terms of their *declaring* type: a member of
//! `List<T>` mentions `T` as an open [`ParamOwner::Type`] parameter. The
//! descriptors handed out by [`TypeSystem`](crate::TypeSystem) are the same
//! entries closed over the receiver's generic arguments.

use std::sync::Arc;

use bitflags::bitflags;
use dothtml_core::{Constant, DataType, ParamOwner, TypeHash};
use rustc_hash::FxHashMap;

bitflags! {
    /// Type-level traits the resolver and control-tree resolver ask about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        /// Copied by value; equality falls back to conversion and compare.
        const VALUE_TYPE = 1 << 0;
        const INTERFACE = 1 << 1;
        /// Static class, the home of extension methods.
        const STATIC = 1 << 2;
        /// Exposes a capability property registry on top of ordinary members.
        const BINDABLE = 1 << 3;
        /// Can be used as a control in markup.
        const CONTROL = 1 << 4;
        /// A control that accepts child content.
        const ALLOWS_CONTENT = 1 << 5;
    }
}

/// A method or indexer parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamEntry {
    pub name: Arc<str>,
    pub ty: DataType,
    /// Value used when the argument is omitted.
    pub default: Option<Constant>,
    /// Trailing `params T[]` parameter.
    pub is_params: bool,
}

impl ParamEntry {
    pub fn new(name: &str, ty: DataType) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            default: None,
            is_params: false,
        }
    }

    pub fn with_default(mut self, value: Constant) -> Self {
        self.default = Some(value);
        self
    }

    /// Mark as a variadic tail. The type must be an array.
    pub fn params(mut self) -> Self {
        self.is_params = true;
        self
    }

    fn substitute(&self, owner: ParamOwner, args: &[DataType]) -> Self {
        Self {
            name: self.name.clone(),
            ty: self.ty.substitute(owner, args),
            default: self.default.clone(),
            is_params: self.is_params,
        }
    }
}

/// A method, possibly generic, possibly an extension.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodEntry {
    pub hash: TypeHash,
    pub name: Arc<str>,
    /// Declaring type, closed over the receiver's arguments once instantiated.
    pub declaring: DataType,
    /// Names of the method's own generic parameters.
    pub type_params: Vec<Arc<str>>,
    pub params: Vec<ParamEntry>,
    pub return_type: DataType,
    pub is_static: bool,
    /// Declared in a static class with the extended value as first parameter.
    pub is_extension: bool,
}

impl MethodEntry {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Index of the variadic tail, if any.
    pub fn params_index(&self) -> Option<usize> {
        match self.params.last() {
            Some(last) if last.is_params => Some(self.params.len() - 1),
            _ => None,
        }
    }

    /// Close the declaring type's generic parameters over `args`.
    pub fn instantiate(&self, declaring: &DataType) -> Self {
        let args = declaring.generic_args();
        if args.is_empty() {
            return self.clone();
        }
        Self {
            hash: self.hash,
            name: self.name.clone(),
            declaring: declaring.clone(),
            type_params: self.type_params.clone(),
            params: self.params.iter().map(|p| p.substitute(ParamOwner::Type, args)).collect(),
            return_type: self.return_type.substitute(ParamOwner::Type, args),
            is_static: self.is_static,
            is_extension: self.is_extension,
        }
    }

    /// Parameter types only, used to detect hiding between base and derived.
    pub fn signature(&self) -> Vec<DataType> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }
}

/// A property or field.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    pub name: Arc<str>,
    pub ty: DataType,
    pub declaring: DataType,
    pub is_static: bool,
    pub writable: bool,
    pub is_field: bool,
}

impl PropertyEntry {
    pub fn instantiate(&self, declaring: &DataType) -> Self {
        let args = declaring.generic_args();
        Self {
            name: self.name.clone(),
            ty: self.ty.substitute(ParamOwner::Type, args),
            declaring: declaring.clone(),
            is_static: self.is_static,
            writable: self.writable,
            is_field: self.is_field,
        }
    }
}

/// Anything reachable by name on a type.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberEntry {
    Method(MethodEntry),
    Property(PropertyEntry),
    /// A nested type; always static.
    NestedType(DataType),
}

impl MemberEntry {
    pub fn is_static(&self) -> bool {
        match self {
            MemberEntry::Method(method) => method.is_static,
            MemberEntry::Property(property) => property.is_static,
            MemberEntry::NestedType(_) => true,
        }
    }

    pub fn instantiate(&self, declaring: &DataType) -> Self {
        match self {
            MemberEntry::Method(method) => MemberEntry::Method(method.instantiate(declaring)),
            MemberEntry::Property(property) => MemberEntry::Property(property.instantiate(declaring)),
            MemberEntry::NestedType(ty) => MemberEntry::NestedType(ty.clone()),
        }
    }
}

/// A single-parameter indexer (`this[int]`).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexerEntry {
    pub param: ParamEntry,
    pub ty: DataType,
    pub declaring: DataType,
    pub writable: bool,
}

impl IndexerEntry {
    pub fn instantiate(&self, declaring: &DataType) -> Self {
        let args = declaring.generic_args();
        Self {
            param: self.param.substitute(ParamOwner::Type, args),
            ty: self.ty.substitute(ParamOwner::Type, args),
            declaring: declaring.clone(),
            writable: self.writable,
        }
    }
}

/// How a capability property may be set from markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupOptions {
    pub required: bool,
    pub allow_binding: bool,
    pub allow_hard_coded: bool,
    /// Accepts `{command: ...}` instead of value bindings.
    pub is_command: bool,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            required: false,
            allow_binding: true,
            allow_hard_coded: true,
            is_command: false,
        }
    }
}

impl MarkupOptions {
    pub fn command() -> Self {
        Self {
            allow_hard_coded: false,
            is_command: true,
            ..Self::default()
        }
    }

    pub fn hard_coded_only() -> Self {
        Self {
            allow_binding: false,
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A property living in a bindable object's side-channel registry.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityProperty {
    pub name: Arc<str>,
    pub ty: DataType,
    pub declaring: DataType,
    pub markup: MarkupOptions,
    pub default: Option<Constant>,
}

/// One registered type.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub hash: TypeHash,
    pub name: Arc<str>,
    /// Module (assembly) identifier reported in emitted artifacts.
    pub module: Arc<str>,
    pub flags: TypeFlags,
    pub type_params: Vec<Arc<str>>,
    /// Base class and implemented interfaces, in terms of `type_params`.
    pub bases: Vec<DataType>,
    pub members: FxHashMap<Arc<str>, Vec<MemberEntry>>,
    pub indexers: Vec<IndexerEntry>,
    pub capability_properties: FxHashMap<Arc<str>, CapabilityProperty>,
}

impl TypeEntry {
    pub fn new(name: &str, module: &str) -> Self {
        Self {
            hash: TypeHash::from_name(name),
            name: Arc::from(name),
            module: Arc::from(module),
            flags: TypeFlags::empty(),
            type_params: Vec::new(),
            bases: Vec::new(),
            members: FxHashMap::default(),
            indexers: Vec::new(),
            capability_properties: FxHashMap::default(),
        }
    }

    /// The type as seen from inside its own declaration, generic parameters open.
    pub fn self_type(&self) -> DataType {
        if self.type_params.is_empty() {
            DataType::named(&self.name)
        } else {
            let args = self
                .type_params
                .iter()
                .enumerate()
                .map(|(i, name)| DataType::type_param(i as u16, name))
                .collect();
            DataType::generic(&self.name, args)
        }
    }

    /// Namespace part of the qualified name.
    pub fn namespace(&self) -> &str {
        match self.name.rfind('.') {
            Some(pos) => &self.name[..pos],
            None => "",
        }
    }

    pub fn is_value_type(&self) -> bool {
        self.flags.contains(TypeFlags::VALUE_TYPE)
    }

    pub fn members_named(&self, name: &str) -> &[MemberEntry] {
        self.members.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
