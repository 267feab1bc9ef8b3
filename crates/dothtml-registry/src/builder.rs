//! Fluent construction of [`TypeEntry`] values.
//!
//! ```
//! use dothtml_core::DataType;
//! use dothtml_registry::{MethodBuilder, TypeBuilder};
//!
//! let customer = TypeBuilder::new("App.Customer", "App")
//!     .property("Name", DataType::string())
//!     .method(MethodBuilder::new("Rename", DataType::Void).param("name", DataType::string()))
//!     .build();
//! assert_eq!(customer.members_named("Name").len(), 1);
//! ```

use std::sync::Arc;

use dothtml_core::{Constant, DataType, TypeHash};

use crate::entries::{
    CapabilityProperty, IndexerEntry, MarkupOptions, MemberEntry, MethodEntry, ParamEntry,
    PropertyEntry, TypeEntry, TypeFlags,
};

pub struct TypeBuilder {
    entry: TypeEntry,
}

impl TypeBuilder {
    pub fn new(name: &str, module: &str) -> Self {
        Self {
            entry: TypeEntry::new(name, module),
        }
    }

    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.entry.flags |= flags;
        self
    }

    pub fn value_type(self) -> Self {
        self.flags(TypeFlags::VALUE_TYPE)
    }

    pub fn interface(self) -> Self {
        self.flags(TypeFlags::INTERFACE)
    }

    pub fn static_class(self) -> Self {
        self.flags(TypeFlags::STATIC)
    }

    pub fn bindable(self) -> Self {
        self.flags(TypeFlags::BINDABLE)
    }

    /// Generic parameters of the type; refer to them with [`DataType::type_param`].
    pub fn generic(mut self, params: &[&str]) -> Self {
        self.entry.type_params = params.iter().map(|p| Arc::from(*p)).collect();
        self
    }

    pub fn base(mut self, base: DataType) -> Self {
        self.entry.bases.push(base);
        self
    }

    fn push(&mut self, name: &str, member: MemberEntry) {
        self.entry.members.entry(Arc::from(name)).or_default().push(member);
    }

    fn add_property(mut self, name: &str, ty: DataType, is_static: bool, writable: bool, is_field: bool) -> Self {
        let property = PropertyEntry {
            name: Arc::from(name),
            ty,
            declaring: self.entry.self_type(),
            is_static,
            writable,
            is_field,
        };
        self.push(name, MemberEntry::Property(property));
        self
    }

    pub fn property(self, name: &str, ty: DataType) -> Self {
        self.add_property(name, ty, false, true, false)
    }

    pub fn readonly_property(self, name: &str, ty: DataType) -> Self {
        self.add_property(name, ty, false, false, false)
    }

    pub fn static_property(self, name: &str, ty: DataType) -> Self {
        self.add_property(name, ty, true, false, false)
    }

    pub fn field(self, name: &str, ty: DataType) -> Self {
        self.add_property(name, ty, false, true, true)
    }

    /// A nested type; its qualified name is `Outer+Name`.
    pub fn nested(mut self, name: &str) -> Self {
        let nested = DataType::named(&format!("{}+{}", self.entry.name, name));
        self.push(name, MemberEntry::NestedType(nested));
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        let entry = method.finish(&self.entry, false);
        let name = entry.name.clone();
        self.push(&name, MemberEntry::Method(entry));
        self
    }

    /// An extension method; the first parameter is the extended value.
    pub fn extension(mut self, method: MethodBuilder) -> Self {
        self.entry.flags |= TypeFlags::STATIC;
        let entry = method.static_method().finish(&self.entry, true);
        let name = entry.name.clone();
        self.push(&name, MemberEntry::Method(entry));
        self
    }

    pub fn indexer(mut self, param: ParamEntry, ty: DataType, writable: bool) -> Self {
        let indexer = IndexerEntry {
            param,
            ty,
            declaring: self.entry.self_type(),
            writable,
        };
        self.entry.indexers.push(indexer);
        self
    }

    /// A capability property; implies [`TypeFlags::BINDABLE`].
    pub fn capability(mut self, name: &str, ty: DataType, markup: MarkupOptions) -> Self {
        self.entry.flags |= TypeFlags::BINDABLE;
        let property = CapabilityProperty {
            name: Arc::from(name),
            ty,
            declaring: self.entry.self_type(),
            markup,
            default: None,
        };
        self.entry.capability_properties.insert(Arc::from(name), property);
        self
    }

    pub fn build(self) -> TypeEntry {
        self.entry
    }
}

pub struct MethodBuilder {
    name: Arc<str>,
    type_params: Vec<Arc<str>>,
    params: Vec<ParamEntry>,
    return_type: DataType,
    is_static: bool,
}

impl MethodBuilder {
    pub fn new(name: &str, return_type: DataType) -> Self {
        Self {
            name: Arc::from(name),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type,
            is_static: false,
        }
    }

    /// Method generic parameters; refer to them with [`DataType::method_param`].
    pub fn generic(mut self, params: &[&str]) -> Self {
        self.type_params = params.iter().map(|p| Arc::from(*p)).collect();
        self
    }

    pub fn param(mut self, name: &str, ty: DataType) -> Self {
        self.params.push(ParamEntry::new(name, ty));
        self
    }

    pub fn default_param(mut self, name: &str, ty: DataType, value: Constant) -> Self {
        self.params.push(ParamEntry::new(name, ty).with_default(value));
        self
    }

    /// Variadic tail of element type `element`.
    pub fn params_tail(mut self, name: &str, element: DataType) -> Self {
        self.params.push(ParamEntry::new(name, DataType::array(element)).params());
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    fn finish(self, owner: &TypeEntry, is_extension: bool) -> MethodEntry {
        let param_hashes: Vec<TypeHash> = self
            .params
            .iter()
            .map(|p| p.ty.definition().unwrap_or(TypeHash::EMPTY))
            .collect();
        let hash = if is_extension {
            TypeHash::from_extension(owner.hash, &self.name, &param_hashes)
        } else {
            TypeHash::from_member(owner.hash, &self.name, &param_hashes)
        };
        MethodEntry {
            hash,
            name: self.name,
            declaring: owner.self_type(),
            type_params: self.type_params,
            params: self.params,
            return_type: self.return_type,
            is_static: self.is_static,
            is_extension,
        }
    }
}
