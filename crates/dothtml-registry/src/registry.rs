//! TypeRegistry - explicit symbol table implementing [`TypeSystem`].
//!
//! # Storage Model
//!
//! - **Types**: every [`TypeEntry`] stored by [`TypeHash`], plus a name index.
//! - **Extensions**: extension methods indexed by method name across all
//!   static classes, so lookup does not scan every type.
//! - **Hierarchy**: a [`TypeHierarchy`] graph of base and interface edges.
//!
//! Arrays, nullable wrappers and `object` need no entries of their own for
//! hierarchy queries: arrays implement `IEnumerable<T>`, and every type ends
//! its supertype chain in `object`.
//!
//! # Thread Safety
//!
//! The registry is populated single-threaded, then shared read-only (behind
//! an `Arc`) by every compile in a run.

use std::sync::Arc;

use dothtml_core::{DataType, ParamOwner, RegistrationError, TypeHash};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::entries::{
    CapabilityProperty, IndexerEntry, MemberEntry, MethodEntry, PropertyEntry, TypeEntry, TypeFlags,
};
use crate::hierarchy::TypeHierarchy;
use crate::type_system::TypeSystem;

#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<TypeHash, TypeEntry>,
    by_name: FxHashMap<Arc<str>, TypeHash>,
    extensions: FxHashMap<Arc<str>, Vec<MethodEntry>>,
    hierarchy: TypeHierarchy,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `object`, the primitives and the core generic interfaces.
    pub fn with_primitives() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_builtins(&mut registry);
        registry
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    pub fn register_type(&mut self, entry: TypeEntry) -> Result<TypeHash, RegistrationError> {
        if self.types.contains_key(&entry.hash) {
            return Err(RegistrationError::DuplicateType(entry.name.to_string()));
        }
        Self::check_members(&entry)?;
        if let Some(base) = entry.bases.iter().find(|base| base.definition().is_none()) {
            return Err(RegistrationError::InvalidDeclaration(format!(
                "'{}' cannot derive from '{}'",
                entry.name, base
            )));
        }
        for members in entry.members.values() {
            for member in members {
                if let MemberEntry::Method(method) = member
                    && method.is_extension
                    && method.params.is_empty()
                {
                    return Err(RegistrationError::InvalidExtension(method.name.to_string()));
                }
            }
        }
        Ok(self.insert(entry))
    }

    /// Store an already validated entry and index its bases and extensions.
    pub(crate) fn insert(&mut self, entry: TypeEntry) -> TypeHash {
        for base in &entry.bases {
            self.hierarchy.add_base(entry.hash, base.clone());
        }
        for members in entry.members.values() {
            for member in members {
                if let MemberEntry::Method(method) = member
                    && method.is_extension
                {
                    self.extensions
                        .entry(method.name.clone())
                        .or_default()
                        .push(method.clone());
                }
            }
        }

        let hash = entry.hash;
        self.by_name.insert(entry.name.clone(), hash);
        self.types.insert(hash, entry);
        hash
    }

    fn check_members(entry: &TypeEntry) -> Result<(), RegistrationError> {
        for (name, members) in &entry.members {
            let duplicate = || RegistrationError::DuplicateMember {
                type_name: entry.name.to_string(),
                member: name.to_string(),
            };
            let mut signatures = FxHashSet::default();
            let mut non_methods = 0;
            for member in members {
                match member {
                    MemberEntry::Method(method) => {
                        if !signatures.insert(method.signature()) {
                            return Err(duplicate());
                        }
                    }
                    _ => non_methods += 1,
                }
            }
            if non_methods > 1 || (non_methods == 1 && !signatures.is_empty()) {
                return Err(duplicate());
            }
        }
        Ok(())
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn get(&self, hash: TypeHash) -> Option<&TypeEntry> {
        self.types.get(&hash)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&TypeEntry> {
        self.by_name.get(name).and_then(|hash| self.types.get(hash))
    }

    /// Entry for the definition of `ty`; arrays and nullable wrappers have none.
    pub fn entry_of(&self, ty: &DataType) -> Option<&TypeEntry> {
        ty.definition().and_then(|hash| self.types.get(&hash))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeEntry> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Supertype levels, `ty` first and `object` last.
    fn levels(&self, ty: &DataType) -> Vec<Vec<DataType>> {
        let mut levels = match ty {
            DataType::Array(element) => vec![
                vec![ty.clone()],
                vec![DataType::enumerable(element.as_ref().clone())],
            ],
            DataType::Nullable(_) => vec![vec![ty.clone()]],
            DataType::Named(_) => self.hierarchy.levels(ty),
            DataType::Param(_) => vec![vec![ty.clone()]],
            DataType::Unknown | DataType::Void | DataType::Null => return Vec::new(),
        };
        if ty.is_object() {
            return levels;
        }
        let object = DataType::object();
        for level in &mut levels {
            level.retain(|t| t != &object);
        }
        levels.retain(|level| !level.is_empty());
        levels.push(vec![object]);
        levels
    }

    /// Members synthesised for arrays and nullable wrappers.
    fn intrinsic_member(ty: &DataType, name: &str) -> Option<MemberEntry> {
        let member_type = match (ty, name) {
            (DataType::Array(_), "Length") => DataType::int32(),
            (DataType::Nullable(_), "HasValue") => DataType::bool(),
            (DataType::Nullable(inner), "Value") => inner.as_ref().clone(),
            _ => return None,
        };
        Some(MemberEntry::Property(PropertyEntry {
            name: Arc::from(name),
            ty: member_type,
            declaring: ty.clone(),
            is_static: false,
            writable: false,
            is_field: false,
        }))
    }
}

impl TypeSystem for TypeRegistry {
    fn lookup_members(&self, ty: &DataType, name: &str, is_static: bool) -> Vec<MemberEntry> {
        let mut found = Vec::new();
        if !is_static {
            found.extend(Self::intrinsic_member(ty, name));
        }

        let mut hidden_signatures: FxHashSet<Vec<DataType>> = FxHashSet::default();
        let mut name_taken = !found.is_empty();

        for level in self.levels(ty) {
            let mut level_found = Vec::new();
            for constructed in &level {
                let Some(entry) = self.entry_of(constructed) else {
                    continue;
                };
                for member in entry.members_named(name) {
                    if member.is_static() != is_static {
                        continue;
                    }
                    let member = member.instantiate(constructed);
                    let hidden = match &member {
                        MemberEntry::Method(method) => {
                            name_taken || hidden_signatures.contains(&method.signature())
                        }
                        _ => name_taken,
                    };
                    if hidden {
                        trace!(member = name, declaring = %constructed, "hidden by derived member");
                        continue;
                    }
                    if !level_found.contains(&member) {
                        level_found.push(member);
                    }
                }
            }
            for member in &level_found {
                match member {
                    MemberEntry::Method(method) => {
                        hidden_signatures.insert(method.signature());
                    }
                    _ => name_taken = true,
                }
            }
            found.extend(level_found);
        }
        found
    }

    fn lookup_extensions(&self, ty: &DataType, name: &str) -> Vec<MethodEntry> {
        let Some(candidates) = self.extensions.get(name) else {
            return Vec::new();
        };
        let receivers: Vec<DataType> = self.levels(ty).into_iter().flatten().collect();
        candidates
            .iter()
            .filter(|method| {
                let Some(first) = method.params.first() else {
                    return false;
                };
                match &first.ty {
                    DataType::Param(param) => param.owner == ParamOwner::Method,
                    target if target.contains_params(ParamOwner::Method) => receivers
                        .iter()
                        .any(|r| r.definition().is_some() && r.definition() == target.definition()),
                    target => receivers.iter().any(|r| r == target),
                }
            })
            .cloned()
            .collect()
    }

    fn capability_property(&self, ty: &DataType, name: &str) -> Option<CapabilityProperty> {
        self.levels(ty).into_iter().flatten().find_map(|constructed| {
            let entry = self.entry_of(&constructed)?;
            if !entry.flags.contains(TypeFlags::BINDABLE) {
                return None;
            }
            entry.capability_properties.get(name).cloned()
        })
    }

    fn capability_properties(&self, ty: &DataType) -> Vec<CapabilityProperty> {
        let mut result: Vec<CapabilityProperty> = Vec::new();
        for constructed in self.levels(ty).into_iter().flatten() {
            let Some(entry) = self.entry_of(&constructed) else {
                continue;
            };
            let mut declared: Vec<_> = entry.capability_properties.values().collect();
            declared.sort_by(|a, b| a.name.cmp(&b.name));
            for property in declared {
                if !result.iter().any(|p| p.name == property.name) {
                    result.push(property.clone());
                }
            }
        }
        result
    }

    fn indexers(&self, ty: &DataType) -> Vec<IndexerEntry> {
        let mut result: Vec<IndexerEntry> = Vec::new();
        for level in self.levels(ty) {
            let mut level_found = Vec::new();
            for constructed in &level {
                let Some(entry) = self.entry_of(constructed) else {
                    continue;
                };
                for indexer in &entry.indexers {
                    let indexer = indexer.instantiate(constructed);
                    if !result.iter().any(|i| i.param.ty == indexer.param.ty) {
                        level_found.push(indexer);
                    }
                }
            }
            result.extend(level_found);
        }
        result
    }

    fn supertypes(&self, ty: &DataType) -> Vec<DataType> {
        self.levels(ty).into_iter().skip(1).flatten().collect()
    }

    fn is_value_type(&self, ty: &DataType) -> bool {
        match ty {
            DataType::Nullable(_) => true,
            DataType::Named(_) => match ty.primitive() {
                Some(kind) => kind.is_value_type(),
                None => self.entry_of(ty).is_some_and(TypeEntry::is_value_type),
            },
            _ => false,
        }
    }

    fn type_flags(&self, ty: &DataType) -> TypeFlags {
        self.entry_of(ty).map(|entry| entry.flags).unwrap_or_default()
    }

    fn resolve_type(&self, name: &str, namespaces: &[String]) -> Option<DataType> {
        let direct = self.get_by_name(name);
        let entry = direct.or_else(|| {
            namespaces
                .iter()
                .find_map(|ns| self.get_by_name(&format!("{ns}.{name}")))
        })?;
        Some(entry.self_type())
    }

    fn module_of(&self, ty: &DataType) -> Option<Arc<str>> {
        match ty {
            DataType::Array(inner) | DataType::Nullable(inner) => self.module_of(inner),
            DataType::Named(_) => self.entry_of(ty).map(|entry| entry.module.clone()),
            _ => None,
        }
    }
}
