//! The type-system capability interface consumed by the binding resolver.

use std::sync::Arc;

use dothtml_core::DataType;

use crate::entries::{CapabilityProperty, IndexerEntry, MemberEntry, MethodEntry, TypeFlags};

/// Member, extension and hierarchy queries over a host object model.
///
/// All returned entries are closed over the generic arguments of the queried
/// type: looking up `Add` on `List<int>` yields `Add(int)`.
pub trait TypeSystem: Send + Sync {
    /// Public members named `name`, static or instance, including inherited
    /// ones. A derived member hides a base member with the same signature;
    /// members contributed at the same inheritance depth (sibling
    /// interfaces) are all returned.
    fn lookup_members(&self, ty: &DataType, name: &str, is_static: bool) -> Vec<MemberEntry>;

    /// Extension methods named `name` whose first parameter can receive `ty`.
    fn lookup_extensions(&self, ty: &DataType, name: &str) -> Vec<MethodEntry>;

    /// Property from the bindable-object capability registry, if `ty` has one.
    fn capability_property(&self, ty: &DataType, name: &str) -> Option<CapabilityProperty>;

    /// Every capability property reachable on `ty`, derived declarations first.
    fn capability_properties(&self, ty: &DataType) -> Vec<CapabilityProperty>;

    /// Indexers reachable on `ty`, excluding array element access.
    fn indexers(&self, ty: &DataType) -> Vec<IndexerEntry>;

    /// All transitive bases and interfaces of `ty`, nearest first, ending in `object`.
    fn supertypes(&self, ty: &DataType) -> Vec<DataType>;

    fn is_value_type(&self, ty: &DataType) -> bool;

    fn type_flags(&self, ty: &DataType) -> TypeFlags;

    /// Resolve a type name written in markup or a binding, trying it as
    /// given and then qualified by each of `namespaces`.
    fn resolve_type(&self, name: &str, namespaces: &[String]) -> Option<DataType>;

    /// Module identifier that defines `ty`.
    fn module_of(&self, ty: &DataType) -> Option<Arc<str>>;

    /// Reference or identity assignability; numeric widening is the
    /// conversion layer's concern.
    fn is_assignable(&self, from: &DataType, to: &DataType) -> bool {
        if from == to {
            return true;
        }
        if matches!(from, DataType::Unknown | DataType::Void | DataType::Null) {
            return false;
        }
        self.supertypes(from).iter().any(|base| base == to)
    }
}
