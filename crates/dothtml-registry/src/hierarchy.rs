//! Inheritance graph.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: type definition hashes (created on first mention, so a base may
//!   be registered after the types deriving from it)
//! - Edges: derived → base, weighted by the base type written in terms of the
//!   derived type's generic parameters (`List<T> : IEnumerable<T>`)

use dothtml_core::{DataType, ParamOwner, TypeHash};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
pub struct TypeHierarchy {
    graph: DiGraph<TypeHash, DataType>,
    nodes: FxHashMap<TypeHash, NodeIndex>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    fn node_for(&mut self, hash: TypeHash) -> NodeIndex {
        if let Some(node) = self.nodes.get(&hash) {
            return *node;
        }
        let node = self.graph.add_node(hash);
        self.nodes.insert(hash, node);
        node
    }

    /// Record that `derived` directly inherits or implements `base`.
    pub fn add_base(&mut self, derived: TypeHash, base: DataType) {
        let Some(base_hash) = base.definition() else {
            return;
        };
        let from = self.node_for(derived);
        let to = self.node_for(base_hash);
        self.graph.add_edge(from, to, base);
    }

    /// Direct bases of a constructed type, closed over its arguments.
    pub fn direct_bases(&self, ty: &DataType) -> Vec<DataType> {
        let Some(node) = ty.definition().and_then(|hash| self.nodes.get(&hash)) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges(*node).collect();
        // petgraph yields outgoing edges newest first; keep declaration order.
        edges.sort_by_key(|edge| edge.id());
        edges
            .into_iter()
            .map(|edge| edge.weight().substitute(ParamOwner::Type, ty.generic_args()))
            .collect()
    }

    /// All transitive bases grouped by distance: level 0 is `ty` itself.
    ///
    /// A base reachable along several paths appears once, at its shallowest level.
    pub fn levels(&self, ty: &DataType) -> Vec<Vec<DataType>> {
        let mut levels = vec![vec![ty.clone()]];
        let mut seen: FxHashSet<DataType> = FxHashSet::default();
        seen.insert(ty.clone());

        loop {
            let mut next = Vec::new();
            for current in levels.last().into_iter().flatten() {
                for base in self.direct_bases(current) {
                    if seen.insert(base.clone()) {
                        next.push(base);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            levels.push(next);
        }
        levels
    }

    /// Whether `ty` reaches `ancestor`'s definition through inheritance.
    pub fn derives_from(&self, ty: TypeHash, ancestor: TypeHash) -> bool {
        let (Some(start), Some(target)) = (self.nodes.get(&ty), self.nodes.get(&ancestor)) else {
            return false;
        };
        petgraph::algo::has_path_connecting(&self.graph, *start, *target, None)
    }
}
