//! Node implementation for property graph

use super::edge::Edge;
use super::property::{PropertyContainer, PropertyMap};
use super::types::NodeId;

/// A node in the property graph
///
/// Nodes have:
/// - A caller-assigned ID, unique within the graph
/// - Properties (key-value pairs)
/// - An ordered list of outgoing edges
///
/// The order of the outgoing list is insertion order. Traversals walk it in
/// that order, so it is part of the observable behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    properties: PropertyMap,
    edges: Vec<Edge>,
}

impl Node {
    /// Nodes are only created through the graph or from stored records
    pub(crate) fn new(id: NodeId, properties: PropertyMap) -> Self {
        Node {
            id,
            properties,
            edges: Vec::new(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Outgoing edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Mutable access to outgoing edges, for editing edge properties
    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut Edge> {
        self.edges.iter_mut()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// IDs of the outgoing edge targets, in edge order
    pub fn targets(&self) -> impl Iterator<Item = &NodeId> {
        self.edges.iter().map(Edge::end)
    }

    /// One `start -> end (relation)` line per outgoing edge
    pub fn edge_summaries(&self) -> Vec<String> {
        self.edges
            .iter()
            .map(|e| format!("{} -> {} ({})", e.start(), e.end(), e.relation()))
            .collect()
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) {
        debug_assert_eq!(edge.start(), &self.id);
        self.edges.push(edge);
    }

    /// Drop every outgoing edge ending at `end`, returning how many went
    pub(crate) fn remove_edges_to(&mut self, end: &str) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| !e.ends_at(end));
        before - self.edges.len()
    }
}

impl PropertyContainer for Node {
    fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }
}
