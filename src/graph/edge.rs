//! Edge implementation for property graph

use super::property::{PropertyContainer, PropertyMap};
use super::types::{NodeId, Relation};

/// A directed edge in the property graph
///
/// An edge is owned by its start node and lives only in that node's
/// outgoing list. Both endpoints refer to nodes of the owning graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Node the edge goes FROM
    start: NodeId,

    /// Node the edge goes TO
    end: NodeId,

    /// Semantic type of the connection (e.g. "knows")
    relation: Relation,

    /// Properties of the edge itself, independent of its endpoints
    properties: PropertyMap,
}

impl Edge {
    pub(crate) fn new(
        start: NodeId,
        end: NodeId,
        relation: impl Into<Relation>,
        properties: PropertyMap,
    ) -> Self {
        Edge {
            start,
            end,
            relation: relation.into(),
            properties,
        }
    }

    pub fn start(&self) -> &NodeId {
        &self.start
    }

    pub fn end(&self) -> &NodeId {
        &self.end
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// Check if this edge goes FROM a specific node
    pub fn starts_from(&self, node: &str) -> bool {
        self.start == node
    }

    /// Check if this edge goes TO a specific node
    pub fn ends_at(&self, node: &str) -> bool {
        self.end == node
    }
}

impl PropertyContainer for Edge {
    fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }
}
