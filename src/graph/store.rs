//! In-memory graph storage implementation
//!
//! The graph is the sole ownership root: nodes live in an insertion-ordered
//! map keyed by ID, and each edge lives in its start node's outgoing list.
//! A derived reverse index (end ID -> start IDs, one entry per edge) is kept
//! alongside so removing a node can find the edges pointing at it.

use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyContainer, PropertyMap, PropertyValue};
use super::types::{NodeId, Relation};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during graph operations
///
/// All variants are "node not found" conditions; the edge variants name the
/// side that was missing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Invalid edge: start node {0} does not exist")]
    StartNodeNotFound(NodeId),

    #[error("Invalid edge: end node {0} does not exist")]
    EndNodeNotFound(NodeId),
}

impl GraphError {
    /// The ID that could not be resolved
    pub fn node_id(&self) -> &NodeId {
        match self {
            GraphError::NodeNotFound(id)
            | GraphError::StartNodeNotFound(id)
            | GraphError::EndNodeNotFound(id) => id,
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory property graph
///
/// Not internally synchronized. Mutation goes through `&mut self`; hosts
/// that share a graph across threads wrap it in [`super::SharedGraph`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node storage, iterated in insertion order
    nodes: IndexMap<NodeId, Node>,

    /// Reverse adjacency: end node -> start node of every edge into it
    incoming: FxHashMap<NodeId, Vec<NodeId>>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the given properties
    ///
    /// If `id` is already present this is a no-op: the existing node keeps
    /// its properties and edges. Returns whether a node was inserted.
    pub fn add_node(&mut self, id: impl Into<NodeId>, properties: PropertyMap) -> bool {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            debug!("Node {} already exists, ignoring add", id);
            return false;
        }
        self.nodes.insert(id.clone(), Node::new(id, properties));
        true
    }

    /// Insert a node built outside the graph (record decoding), edges and all
    pub(crate) fn insert_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(node.id()) {
            return false;
        }
        for edge in node.edges() {
            self.incoming
                .entry(edge.end().clone())
                .or_default()
                .push(node.id().clone());
        }
        self.nodes.insert(node.id().clone(), node);
        true
    }

    /// Create a directed edge from `start` to `end`
    ///
    /// Fails without touching the graph if either endpoint is absent.
    /// Parallel edges, including ones with the same relation, are allowed.
    pub fn add_edge(
        &mut self,
        start: &str,
        end: &str,
        relation: impl Into<Relation>,
        properties: PropertyMap,
    ) -> GraphResult<()> {
        let start_id = self
            .nodes
            .get_key_value(start)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| GraphError::StartNodeNotFound(start.into()))?;
        let end_id = self
            .nodes
            .get_key_value(end)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| GraphError::EndNodeNotFound(end.into()))?;

        let edge = Edge::new(start_id.clone(), end_id.clone(), relation, properties);
        self.incoming.entry(end_id).or_default().push(start_id);
        if let Some(node) = self.nodes.get_mut(start) {
            node.push_edge(edge);
        }
        Ok(())
    }

    /// Get a node by ID
    pub fn find_node(&self, id: &str) -> GraphResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.into()))
    }

    /// Get a mutable node by ID, for in-place property updates
    pub fn find_node_mut(&mut self, id: &str) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.into()))
    }

    /// Check if a node exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Delete a node together with every edge that starts or ends at it
    pub fn remove_node(&mut self, id: &str) -> GraphResult<Node> {
        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.into()))?;

        // Edges from other nodes into the removed one
        let mut sources = self.incoming.remove(id).unwrap_or_default();
        sources.sort();
        sources.dedup();
        let mut dropped = 0;
        for source in sources.iter().filter(|s| s.as_str() != id) {
            if let Some(src) = self.nodes.get_mut(source) {
                dropped += src.remove_edges_to(id);
            }
        }

        // The removed node's own outgoing edges leave the reverse index
        for target in node.targets() {
            if target != id {
                self.unlink_incoming(target.as_str(), id);
            }
        }

        debug!(
            "Removed node {} with {} outgoing and {} incoming edges",
            id,
            node.edge_count(),
            dropped
        );
        Ok(node)
    }

    /// Remove every edge from `start` to `end`
    ///
    /// Returns the number of edges removed; zero when none matched.
    pub fn remove_edge(&mut self, start: &str, end: &str) -> GraphResult<usize> {
        let node = self
            .nodes
            .get_mut(start)
            .ok_or_else(|| GraphError::NodeNotFound(start.into()))?;
        let removed = node.remove_edges_to(end);
        if removed > 0 {
            self.unlink_incoming(end, start);
        }
        Ok(removed)
    }

    /// Outgoing edges of a node in insertion order
    pub fn outgoing_edges(&self, id: &str) -> GraphResult<&[Edge]> {
        self.find_node(id).map(Node::edges)
    }

    /// Target IDs of a node's outgoing edges in edge order
    pub fn neighbors(&self, id: &str) -> GraphResult<Vec<&NodeId>> {
        Ok(self.find_node(id)?.targets().collect())
    }

    /// One `start -> end (relation)` line per outgoing edge of `id`
    pub fn edge_listing(&self, id: &str) -> GraphResult<Vec<String>> {
        Ok(self.find_node(id)?.edge_summaries())
    }

    /// Distinct start nodes of the edges ending at `id`, first-seen order
    pub fn incoming_sources(&self, id: &str) -> Vec<&NodeId> {
        let mut seen = Vec::new();
        if let Some(sources) = self.incoming.get(id) {
            for source in sources {
                if !seen.contains(&source) {
                    seen.push(source);
                }
            }
        }
        seen
    }

    /// Linear scan for nodes whose property `key` equals `value`
    pub fn find_by_property(&self, key: &str, value: &PropertyValue) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.get_property(key) == Some(value))
            .collect()
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get total number of edges
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(Node::edge_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Clear all data from the graph
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.incoming.clear();
    }

    /// Recompute the reverse index from the outgoing lists
    pub fn rebuild_incoming(&mut self) {
        self.incoming.clear();
        for node in self.nodes.values() {
            for target in node.targets() {
                self.incoming
                    .entry(target.clone())
                    .or_default()
                    .push(node.id().clone());
            }
        }
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn node_entry(&self, id: &str) -> Option<(&NodeId, &Node)> {
        self.nodes.get_key_value(id)
    }

    fn unlink_incoming(&mut self, end: &str, start: &str) {
        if let Some(sources) = self.incoming.get_mut(end) {
            sources.retain(|s| s.as_str() != start);
            if sources.is_empty() {
                self.incoming.remove(end);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(name: &str) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("name".to_string(), name.into());
        props
    }

    fn triangle() -> Graph {
        let mut graph = Graph::new();
        graph.add_node("1", props("Alice"));
        graph.add_node("2", props("Bob"));
        graph.add_node("3", props("Charlie"));
        graph.add_edge("1", "2", "knows", PropertyMap::new()).unwrap();
        graph.add_edge("2", "3", "knows", PropertyMap::new()).unwrap();
        graph.add_edge("3", "1", "knows", PropertyMap::new()).unwrap();
        graph
    }

    #[test]
    fn test_add_and_find_node() {
        let mut graph = Graph::new();
        assert!(graph.add_node("1", props("Alice")));

        assert_eq!(graph.node_count(), 1);
        let node = graph.find_node("1").unwrap();
        assert_eq!(node.id(), "1");
        assert_eq!(node.get_property("name").unwrap().as_string(), Some("Alice"));
        assert_eq!(node.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut graph = triangle();
        assert!(!graph.add_node("1", props("Mallory")));

        let node = graph.find_node("1").unwrap();
        assert_eq!(node.get_property("name").unwrap().as_string(), Some("Alice"));
        assert_eq!(node.edge_count(), 1);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_find_missing_node() {
        let graph = Graph::new();
        let err = graph.find_node("nope").unwrap_err();
        assert_eq!(err, GraphError::NodeNotFound("nope".into()));
        assert_eq!(err.to_string(), "Node nope not found");
    }

    #[test]
    fn test_edge_validation() {
        let mut graph = Graph::new();
        graph.add_node("1", PropertyMap::new());

        let result = graph.add_edge("999", "1", "knows", PropertyMap::new());
        assert_eq!(result, Err(GraphError::StartNodeNotFound("999".into())));

        let result = graph.add_edge("1", "999", "knows", PropertyMap::new());
        assert_eq!(result, Err(GraphError::EndNodeNotFound("999".into())));

        // Nothing partial left behind
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.incoming_sources("999").is_empty());
    }

    #[test]
    fn test_parallel_edges_allowed() {
        let mut graph = Graph::new();
        graph.add_node("a", PropertyMap::new());
        graph.add_node("b", PropertyMap::new());
        graph.add_edge("a", "b", "knows", PropertyMap::new()).unwrap();
        graph.add_edge("a", "b", "knows", PropertyMap::new()).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.incoming_sources("b").len(), 1);
    }

    #[test]
    fn test_edge_properties_are_independent() {
        let mut graph = triangle();
        let mut since = PropertyMap::new();
        since.insert("since".to_string(), "2022".into());
        graph.add_edge("1", "3", "likes", since).unwrap();

        let edges = graph.outgoing_edges("1").unwrap();
        assert_eq!(edges[1].relation().as_str(), "likes");
        assert_eq!(edges[1].get_property("since").unwrap().as_string(), Some("2022"));
        assert!(!graph.find_node("1").unwrap().has_property("since"));
    }

    #[test]
    fn test_remove_node_cleans_both_directions() {
        let mut graph = triangle();
        graph.add_node("4", PropertyMap::new());
        graph.add_edge("4", "2", "knows", PropertyMap::new()).unwrap();
        graph.add_edge("2", "2", "self", PropertyMap::new()).unwrap();

        let removed = graph.remove_node("2").unwrap();
        assert_eq!(removed.id(), "2");
        assert!(!graph.contains_node("2"));

        for node in graph.nodes() {
            for edge in node.edges() {
                assert_ne!(edge.end(), "2");
                assert_ne!(edge.start(), "2");
            }
        }
        // 3 -> 1 survives
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.incoming_sources("3").is_empty());
        assert_eq!(graph.incoming_sources("1"), vec![&NodeId::new("3")]);
    }

    #[test]
    fn test_remove_missing_node() {
        let mut graph = triangle();
        assert_eq!(
            graph.remove_node("9").unwrap_err(),
            GraphError::NodeNotFound("9".into())
        );
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = triangle();
        graph.add_edge("1", "2", "likes", PropertyMap::new()).unwrap();

        assert_eq!(graph.remove_edge("1", "2").unwrap(), 2);
        assert_eq!(graph.find_node("1").unwrap().edge_count(), 0);
        assert!(graph.incoming_sources("2").is_empty());

        // No such edge: no-op
        assert_eq!(graph.remove_edge("1", "3").unwrap(), 0);
        assert_eq!(graph.edge_count(), 2);

        assert_eq!(
            graph.remove_edge("9", "1").unwrap_err(),
            GraphError::NodeNotFound("9".into())
        );
    }

    #[test]
    fn test_find_by_property() {
        let mut graph = triangle();
        graph.add_node("4", props("Alice"));

        let found = graph.find_by_property("name", &PropertyValue::from("Alice"));
        let ids: Vec<&str> = found.iter().map(|n| n.id().as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);

        assert!(graph
            .find_by_property("name", &PropertyValue::from("Zed"))
            .is_empty());
    }

    #[test]
    fn test_insertion_order_survives_removal() {
        let mut graph = Graph::new();
        for id in ["c", "a", "b", "d"] {
            graph.add_node(id, PropertyMap::new());
        }
        graph.remove_node("a").unwrap();

        let ids: Vec<&str> = graph.node_ids().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["c", "b", "d"]);
    }

    #[test]
    fn test_rebuild_incoming() {
        let mut graph = triangle();
        graph.incoming.clear();
        graph.rebuild_incoming();
        assert_eq!(graph.incoming_sources("1"), vec![&NodeId::new("3")]);
        assert_eq!(graph.incoming_sources("2"), vec![&NodeId::new("1")]);
    }

    #[test]
    fn test_mutate_properties_in_place() {
        let mut graph = triangle();
        graph.find_node_mut("2").unwrap().set_property("age", 41i64);
        for edge in graph.find_node_mut("2").unwrap().edges_mut() {
            edge.set_property("weight", 0.5);
        }

        let node = graph.find_node("2").unwrap();
        assert_eq!(node.get_property("age").unwrap().as_integer(), Some(41));
        assert_eq!(
            node.edges()[0].get_property("weight").unwrap().as_float(),
            Some(0.5)
        );
    }

    #[test]
    fn test_clear() {
        let mut graph = triangle();
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_edge_listing() {
        let mut graph = triangle();
        graph.add_edge("1", "3", "follows", PropertyMap::new()).unwrap();

        assert_eq!(
            graph.edge_listing("1").unwrap(),
            vec!["1 -> 2 (knows)", "1 -> 3 (follows)"]
        );
        assert_eq!(
            graph.edge_listing("9").unwrap_err(),
            GraphError::NodeNotFound(NodeId::new("9"))
        );
    }
}
