//! Flattened node records and two-phase graph reconstruction
//!
//! A record is the store-friendly projection of a node:
//!
//! ```text
//! { "id": <string>, "properties": { <string>: <any>, ... }, "edges": [ <node-id>, ... ] }
//! ```
//!
//! Only edge targets are kept. Relation labels and edge properties are not
//! part of the format, so they do not survive a save/load cycle.

use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyContainer, PropertyMap};
use super::store::Graph;
use super::types::{NodeId, Relation};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

/// Flattened form of a node, one per key in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: PropertyMap,

    /// Target IDs of the node's outgoing edges, in edge order
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<NodeId>,
}

/// Older writers emit `null` for an empty map or list
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl NodeRecord {
    /// Store key for this record: the node ID's raw bytes
    pub fn key(&self) -> &[u8] {
        self.id.as_bytes()
    }

    /// Materialize the node without edges
    ///
    /// Edges are attached later by [`Graph::reconstruct_edges`], once every
    /// target node exists.
    pub fn unflatten(&self) -> Node {
        Node::new(self.id.clone(), self.properties.clone())
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

impl Node {
    /// Project the node into a record, keeping only edge targets
    pub fn flatten(&self) -> NodeRecord {
        NodeRecord {
            id: self.id().clone(),
            properties: self.properties().clone(),
            edges: self.targets().cloned().collect(),
        }
    }
}

impl Graph {
    /// Flatten every node, in insertion order
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.nodes().map(Node::flatten).collect()
    }

    /// Rebuild a graph from flattened records
    ///
    /// Phase one materializes every node without edges; phase two wires the
    /// edges against the complete node set, so forward references resolve.
    /// When two records share an ID the first one wins.
    pub fn from_records(records: &[NodeRecord]) -> Graph {
        let mut graph = Graph::new();
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if graph.insert_node(record.unflatten()) {
                kept.push(record);
            } else {
                warn!("Duplicate record for node {}, keeping the first", record.id);
            }
        }
        graph.reconstruct_edges(kept);
        graph
    }

    /// Attach the edges listed in `records` to nodes already in the graph
    ///
    /// Each resolvable target gets a new edge with an empty relation and no
    /// properties. Targets (or owners) missing from the graph are dropped
    /// and logged. Returns the number of dropped references.
    pub fn reconstruct_edges<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a NodeRecord>,
    ) -> usize {
        let mut dropped = 0;
        let mut attached = 0;

        for record in records {
            if !self.contains_node(record.id.as_str()) {
                warn!("Record {} has no node in the graph, skipping its edges", record.id);
                dropped += record.edges.len();
                continue;
            }

            let mut edges = Vec::with_capacity(record.edges.len());
            for target in &record.edges {
                if self.contains_node(target.as_str()) {
                    edges.push(Edge::new(
                        record.id.clone(),
                        target.clone(),
                        Relation::default(),
                        PropertyMap::new(),
                    ));
                } else {
                    warn!("Dropping edge {} -> {}: target not found", record.id, target);
                    dropped += 1;
                }
            }

            if let Some(node) = self.node_mut(record.id.as_str()) {
                attached += edges.len();
                for edge in edges {
                    node.push_edge(edge);
                }
            }
        }

        self.rebuild_incoming();
        debug!("Reconstructed {} edges, dropped {}", attached, dropped);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyValue;
    use std::collections::BTreeSet;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        for (id, name) in [("1", "Alice"), ("2", "Bob"), ("3", "Charlie")] {
            let mut props = PropertyMap::new();
            props.insert("name".to_string(), name.into());
            graph.add_node(id, props);
        }
        let mut since = PropertyMap::new();
        since.insert("since".to_string(), "2022".into());
        graph.add_edge("1", "2", "knows", since).unwrap();
        graph.add_edge("2", "3", "knows", PropertyMap::new()).unwrap();
        graph.add_edge("3", "1", "knows", PropertyMap::new()).unwrap();
        graph.add_edge("1", "3", "likes", PropertyMap::new()).unwrap();
        graph
    }

    #[test]
    fn test_flatten_keeps_targets_in_order() {
        let graph = sample_graph();
        let record = graph.find_node("1").unwrap().flatten();

        assert_eq!(record.id, "1");
        assert_eq!(record.edges, vec![NodeId::new("2"), NodeId::new("3")]);
        assert_eq!(
            record.properties.get("name"),
            Some(&PropertyValue::from("Alice"))
        );
        assert_eq!(record.key(), b"1");
    }

    #[test]
    fn test_wire_format() {
        let graph = sample_graph();
        let bytes = graph.find_node("2").unwrap().flatten().encode().unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"id":"2","properties":{"name":"Bob"},"edges":["3"]}"#
        );
    }

    #[test]
    fn test_decode_accepts_null_collections() {
        let record = NodeRecord::decode(br#"{"id":"7","properties":null,"edges":null}"#).unwrap();
        assert_eq!(record.id, "7");
        assert!(record.properties.is_empty());
        assert!(record.edges.is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_record() {
        assert!(NodeRecord::decode(b"not json").is_err());
        assert!(NodeRecord::decode(br#"{"properties":{}}"#).is_err());
        assert!(NodeRecord::decode(br#"{"id":"1","edges":[1,2]}"#).is_err());
    }

    #[test]
    fn test_unflatten_has_no_edges() {
        let graph = sample_graph();
        let node = graph.find_node("1").unwrap().flatten().unflatten();
        assert_eq!(node.edge_count(), 0);
        assert_eq!(node.get_property("name").unwrap().as_string(), Some("Alice"));
    }

    #[test]
    fn test_round_trip_keeps_topology_only() {
        let original = sample_graph();
        let rebuilt = Graph::from_records(&original.to_records());

        let ids: Vec<&NodeId> = rebuilt.node_ids().collect();
        assert_eq!(ids, original.node_ids().collect::<Vec<_>>());

        for node in original.nodes() {
            let copy = rebuilt.find_node(node.id().as_str()).unwrap();
            assert_eq!(copy.properties(), node.properties());

            let before: BTreeSet<&NodeId> = node.targets().collect();
            let after: BTreeSet<&NodeId> = copy.targets().collect();
            assert_eq!(before, after);

            // Lossy projection: labels and edge properties are gone
            for edge in copy.edges() {
                assert!(edge.relation().is_empty());
                assert_eq!(edge.property_count(), 0);
            }
        }
        assert_eq!(rebuilt.incoming_sources("1"), vec![&NodeId::new("3")]);
    }

    #[test]
    fn test_forward_references_resolve() {
        // Record for "a" arrives before its target "b"
        let records = vec![
            NodeRecord {
                id: "a".into(),
                properties: PropertyMap::new(),
                edges: vec!["b".into()],
            },
            NodeRecord {
                id: "b".into(),
                properties: PropertyMap::new(),
                edges: vec![],
            },
        ];
        let graph = Graph::from_records(&records);
        assert_eq!(graph.neighbors("a").unwrap(), vec![&NodeId::new("b")]);
    }

    #[test]
    fn test_dangling_targets_are_dropped() {
        let records = vec![NodeRecord {
            id: "a".into(),
            properties: PropertyMap::new(),
            edges: vec!["ghost".into(), "a".into(), "ghost".into()],
        }];

        let mut graph = Graph::new();
        graph.insert_node(records[0].unflatten());
        let dropped = graph.reconstruct_edges(&records);

        assert_eq!(dropped, 2);
        assert_eq!(graph.neighbors("a").unwrap(), vec![&NodeId::new("a")]);
    }

    #[test]
    fn test_duplicate_record_first_wins() {
        let mut first = PropertyMap::new();
        first.insert("v".to_string(), 1i64.into());
        let mut second = PropertyMap::new();
        second.insert("v".to_string(), 2i64.into());
        let records = vec![
            NodeRecord { id: "x".into(), properties: first, edges: vec![] },
            NodeRecord { id: "x".into(), properties: second, edges: vec![] },
        ];

        let graph = Graph::from_records(&records);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(
            graph.find_node("x").unwrap().get_property("v").unwrap().as_integer(),
            Some(1)
        );
    }
}
