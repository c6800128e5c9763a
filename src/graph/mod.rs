//! Core property graph
//!
//! This module implements the in-memory data model:
//! - Nodes with caller-assigned IDs and properties
//! - Directed, relation-labelled edges with their own properties
//! - Depth-first and breadth-first traversal
//! - Flattening to and rebuilding from store records

pub mod edge;
pub mod node;
pub mod property;
pub mod record;
pub mod store;
pub mod traversal;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyContainer, PropertyMap, PropertyValue};
pub use record::NodeRecord;
pub use store::{Graph, GraphError, GraphResult};
pub use types::{NodeId, Relation};

use std::sync::Arc;
use tokio::sync::RwLock;

/// A graph shared between tasks
///
/// `Graph` has no locking of its own. Writers take the write lock for any
/// mutation; readers hold the read lock for the whole of a traversal.
pub type SharedGraph = Arc<RwLock<Graph>>;

/// Wrap a graph for sharing
pub fn shared(graph: Graph) -> SharedGraph {
    Arc::new(RwLock::new(graph))
}
