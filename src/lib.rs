//! topgraph
//!
//! An embedded, in-memory property graph with durable snapshots.
//!
//! - [`graph`]: nodes with caller-assigned IDs, directed relation-labelled
//!   edges, properties on both, DFS/BFS traversal
//! - [`persistence`]: one record per node in an ordered key-value store
//!   (RocksDB, or in memory), with two-phase reload
//! - [`http`]: a small JSON API over a shared graph
//! - [`config`]: YAML configuration
//!
//! ## Example Usage
//!
//! ```rust
//! use topgraph::graph::{Graph, PropertyMap, PropertyContainer};
//!
//! let mut graph = Graph::new();
//! graph.add_node("1", PropertyMap::new());
//! graph.add_node("2", PropertyMap::new());
//! graph.find_node_mut("1").unwrap().set_property("name", "Alice");
//!
//! graph.add_edge("1", "2", "knows", PropertyMap::new()).unwrap();
//!
//! let mut visited = Vec::new();
//! graph.bfs("1", |node| visited.push(node.id().to_string()));
//! assert_eq!(visited, vec!["1", "2"]);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod graph;
pub mod http;
pub mod persistence;

// Re-export main types for convenience
pub use graph::{
    Edge, Graph, GraphError, GraphResult, Node, NodeId, NodeRecord, PropertyContainer,
    PropertyMap, PropertyValue, Relation, SharedGraph,
};

pub use persistence::{
    GraphPersistence, KvStore, MemoryStore, PersistenceError, PersistenceResult, RocksStore,
    StorageError, StorageResult,
};

pub use config::{ConfigError, EngineConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
