//! Persistence layer
//!
//! A graph is saved as one record per node, keyed by node ID, and loaded
//! back in two phases: every node is materialized first, then edges are
//! wired against the complete node set.

pub mod memory;
pub mod storage;

pub use memory::MemoryStore;
pub use storage::{KvPair, KvScan, KvStore, RocksStore, StorageError, StorageResult};

use crate::config::StorageConfig;
use crate::graph::{Graph, Node, NodeId, NodeRecord};
use rustc_hash::FxHashSet;
use storage::display_key;
use tracing::{debug, info, warn};

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A stored record could not be decoded
    #[error("Malformed record under key {key}: {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode node {id}: {source}")]
    Serialization {
        id: NodeId,
        #[source]
        source: serde_json::Error,
    },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Counts reported by [`GraphPersistence::save_graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveStats {
    pub written: usize,
    /// Records of nodes no longer in the graph
    pub pruned: usize,
}

/// Saves and loads graphs through a [`KvStore`]
pub struct GraphPersistence<S: KvStore = RocksStore> {
    store: S,
}

impl GraphPersistence<RocksStore> {
    /// Open a RocksDB-backed persistence layer
    pub fn open(config: &StorageConfig) -> PersistenceResult<Self> {
        let store = RocksStore::open_with(config)?;
        Ok(Self::new(store))
    }
}

impl<S: KvStore> GraphPersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get storage reference
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write one node's record
    pub fn save_node(&self, node: &Node) -> PersistenceResult<()> {
        let record = node.flatten();
        let value = record
            .encode()
            .map_err(|source| PersistenceError::Serialization {
                id: record.id.clone(),
                source,
            })?;
        self.store.set(record.key(), &value)?;
        debug!("Stored node {}", record.id);
        Ok(())
    }

    /// Read one node's record
    pub fn get_node(&self, id: &str) -> PersistenceResult<NodeRecord> {
        let value = self.store.get(id.as_bytes())?;
        decode(id.as_bytes(), &value)
    }

    /// Write every node of `graph` and drop records of nodes it no longer has
    pub fn save_graph(&self, graph: &Graph) -> PersistenceResult<SaveStats> {
        let mut stale = Vec::new();
        for item in self.store.scan() {
            let (key, _) = item?;
            let live = std::str::from_utf8(&key)
                .map(|id| graph.contains_node(id))
                .unwrap_or(false);
            if !live {
                stale.push(key);
            }
        }

        let mut stats = SaveStats::default();
        for node in graph.nodes() {
            self.save_node(node)?;
            stats.written += 1;
        }
        for key in stale {
            self.store.delete(&key)?;
            debug!("Pruned stale record {}", display_key(&key));
            stats.pruned += 1;
        }
        self.store.flush()?;

        info!(
            "Saved graph: {} nodes written, {} stale records pruned",
            stats.written, stats.pruned
        );
        Ok(stats)
    }

    /// Rebuild the whole graph from the store
    ///
    /// Malformed records abort the load. Edge targets with no record are
    /// dropped with a warning.
    pub fn load_graph(&self) -> PersistenceResult<Graph> {
        info!("Loading graph from storage");

        let mut records = Vec::new();
        let mut seen = FxHashSet::default();
        for item in self.store.scan() {
            let (key, value) = item?;
            let record = decode(&key, &value)?;
            if record.key() != key.as_slice() {
                warn!(
                    "Record {} stored under key {}",
                    record.id,
                    display_key(&key)
                );
            }
            if seen.insert(record.id.clone()) {
                records.push(record);
            }
        }

        let graph = Graph::from_records(&records);
        info!(
            "Loaded {} nodes and {} edges from storage",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Every entry as `(key, value)` text, for inspection
    pub fn dump(&self) -> PersistenceResult<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for item in self.store.scan() {
            let (key, value) = item?;
            let entry = (display_key(&key), display_key(&value));
            debug!("Key={}, Value={}", entry.0, entry.1);
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Flush and release the underlying store
    pub fn close(self) -> PersistenceResult<()> {
        self.store.close()?;
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

fn decode(key: &[u8], value: &[u8]) -> PersistenceResult<NodeRecord> {
    NodeRecord::decode(value).map_err(|source| PersistenceError::Deserialization {
        key: display_key(key),
        source,
    })
}
