//! In-memory ordered store
//!
//! Same contract as the RocksDB store, without durability. Used for tests
//! and for graphs that only need to outlive a single request cycle.

use super::storage::{display_key, KvPair, KvScan, KvStore, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicked writer cannot leave a half-written entry behind, so a
    // poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>> {
        self.read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(display_key(key)))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.write().remove(key);
        Ok(())
    }

    fn scan(&self) -> KvScan<'_> {
        // Snapshot so writes during the scan do not deadlock
        let entries: Vec<StorageResult<KvPair>> = self
            .read()
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.clone())))
            .collect();
        Box::new(entries.into_iter())
    }
}
