//! Key-value storage layer
//!
//! The graph is persisted through a small byte-keyed contract, [`KvStore`].
//! [`RocksStore`] implements it on RocksDB; the database is closed when the
//! handle is dropped, so every exit path releases it.

use crate::config::{Compression, StorageConfig};
use rocksdb::{IteratorMode, Options, DB};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// The store could not be opened
    #[error("Failed to open store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rocksdb::Error,
    },

    /// Not found
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A put or delete was rejected
    #[error("Write failed for key {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: rocksdb::Error,
    },

    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A raw `(key, value)` entry
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Single-pass, finite iterator over every entry of a store, in key order
pub type KvScan<'a> = Box<dyn Iterator<Item = StorageResult<KvPair>> + 'a>;

/// Ordered, byte-keyed store the graph is persisted into
pub trait KvStore {
    /// Fetch a value; a missing key is [`StorageError::NotFound`]
    fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>>;

    /// Insert or overwrite a value
    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Remove a key; removing a missing key is not an error
    fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Lazily iterate all entries
    fn scan(&self) -> KvScan<'_>;

    /// Make buffered writes durable
    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Flush and release the store
    fn close(self) -> StorageResult<()>
    where
        Self: Sized,
    {
        self.flush()
    }
}

pub(crate) fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

/// RocksDB-based persistent storage
pub struct RocksStore {
    /// RocksDB instance
    db: DB,
    path: PathBuf,
}

impl RocksStore {
    /// Open or create a store with default settings
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let config = StorageConfig {
            path: path.as_ref().to_path_buf(),
            ..StorageConfig::default()
        };
        Self::open_with(&config)
    }

    /// Open a store as described by `config`
    pub fn open_with(config: &StorageConfig) -> StorageResult<Self> {
        let path_str = config.path.display().to_string();

        info!("Opening persistent storage at: {}", path_str);

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(3);
        opts.set_compression_type(match config.compression {
            Compression::None => rocksdb::DBCompressionType::None,
            Compression::Lz4 => rocksdb::DBCompressionType::Lz4,
            Compression::Zstd => rocksdb::DBCompressionType::Zstd,
        });
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let db = DB::open(&opts, &config.path).map_err(|source| StorageError::Open {
            path: path_str.clone(),
            source,
        })?;

        info!("Persistent storage opened successfully");

        Ok(Self {
            db,
            path: config.path.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>> {
        self.db
            .get(key)?
            .ok_or_else(|| StorageError::NotFound(display_key(key)))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.db.put(key, value).map_err(|source| StorageError::Write {
            key: display_key(key),
            source,
        })?;
        debug!("Stored key {}", display_key(key));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.db.delete(key).map_err(|source| StorageError::Write {
            key: display_key(key),
            source,
        })?;
        debug!("Deleted key {}", display_key(key));
        Ok(())
    }

    fn scan(&self) -> KvScan<'_> {
        Box::new(
            self.db
                .iterator(IteratorMode::Start)
                .map(|item| item.map(|(k, v)| (k.into_vec(), v.into_vec())).map_err(StorageError::from)),
        )
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        debug!("Flushed storage to disk");
        Ok(())
    }

    fn close(self) -> StorageResult<()> {
        self.flush()?;
        info!("Closing persistent storage at: {}", self.path.display());
        Ok(())
    }
}
