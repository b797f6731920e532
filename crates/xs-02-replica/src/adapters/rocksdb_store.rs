//! # RocksDB Anti-Replay Store
//!
//! Durable nullifier records for production replicas.
//!
//! ## Configuration
//!
//! - Bloom filters (10 bits per key) back the cheap `key_may_exist` check
//! - Snappy compression
//! - fsync on write: a burnt nullifier must survive a crash

use crate::domain::StoreError;
use crate::ports::AntiReplayStore;
use rocksdb::{BlockBasedOptions, Cache, DBCompressionType, Options, WriteOptions, DB};

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbStoreConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Enable fsync after each write (default: true for durability)
    pub sync_writes: bool,
}

impl Default for RocksDbStoreConfig {
    fn default() -> Self {
        Self {
            path: "./data/anti-replay".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbStoreConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed anti-replay store.
pub struct RocksDbAntiReplayStore {
    db: DB,
    config: RocksDbStoreConfig,
}

impl RocksDbAntiReplayStore {
    /// Open or create the database.
    pub fn open(config: RocksDbStoreConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| StoreError::Io {
            message: format!("Failed to open RocksDB: {}", e),
        })?;

        Ok(Self { db, config })
    }
}

impl AntiReplayStore for RocksDbAntiReplayStore {
    fn may_exist(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.db.key_may_exist(key))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.db.get(key).map_err(|e| StoreError::Io {
            message: format!("RocksDB get failed: {}", e),
        })
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .put_opt(key, value, &write_opts)
            .map_err(|e| StoreError::Io {
                message: format!("RocksDB put failed: {}", e),
            })
    }
}
