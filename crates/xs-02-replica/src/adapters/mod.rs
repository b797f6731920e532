//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports.

pub mod ed25519;
pub mod local_engine;
pub mod memory_store;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_store;

pub use ed25519::Ed25519Credentials;
pub use local_engine::LocalReplicationEngine;
pub use memory_store::InMemoryAntiReplayStore;
#[cfg(feature = "rocksdb")]
pub use rocksdb_store::{RocksDbAntiReplayStore, RocksDbStoreConfig};
