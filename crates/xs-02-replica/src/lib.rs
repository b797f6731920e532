//! # XS-02 Replica
//!
//! Replica-side burn and mint handlers.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A shard replica turns a burn request into an irrevocable nullifier record
//! plus a signed burn receipt, and turns a mint request carrying one quorum
//! certificate per responsible shard into minted outputs plus a signed mint
//! receipt. Every failure is silent towards the client: no signature leaves
//! the replica.
//!
//! ## Security Properties
//!
//! | Defense | Description |
//! |---------|-------------|
//! | Responsibility check | A shard only burns transactions it owns a nullifier of |
//! | Anti-replay | A nullifier is burnt (and minted) at most once per shard |
//! | Exact certificates | `threshold` distinct signers, verified against that shard's keys |
//! | Local tx hash | Signatures are checked over a hash recomputed by the replica |
//! | Serialized execution | The replication engine orders conflicting requests |
//!
//! ## Module Structure
//!
//! ```text
//! xs-02-replica/
//! ├── domain/          # ReplicaConfig, ReplicaRequest, errors
//! ├── algorithms/      # Burn handler, mint handler, anti-replay
//! ├── ports/           # ReplicaApi + credential/store/engine traits
//! ├── adapters/        # In-memory & RocksDB stores, ed25519, local engine
//! └── service.rs       # ReplicaService: engine → handlers, metrics
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(test)]
mod test_support;

// Re-exports
pub use adapters::{Ed25519Credentials, InMemoryAntiReplayStore, LocalReplicationEngine};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbAntiReplayStore, RocksDbStoreConfig};
pub use algorithms::{BurnHandler, MintHandler, Namespace};
pub use domain::{RejectReason, ReplicaConfig, ReplicaError, ReplicaRequest, StoreError};
pub use ports::{AntiReplayStore, CredentialProvider, ReplicaApi, ReplicationEngine, RequestExecutor};
pub use service::ReplicaService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
