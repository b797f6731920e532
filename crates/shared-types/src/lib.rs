//! # Shared Types Crate
//!
//! Domain types exchanged between the burn/mint client and shard replicas.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the nullifier → shard rule is defined once,
//!   in [`routing`], and used verbatim by clients and replicas.
//! - **Capability Tokens**: a [`QuorumCertificate`] is immutable once formed;
//!   whoever holds it can prove that a shard irrevocably burnt a transaction.
//! - **Explicit Configuration**: [`ClusterConfig`] is passed to constructors,
//!   never stored in a process-wide singleton.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod entities;
pub mod errors;
pub mod hashing;
pub mod routing;

pub use config::{
    ClusterConfig, QuorumParams, ReplicaEndpoint, ShardMembers, SignerDirectory, MAX_SHARDS,
};
pub use entities::*;
pub use errors::{ConfigError, ShardError};
pub use hashing::{blake3_hash, burn_signing_message, mint_signing_message};
pub use routing::{
    is_responsible, mint_shard_for_client, responsible_shards, shard_of, ROUTING_FIELD_OFFSET,
    ROUTING_FIELD_WIDTH,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
