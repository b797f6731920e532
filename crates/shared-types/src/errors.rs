//! # Error Types
//!
//! Errors raised while building or (de)serializing shared domain values and
//! while loading the cluster configuration.

use crate::entities::{ReplicaId, ShardId};
use thiserror::Error;

/// Errors on domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShardError {
    /// Nullifier shorter than the routing field requires.
    #[error("Nullifier too short: {len} bytes, need at least {min}")]
    NullifierTooShort {
        /// Actual length
        len: usize,
        /// Required minimum
        min: usize,
    },

    /// Shard id outside `0..num_shards`.
    #[error("Unknown shard: {shard_id} (num_shards = {num_shards})")]
    UnknownShard {
        /// Offending shard
        shard_id: ShardId,
        /// Configured shard count
        num_shards: u32,
    },

    /// Transaction (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Fatal configuration errors. The process must not start with any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Zero shards, or more than the 2-byte routing field can address.
    #[error("Invalid shard count: {0}")]
    InvalidShardCount(u32),

    /// `num_replicas < 3 * f_val + 1`.
    #[error("Insufficient replicas: {num_replicas} cannot tolerate f = {f_val} (need 3f+1)")]
    InsufficientReplicas {
        /// Replicas per shard
        num_replicas: u32,
        /// Byzantine tolerance
        f_val: u32,
    },

    /// Shard list does not match `num_shards`.
    #[error("Expected {expected} shards in cluster file, found {found}")]
    ShardListMismatch {
        /// Configured shard count
        expected: u32,
        /// Entries in the file
        found: usize,
    },

    /// A shard entry lists the wrong replicas.
    #[error("Shard {shard_id}: expected replicas 0..{expected}, found {found:?}")]
    ShardMembership {
        /// Shard at fault
        shard_id: ShardId,
        /// Expected replica count
        expected: u32,
        /// Replica ids found
        found: Vec<ReplicaId>,
    },

    /// Public key is not 32 hex-encoded bytes.
    #[error("Invalid public key for shard {shard_id} replica {replica_id}")]
    InvalidPublicKey {
        /// Shard
        shard_id: ShardId,
        /// Replica
        replica_id: ReplicaId,
    },

    /// Cluster file could not be read.
    #[error("Failed to read config: {0}")]
    Io(String),

    /// Cluster file could not be parsed.
    #[error("Failed to parse config: {0}")]
    Parse(String),
}
