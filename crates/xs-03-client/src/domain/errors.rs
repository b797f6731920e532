//! # Domain Errors
//!
//! Only startup conditions are fatal. Stale, duplicate and unauthenticated
//! responses are dropped, and timeouts stall or abandon a transaction; none of
//! those surface as errors.

use shared_types::{ConfigError, ReplicaId, ShardError, ShardId};
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A shard has fewer live connections than the quorum threshold at the
    /// connection deadline.
    #[error("Shard {shard_id}: {live} of {required} required connections up at deadline")]
    InsufficientConnections {
        /// First shard found short
        shard_id: ShardId,
        /// Live connections to it
        live: usize,
        /// Quorum threshold
        required: usize,
    },

    /// Sending to a replica failed.
    #[error("Send to shard {shard_id} replica {replica_id} failed: {message}")]
    Transport {
        /// Destination shard
        shard_id: ShardId,
        /// Destination replica
        replica_id: ReplicaId,
        /// Transport message
        message: String,
    },

    /// Transaction source has nothing to run.
    #[error("Workload exhausted: {0}")]
    Workload(String),

    /// Transaction could not be built or hashed.
    #[error(transparent)]
    Shard(#[from] ShardError),

    /// Cluster configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
