//! Replica identity and quorum parameters.

use shared_types::{ClusterConfig, ConfigError, QuorumParams, ReplicaId, ShardId};

/// Static configuration of one replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplicaConfig {
    /// This replica's shard.
    pub shard_id: ShardId,
    /// This replica's id within the shard.
    pub replica_id: ReplicaId,
    /// Number of shards in the cluster.
    pub num_shards: u32,
    /// Replica set size and Byzantine tolerance, identical for every shard.
    pub quorum: QuorumParams,
}

impl ReplicaConfig {
    /// Derive from the cluster description, checking the identity exists.
    pub fn from_cluster(
        cluster: &ClusterConfig,
        shard_id: ShardId,
        replica_id: ReplicaId,
    ) -> Result<Self, ConfigError> {
        if cluster.endpoint(shard_id, replica_id).is_none() {
            return Err(ConfigError::Parse(format!(
                "replica {} of shard {} is not in the cluster file",
                replica_id, shard_id
            )));
        }
        Ok(Self {
            shard_id,
            replica_id,
            num_shards: cluster.num_shards,
            quorum: cluster.quorum(),
        })
    }

    /// Certificate size a mint requires.
    pub fn threshold(&self) -> usize {
        self.quorum.threshold()
    }

    /// 4 shards × 4 replicas, f = 1.
    pub fn for_testing(shard_id: ShardId, replica_id: ReplicaId) -> Self {
        Self {
            shard_id,
            replica_id,
            num_shards: 4,
            quorum: QuorumParams {
                num_replicas: 4,
                f_val: 1,
            },
        }
    }
}
