//! # Cluster Configuration
//!
//! Shard membership, Byzantine tolerance and replica public keys. Loaded once
//! at startup and handed to every component constructor.
//!
//! ## Security Requirements
//!
//! - `num_replicas >= 3 * f_val + 1` for every shard
//! - Every shard lists exactly replicas `0..num_replicas`
//! - Every public key decodes to 32 bytes

use crate::entities::{ReplicaId, ShardId};
use crate::errors::ConfigError;
use crate::routing::ROUTING_FIELD_WIDTH;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default upper bound on a single wire frame payload (4 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 4 * 1024 * 1024;

/// Largest shard count the 2-byte routing field can address.
pub const MAX_SHARDS: u32 = 1 << (8 * ROUTING_FIELD_WIDTH);

fn default_max_message_size() -> u64 {
    DEFAULT_MAX_MESSAGE_SIZE
}

/// Replica set size and Byzantine tolerance of a shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumParams {
    /// Replicas per shard.
    pub num_replicas: u32,
    /// Tolerated Byzantine replicas.
    pub f_val: u32,
}

impl QuorumParams {
    /// Create params, enforcing `num_replicas >= 3f + 1`.
    pub fn new(num_replicas: u32, f_val: u32) -> Result<Self, ConfigError> {
        let params = Self {
            num_replicas,
            f_val,
        };
        params.validate()?;
        Ok(params)
    }

    /// Quorum threshold: `num_replicas - f_val`.
    pub fn threshold(&self) -> usize {
        self.num_replicas.saturating_sub(self.f_val) as usize
    }

    /// Check the 3f+1 bound. Computed in u64 so a hostile `f_val` cannot wrap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = 3 * u64::from(self.f_val) + 1;
        if self.num_replicas == 0 || u64::from(self.num_replicas) < required || self.threshold() == 0
        {
            return Err(ConfigError::InsufficientReplicas {
                num_replicas: self.num_replicas,
                f_val: self.f_val,
            });
        }
        Ok(())
    }
}

/// Network address and signing key of one replica.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaEndpoint {
    /// Replica id inside its shard.
    pub replica_id: ReplicaId,
    /// `host:port` the replica listens on.
    pub addr: String,
    /// Hex-encoded ed25519 public key.
    pub public_key: String,
}

/// Replica set of one shard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardMembers {
    /// Shard id.
    pub shard_id: ShardId,
    /// Replicas, ordered by id.
    pub replicas: Vec<ReplicaEndpoint>,
}

/// Complete cluster description shared by clients and replicas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of shards.
    pub num_shards: u32,
    /// Replicas per shard.
    pub num_replicas: u32,
    /// Byzantine replicas tolerated per shard.
    pub f_val: u32,
    /// Upper bound on a frame payload in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: u64,
    /// Membership of each shard.
    pub shards: Vec<ShardMembers>,
}

impl ClusterConfig {
    /// Parse and validate a JSON cluster description.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build a validated cluster from per-replica address and public key
    /// functions.
    pub fn generate(
        num_shards: u32,
        quorum: QuorumParams,
        mut addr_of: impl FnMut(ShardId, ReplicaId) -> String,
        mut key_of: impl FnMut(ShardId, ReplicaId) -> [u8; 32],
    ) -> Result<Self, ConfigError> {
        let shards = (0..num_shards)
            .map(|shard_id| ShardMembers {
                shard_id,
                replicas: (0..quorum.num_replicas)
                    .map(|replica_id| ReplicaEndpoint {
                        replica_id,
                        addr: addr_of(shard_id, replica_id),
                        public_key: hex::encode(key_of(shard_id, replica_id)),
                    })
                    .collect(),
            })
            .collect();
        let config = Self {
            num_shards,
            num_replicas: quorum.num_replicas,
            f_val: quorum.f_val,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            shards,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON cluster file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::Io(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Quorum parameters shared by every shard.
    pub fn quorum(&self) -> QuorumParams {
        QuorumParams {
            num_replicas: self.num_replicas,
            f_val: self.f_val,
        }
    }

    /// Quorum threshold: `num_replicas - f_val`.
    pub fn threshold(&self) -> usize {
        self.quorum().threshold()
    }

    /// Members of a shard.
    pub fn shard(&self, shard_id: ShardId) -> Option<&ShardMembers> {
        self.shards.iter().find(|s| s.shard_id == shard_id)
    }

    /// Endpoint of one replica.
    pub fn endpoint(&self, shard_id: ShardId, replica_id: ReplicaId) -> Option<&ReplicaEndpoint> {
        self.shard(shard_id)?
            .replicas
            .iter()
            .find(|r| r.replica_id == replica_id)
    }

    /// Every `(shard, replica)` pair in the cluster.
    pub fn all_replicas(&self) -> Vec<(ShardId, ReplicaId)> {
        self.shards
            .iter()
            .flat_map(|s| s.replicas.iter().map(move |r| (s.shard_id, r.replica_id)))
            .collect()
    }

    /// Validate shard count, 3f+1 bound, membership and key encoding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_shards == 0 || self.num_shards > MAX_SHARDS {
            return Err(ConfigError::InvalidShardCount(self.num_shards));
        }
        self.quorum().validate()?;

        if self.shards.len() != self.num_shards as usize {
            return Err(ConfigError::ShardListMismatch {
                expected: self.num_shards,
                found: self.shards.len(),
            });
        }

        for shard_id in 0..self.num_shards {
            let members = self.shard(shard_id).ok_or(ConfigError::ShardListMismatch {
                expected: self.num_shards,
                found: self.shards.len(),
            })?;

            let mut ids: Vec<ReplicaId> = members.replicas.iter().map(|r| r.replica_id).collect();
            ids.sort_unstable();
            let expected: Vec<ReplicaId> = (0..self.num_replicas).collect();
            if ids != expected {
                return Err(ConfigError::ShardMembership {
                    shard_id,
                    expected: self.num_replicas,
                    found: ids,
                });
            }
        }

        self.signer_directory().map(|_| ())
    }

    /// Decode every replica public key.
    pub fn signer_directory(&self) -> Result<SignerDirectory, ConfigError> {
        let mut keys = HashMap::new();
        for shard in &self.shards {
            for replica in &shard.replicas {
                let invalid = || ConfigError::InvalidPublicKey {
                    shard_id: shard.shard_id,
                    replica_id: replica.replica_id,
                };
                let bytes = hex::decode(&replica.public_key).map_err(|_| invalid())?;
                let key: [u8; 32] = bytes.try_into().map_err(|_| invalid())?;
                keys.insert((shard.shard_id, replica.replica_id), key);
            }
        }
        Ok(SignerDirectory { keys })
    }
}

/// Known public key of every replica, keyed by `(shard, replica)`.
///
/// Certificates from shard `s` are only ever checked against shard `s`'s keys.
#[derive(Clone, Debug, Default)]
pub struct SignerDirectory {
    keys: HashMap<(ShardId, ReplicaId), [u8; 32]>,
}

impl SignerDirectory {
    /// Build from explicit keys.
    pub fn from_keys(keys: impl IntoIterator<Item = ((ShardId, ReplicaId), [u8; 32])>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Public key of a replica.
    pub fn key(&self, shard_id: ShardId, replica_id: ReplicaId) -> Option<&[u8; 32]> {
        self.keys.get(&(shard_id, replica_id))
    }

    /// Number of known keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are known.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
