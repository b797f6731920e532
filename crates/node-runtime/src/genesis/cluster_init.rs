//! # Cluster Builder
//!
//! Generates one ed25519 seed per replica and the matching cluster file.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use shared_types::{ClusterConfig, ConfigError, QuorumParams, ReplicaId, ShardId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xs_02_replica::Ed25519Credentials;
use zeroize::Zeroizing;

/// Cluster generation errors.
#[derive(Debug, Error)]
pub enum ClusterInitError {
    /// Parameters do not describe a valid cluster.
    #[error("Invalid cluster parameters: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Port range does not fit in u16.
    #[error("Port range starting at {base_port} cannot hold {count} replicas")]
    PortRange {
        /// First port
        base_port: u16,
        /// Replicas needing a port
        count: u32,
    },

    /// Writing output files failed.
    #[error("Failed to write {path}: {message}")]
    Io {
        /// File being written
        path: String,
        /// I/O error
        message: String,
    },
}

/// `init-cluster` parameters.
#[derive(Debug, Clone)]
pub struct ClusterInit {
    /// Number of shards.
    pub num_shards: u32,
    /// Replicas per shard.
    pub num_replicas: u32,
    /// Byzantine replicas tolerated per shard.
    pub f_val: u32,
    /// Host every replica binds to.
    pub host: String,
    /// Port of shard 0 replica 0; slots are numbered shard-major.
    pub base_port: u16,
    /// Seed for reproducible keys; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for ClusterInit {
    fn default() -> Self {
        Self {
            num_shards: 4,
            num_replicas: 4,
            f_val: 1,
            host: "127.0.0.1".to_string(),
            base_port: 7000,
            seed: None,
        }
    }
}

impl ClusterInit {
    /// Deterministic keys on ports that are never bound.
    pub fn for_testing(num_shards: u32, num_replicas: u32, f_val: u32) -> Self {
        Self {
            num_shards,
            num_replicas,
            f_val,
            seed: Some(42),
            ..Self::default()
        }
    }

    /// Port assigned to a slot.
    pub fn port_of(&self, shard_id: ShardId, replica_id: ReplicaId) -> Option<u16> {
        let offset = shard_id
            .checked_mul(self.num_replicas)?
            .checked_add(replica_id)?;
        u16::try_from(offset).ok()?.checked_add(self.base_port)
    }

    /// Generate keys and the cluster description.
    pub fn generate(&self) -> Result<GeneratedCluster, ClusterInitError> {
        let quorum = QuorumParams::new(self.num_replicas, self.f_val)?;
        let count = self.num_shards.saturating_mul(self.num_replicas);
        if count > 0 && self.port_of(self.num_shards - 1, self.num_replicas - 1).is_none() {
            return Err(ClusterInitError::PortRange {
                base_port: self.base_port,
                count,
            });
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut seeds = BTreeMap::new();
        for shard_id in 0..self.num_shards {
            for replica_id in 0..self.num_replicas {
                let mut seed = Zeroizing::new([0u8; 32]);
                rng.fill_bytes(&mut seed[..]);
                seeds.insert((shard_id, replica_id), seed);
            }
        }

        let cluster = ClusterConfig::generate(
            self.num_shards,
            quorum,
            |s, r| format!("{}:{}", self.host, self.port_of(s, r).unwrap_or(self.base_port)),
            |s, r| {
                seeds
                    .get(&(s, r))
                    .map(|seed| Ed25519Credentials::from_seed(seed).public_key())
                    .unwrap_or_default()
            },
        )?;

        let seeds = seeds
            .into_iter()
            .map(|(slot, seed)| (slot, Zeroizing::new(hex::encode(&seed[..]))))
            .collect();
        Ok(GeneratedCluster { cluster, seeds })
    }
}

/// Output of [`ClusterInit::generate`].
pub struct GeneratedCluster {
    /// Cluster description with public keys.
    pub cluster: ClusterConfig,
    seeds: BTreeMap<(ShardId, ReplicaId), Zeroizing<String>>,
}

impl GeneratedCluster {
    /// Hex seed of a slot.
    pub fn seed_hex(&self, shard_id: ShardId, replica_id: ReplicaId) -> Option<&str> {
        self.seeds.get(&(shard_id, replica_id)).map(|s| s.as_str())
    }

    /// Key file path of a slot under `out_dir`.
    pub fn key_path(out_dir: &Path, shard_id: ShardId, replica_id: ReplicaId) -> PathBuf {
        out_dir
            .join("keys")
            .join(format!("shard-{shard_id}-replica-{replica_id}.key"))
    }

    /// Write `cluster.json` and one key file per replica. Returns the cluster
    /// file path.
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf, ClusterInitError> {
        let io_err = |path: &Path, e: std::io::Error| ClusterInitError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let keys_dir = out_dir.join("keys");
        std::fs::create_dir_all(&keys_dir).map_err(|e| io_err(&keys_dir, e))?;
        for (&(shard_id, replica_id), seed) in &self.seeds {
            let path = Self::key_path(out_dir, shard_id, replica_id);
            std::fs::write(&path, format!("{}\n", seed.as_str())).map_err(|e| io_err(&path, e))?;
        }

        let cluster_path = out_dir.join("cluster.json");
        let json = self.cluster.to_json_pretty()?;
        std::fs::write(&cluster_path, json).map_err(|e| io_err(&cluster_path, e))?;
        Ok(cluster_path)
    }
}
