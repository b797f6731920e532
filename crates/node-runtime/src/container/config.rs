//! # Node Configuration
//!
//! Per-role settings assembled from the command line and the cluster file.

use anyhow::{Context, Result};
use shared_types::{ClusterConfig, ReplicaId, ShardId};
use std::path::{Path, PathBuf};
use xs_03_client::ClientConfig;
use zeroize::Zeroizing;

/// Settings for `xs-node replica`. No `Debug`: it holds the signing seed.
#[derive(Clone)]
pub struct ReplicaNodeConfig {
    /// Validated cluster description.
    pub cluster: ClusterConfig,
    /// Shard this replica serves.
    pub shard_id: ShardId,
    /// Replica id inside the shard.
    pub replica_id: ReplicaId,
    /// Hex-encoded ed25519 seed.
    pub key_hex: Zeroizing<String>,
    /// RocksDB directory; `None` keeps records in memory.
    pub data_dir: Option<PathBuf>,
}

impl ReplicaNodeConfig {
    /// Load the cluster and key files.
    pub fn load(
        cluster_path: &Path,
        shard_id: ShardId,
        replica_id: ReplicaId,
        key_path: &Path,
        data_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let cluster = ClusterConfig::load(cluster_path)
            .with_context(|| format!("invalid cluster file {}", cluster_path.display()))?;
        let key_hex = Zeroizing::new(
            std::fs::read_to_string(key_path)
                .with_context(|| format!("failed to read key file {}", key_path.display()))?
                .trim()
                .to_string(),
        );
        Ok(Self {
            cluster,
            shard_id,
            replica_id,
            key_hex,
            data_dir,
        })
    }
}

/// Settings for `xs-node client`.
#[derive(Debug, Clone)]
pub struct ClientNodeConfig {
    /// Validated cluster description.
    pub cluster: ClusterConfig,
    /// Coordinator knobs.
    pub client: ClientConfig,
    /// Nullifiers per generated transaction.
    pub inputs_per_tx: usize,
    /// Output commitments per generated transaction.
    pub outputs_per_tx: usize,
    /// Workload seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl ClientNodeConfig {
    /// Load the cluster file.
    pub fn load(cluster_path: &Path, client: ClientConfig) -> Result<Self> {
        let cluster = ClusterConfig::load(cluster_path)
            .with_context(|| format!("invalid cluster file {}", cluster_path.display()))?;
        Ok(Self {
            cluster,
            client,
            inputs_per_tx: 2,
            outputs_per_tx: 1,
            seed: None,
        })
    }
}
