//! # Node Container
//!
//! Builds a replica's service graph from the cluster file and local key:
//! credentials, anti-replay store, replication engine and handlers.

pub mod config;

pub use config::{ClientNodeConfig, ReplicaNodeConfig};

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use xs_02_replica::{
    AntiReplayStore, Ed25519Credentials, InMemoryAntiReplayStore, LocalReplicationEngine,
    ReplicaConfig, ReplicaService,
};

/// Assembled replica.
pub struct ReplicaContainer {
    /// Request processing for this slot.
    pub service: Arc<ReplicaService>,
    /// Address the replica listens on.
    pub listen_addr: String,
    /// Frame payload limit.
    pub max_message_size: u64,
}

impl ReplicaContainer {
    /// Wire a replica from its node configuration.
    ///
    /// The key file must hold the seed of the public key the cluster file
    /// lists for this slot.
    pub fn build(config: &ReplicaNodeConfig) -> Result<Self> {
        let cluster = &config.cluster;
        let replica_config =
            ReplicaConfig::from_cluster(cluster, config.shard_id, config.replica_id)
                .context("replica slot is not part of the cluster")?;
        let endpoint = cluster
            .endpoint(config.shard_id, config.replica_id)
            .context("replica slot is not part of the cluster")?;

        let credentials = Ed25519Credentials::from_seed_hex(&config.key_hex)
            .context("failed to load replica key")?;
        if hex::encode(credentials.public_key()) != endpoint.public_key.to_lowercase() {
            bail!(
                "key does not match the public key listed for shard {} replica {}",
                config.shard_id,
                config.replica_id
            );
        }

        let store = open_store(config)?;
        let service = ReplicaService::new(
            replica_config,
            Arc::new(credentials),
            store,
            Arc::new(LocalReplicationEngine::default()),
            cluster.signer_directory()?,
        );

        info!(
            shard = config.shard_id,
            replica = config.replica_id,
            addr = %endpoint.addr,
            threshold = cluster.threshold(),
            "[xs-02] Replica assembled"
        );

        Ok(Self {
            service: Arc::new(service),
            listen_addr: endpoint.addr.clone(),
            max_message_size: cluster.max_message_size,
        })
    }
}

#[cfg(feature = "rocksdb")]
fn open_store(config: &ReplicaNodeConfig) -> Result<Arc<dyn AntiReplayStore>> {
    use xs_02_replica::{RocksDbAntiReplayStore, RocksDbStoreConfig};

    match &config.data_dir {
        Some(dir) => {
            let path = dir.join(format!("shard-{}-replica-{}", config.shard_id, config.replica_id));
            let store = RocksDbAntiReplayStore::open(RocksDbStoreConfig {
                path: path.display().to_string(),
                ..RocksDbStoreConfig::default()
            })
            .with_context(|| format!("failed to open anti-replay store at {}", path.display()))?;
            info!(path = %path.display(), "[xs-02] Using RocksDB anti-replay store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("[xs-02] No --data-dir given; nullifier records are kept in memory only");
            Ok(Arc::new(InMemoryAntiReplayStore::new()))
        }
    }
}

#[cfg(not(feature = "rocksdb"))]
fn open_store(config: &ReplicaNodeConfig) -> Result<Arc<dyn AntiReplayStore>> {
    if config.data_dir.is_some() {
        bail!("--data-dir requires a build with the `rocksdb` feature");
    }
    warn!("[xs-02] Nullifier records are kept in memory only");
    Ok(Arc::new(InMemoryAntiReplayStore::new()))
}
