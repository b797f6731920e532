//! Fixtures shared by unit tests.

use crate::adapters::Ed25519Credentials;
use crate::ports::CredentialProvider;
use shared_types::{
    blake3_hash, burn_signing_message, BurnReceipt, Nullifier, QuorumCertificate, ReplicaId,
    ShardId, SignerDirectory, Transaction,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Nullifier whose routing field selects `shard` (for up to 65536 shards).
pub fn nullifier_on(shard: ShardId, salt: u8) -> Nullifier {
    let mut bytes = vec![salt; 32];
    bytes[30..32].copy_from_slice(&(shard as u16).to_be_bytes());
    Nullifier::new(bytes).unwrap()
}

/// Deterministic keys for every replica of a cluster.
pub struct TestCluster {
    pub keys: HashMap<(ShardId, ReplicaId), Arc<Ed25519Credentials>>,
    pub signers: SignerDirectory,
}

impl TestCluster {
    pub fn new(num_shards: u32, num_replicas: u32) -> Self {
        let mut keys = HashMap::new();
        for shard in 0..num_shards {
            for replica in 0..num_replicas {
                let seed = blake3_hash(format!("test-key/{}/{}", shard, replica).as_bytes());
                keys.insert((shard, replica), Arc::new(Ed25519Credentials::from_seed(&seed)));
            }
        }
        let signers =
            SignerDirectory::from_keys(keys.iter().map(|(id, creds)| (*id, creds.public_key())));
        Self { keys, signers }
    }

    pub fn creds(&self, shard: ShardId, replica: ReplicaId) -> Arc<Ed25519Credentials> {
        self.keys[&(shard, replica)].clone()
    }

    /// Certificate for `tx` signed by `replicas` of `shard`.
    pub fn certificate(
        &self,
        shard: ShardId,
        replicas: &[ReplicaId],
        tx: &Transaction,
    ) -> QuorumCertificate {
        let message = burn_signing_message(shard, &tx.tx_hash().unwrap());
        QuorumCertificate::new(
            shard,
            replicas
                .iter()
                .map(|&replica_id| BurnReceipt {
                    replica_id,
                    shard_id: shard,
                    signature: self.creds(shard, replica_id).sign(&message),
                })
                .collect(),
        )
    }
}
