//! # Core Domain Entities
//!
//! ## Lifecycle
//!
//! A [`Transaction`] is built by the client, burnt on every responsible shard
//! (one [`QuorumCertificate`] each), proven ([`MintProof`]), minted on the
//! target shard and then discarded. Replicas keep the nullifier record forever.

use crate::errors::ShardError;
use crate::hashing::blake3_hash;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Shard identifier, always `< num_shards`.
pub type ShardId = u32;

/// Replica identifier within a shard, always `< num_replicas`.
pub type ReplicaId = u32;

/// A 32-byte BLAKE3 hash.
pub type Hash = [u8; 32];

/// Commitment to a freshly minted coin.
pub type OutputCommitment = [u8; 32];

/// Byte string uniquely identifying one spent input.
///
/// At least [`Nullifier::MIN_LEN`] bytes so the routing field always exists.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Nullifier(Vec<u8>);

impl Nullifier {
    /// Minimum nullifier length in bytes.
    pub const MIN_LEN: usize = 32;

    /// Create a nullifier, rejecting values too short to route.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ShardError> {
        let bytes = bytes.into();
        if bytes.len() < Self::MIN_LEN {
            return Err(ShardError::NullifierTooShort {
                len: bytes.len(),
                min: Self::MIN_LEN,
            });
        }
        Ok(Self(bytes))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for Nullifier {
    type Error = ShardError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl From<Nullifier> for Vec<u8> {
    fn from(n: Nullifier) -> Self {
        n.0
    }
}

impl fmt::Debug for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nullifier({})", hex::encode(&self.0))
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Privacy-preserving coin transaction.
///
/// The cryptographic validity proof is opaque to this crate; `binding` ties
/// inputs to outputs and is checked by the credential capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Nullifiers of the spent inputs.
    pub inputs: Vec<Nullifier>,
    /// Commitments to the coins created on the target shard.
    pub outputs: Vec<OutputCommitment>,
    /// Binding digest over inputs and outputs.
    pub binding: Hash,
}

impl Transaction {
    /// Build a transaction with a correct binding digest.
    pub fn new(inputs: Vec<Nullifier>, outputs: Vec<OutputCommitment>) -> Self {
        let binding = Self::binding_digest(&inputs, &outputs);
        Self {
            inputs,
            outputs,
            binding,
        }
    }

    /// Digest that binds a set of inputs to a set of outputs.
    pub fn binding_digest(inputs: &[Nullifier], outputs: &[OutputCommitment]) -> Hash {
        let mut data = Vec::with_capacity(16 + inputs.len() * 32 + outputs.len() * 32);
        data.extend_from_slice(b"xs-binding");
        data.extend_from_slice(&(inputs.len() as u64).to_le_bytes());
        for input in inputs {
            data.extend_from_slice(&(input.as_bytes().len() as u64).to_le_bytes());
            data.extend_from_slice(input.as_bytes());
        }
        for output in outputs {
            data.extend_from_slice(output);
        }
        blake3_hash(&data)
    }

    /// Canonical serialization.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ShardError> {
        bincode::serialize(self).map_err(|e| ShardError::Serialization(e.to_string()))
    }

    /// Parse the canonical serialization.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ShardError> {
        bincode::deserialize(bytes).map_err(|e| ShardError::Serialization(e.to_string()))
    }

    /// `Hash(serialize(tx))`.
    pub fn tx_hash(&self) -> Result<Hash, ShardError> {
        Ok(blake3_hash(&self.to_bytes()?))
    }

    /// Digest over the minted outputs; what mint receipts sign.
    pub fn outputs_digest(&self) -> Hash {
        let mut data = Vec::with_capacity(self.outputs.len() * 32);
        for output in &self.outputs {
            data.extend_from_slice(output);
        }
        blake3_hash(&data)
    }
}

/// One replica's signature over `Hash(shardId ‖ txHash)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    /// Signing replica.
    pub replica_id: ReplicaId,
    /// Shard that burnt the transaction.
    pub shard_id: ShardId,
    /// Signature bytes.
    pub signature: Vec<u8>,
}

/// One replica's signature share over the minted outputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Signing replica.
    pub replica_id: ReplicaId,
    /// Shard that minted the outputs.
    pub shard_id: ShardId,
    /// Signature bytes.
    pub signature: Vec<u8>,
}

/// Quorum of burn receipts from one shard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumCertificate {
    /// Shard that burnt the transaction.
    pub shard_id: ShardId,
    /// Receipts from distinct replicas.
    pub receipts: Vec<BurnReceipt>,
}

impl QuorumCertificate {
    /// Create a certificate.
    pub fn new(shard_id: ShardId, receipts: Vec<BurnReceipt>) -> Self {
        Self { shard_id, receipts }
    }

    /// Number of receipts.
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    /// Whether the certificate carries no receipts.
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Replica ids of all signers, in receipt order.
    pub fn signer_ids(&self) -> Vec<ReplicaId> {
        self.receipts.iter().map(|r| r.replica_id).collect()
    }

    /// True when no replica signed twice.
    pub fn has_distinct_signers(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.receipts.len());
        self.receipts.iter().all(|r| seen.insert(r.replica_id))
    }
}

/// Certificates for every responsible shard of one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintProof {
    /// Certificates keyed by the shard they claim to cover.
    pub certificates: BTreeMap<ShardId, QuorumCertificate>,
}

impl MintProof {
    /// Empty proof.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the certificate for `shard_id`.
    pub fn insert(&mut self, shard_id: ShardId, certificate: QuorumCertificate) {
        self.certificates.insert(shard_id, certificate);
    }

    /// Certificate for a shard.
    pub fn get(&self, shard_id: ShardId) -> Option<&QuorumCertificate> {
        self.certificates.get(&shard_id)
    }

    /// Shards covered.
    pub fn shards(&self) -> BTreeSet<ShardId> {
        self.certificates.keys().copied().collect()
    }

    /// Number of certificates.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Whether the proof is empty.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// True when the proof covers exactly `shards`.
    pub fn covers_exactly(&self, shards: &BTreeSet<ShardId>) -> bool {
        self.certificates.len() == shards.len()
            && shards.iter().all(|s| self.certificates.contains_key(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nullifier(seed: u8) -> Nullifier {
        Nullifier::new(vec![seed; 32]).unwrap()
    }

    fn receipt(replica_id: ReplicaId) -> BurnReceipt {
        BurnReceipt {
            replica_id,
            shard_id: 1,
            signature: vec![replica_id as u8; 64],
        }
    }

    #[test]
    fn test_nullifier_min_len() {
        assert!(Nullifier::new(vec![0u8; 31]).is_err());
        assert!(Nullifier::new(vec![0u8; 32]).is_ok());
        assert!(Nullifier::new(vec![0u8; 48]).is_ok());
    }

    #[test]
    fn test_nullifier_deserialize_rejects_short() {
        let bytes = bincode::serialize(&vec![1u8; 8]).unwrap();
        let result: Result<Nullifier, _> = bincode::deserialize(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_transaction_hash_stable() {
        let tx = Transaction::new(vec![nullifier(1), nullifier(2)], vec![[9u8; 32]]);
        let bytes = tx.to_bytes().unwrap();
        let restored = Transaction::from_bytes(&bytes).unwrap();

        assert_eq!(tx, restored);
        assert_eq!(tx.tx_hash().unwrap(), restored.tx_hash().unwrap());
    }

    #[test]
    fn test_transaction_hash_changes_with_outputs() {
        let a = Transaction::new(vec![nullifier(1)], vec![[1u8; 32]]);
        let b = Transaction::new(vec![nullifier(1)], vec![[2u8; 32]]);
        assert_ne!(a.tx_hash().unwrap(), b.tx_hash().unwrap());
        assert_ne!(a.binding, b.binding);
    }

    #[test]
    fn test_quorum_certificate_distinct_signers() {
        let qc = QuorumCertificate::new(1, vec![receipt(0), receipt(1), receipt(2)]);
        assert!(qc.has_distinct_signers());
        assert_eq!(qc.signer_ids(), vec![0, 1, 2]);

        let dup = QuorumCertificate::new(1, vec![receipt(0), receipt(2), receipt(2)]);
        assert!(!dup.has_distinct_signers());
    }

    #[test]
    fn test_mint_proof_covers_exactly() {
        let mut proof = MintProof::new();
        proof.insert(1, QuorumCertificate::new(1, vec![receipt(0)]));
        proof.insert(2, QuorumCertificate::new(2, vec![receipt(0)]));

        let expected: BTreeSet<ShardId> = [1, 2].into_iter().collect();
        assert!(proof.covers_exactly(&expected));

        let fewer: BTreeSet<ShardId> = [1].into_iter().collect();
        assert!(!proof.covers_exactly(&fewer));

        let other: BTreeSet<ShardId> = [1, 3].into_iter().collect();
        assert!(!proof.covers_exactly(&other));
    }
}
