//! # Ed25519 Credentials
//!
//! Receipt signing with ed25519-dalek and structural transaction validation.
//! A transaction is valid when it spends at least one input, creates at least
//! one output, spends no nullifier twice and carries the matching binding
//! digest.

use crate::domain::ReplicaError;
use crate::ports::CredentialProvider;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use shared_types::{Nullifier, Transaction};
use std::collections::BTreeSet;
use zeroize::Zeroizing;

/// Ed25519 signing key plus validation rules.
pub struct Ed25519Credentials {
    signing_key: SigningKey,
}

impl Ed25519Credentials {
    /// Build from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Build from a hex-encoded 32-byte seed (the key file format).
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, ReplicaError> {
        let bytes = Zeroizing::new(
            hex::decode(seed_hex.trim()).map_err(|e| ReplicaError::InvalidKey(e.to_string()))?,
        );
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| ReplicaError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?,
        );
        Ok(Self::from_seed(&seed))
    }

    /// Public half of the key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

impl CredentialProvider for Ed25519Credentials {
    fn validate(&self, tx: &Transaction) -> bool {
        if tx.inputs.is_empty() || tx.outputs.is_empty() {
            return false;
        }
        let distinct: BTreeSet<&Nullifier> = tx.inputs.iter().collect();
        if distinct.len() != tx.inputs.len() {
            return false;
        }
        tx.binding == Transaction::binding_digest(&tx.inputs, &tx.outputs)
    }

    fn nullifiers(&self, tx: &Transaction) -> Vec<Nullifier> {
        let distinct: BTreeSet<&Nullifier> = tx.inputs.iter().collect();
        distinct.into_iter().cloned().collect()
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    fn verify(&self, public_key: &[u8; 32], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        key.verify(message, &signature).is_ok()
    }
}
