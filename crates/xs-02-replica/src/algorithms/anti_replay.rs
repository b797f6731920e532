//! Check-then-record over the anti-replay store.
//!
//! Burn and mint records live under separate key prefixes so a target shard
//! that also burnt inputs of a transaction can still mint it exactly once.

use crate::domain::{RejectReason, ReplicaError};
use crate::ports::AntiReplayStore;
use shared_types::{Hash, Nullifier};

/// Record namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Namespace {
    /// Nullifiers burnt by this shard.
    Burn,
    /// Nullifiers whose outputs this shard minted.
    Mint,
}

impl Namespace {
    fn prefix(self) -> &'static [u8] {
        match self {
            Namespace::Burn => b"burn/",
            Namespace::Mint => b"mint/",
        }
    }

    /// Store key for a nullifier.
    pub fn key(self, nullifier: &Nullifier) -> Vec<u8> {
        let prefix = self.prefix();
        let mut key = Vec::with_capacity(prefix.len() + nullifier.as_bytes().len());
        key.extend_from_slice(prefix);
        key.extend_from_slice(nullifier.as_bytes());
        key
    }
}

/// Reject if any nullifier is already recorded in `namespace`.
pub fn ensure_unspent(
    store: &dyn AntiReplayStore,
    namespace: Namespace,
    nullifiers: &[Nullifier],
) -> Result<(), ReplicaError> {
    for nullifier in nullifiers {
        let key = namespace.key(nullifier);
        if store.may_exist(&key)? && store.get(&key)?.is_some() {
            return Err(RejectReason::AlreadySpent {
                nullifier: nullifier.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Record every nullifier in `namespace`, tagged with the spending tx hash.
pub fn record_spent(
    store: &dyn AntiReplayStore,
    namespace: Namespace,
    nullifiers: &[Nullifier],
    tx_hash: &Hash,
) -> Result<(), ReplicaError> {
    for nullifier in nullifiers {
        store.put(&namespace.key(nullifier), tx_hash)?;
    }
    Ok(())
}
