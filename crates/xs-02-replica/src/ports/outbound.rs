//! # Outbound Ports
//!
//! Capabilities the handlers consume: credential cryptography, the durable
//! anti-replay store and the single-shard replication engine.

use crate::domain::{ReplicaError, ReplicaRequest, StoreError};
use shared_types::{Nullifier, Transaction};
use xs_01_wire_codec::SignedResponse;

/// Credential cryptography - outbound port.
pub trait CredentialProvider: Send + Sync {
    /// Check the transaction's validity proof.
    fn validate(&self, tx: &Transaction) -> bool;

    /// Distinct nullifiers spent by the transaction.
    fn nullifiers(&self, tx: &Transaction) -> Vec<Nullifier>;

    /// Sign with this replica's key.
    fn sign(&self, message: &[u8]) -> Vec<u8>;

    /// Verify a signature under `public_key`.
    fn verify(&self, public_key: &[u8; 32], message: &[u8], signature: &[u8]) -> bool;
}

/// Durable anti-replay store - outbound port.
///
/// Records are never deleted.
pub trait AntiReplayStore: Send + Sync {
    /// Cheap membership hint. `false` is definitive; `true` must be confirmed
    /// with [`AntiReplayStore::get`].
    fn may_exist(&self, key: &[u8]) -> Result<bool, StoreError>;

    /// Authoritative lookup.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Persist a record.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}

/// Executes one ordered request against local state.
pub trait RequestExecutor: Send + Sync {
    /// Run the burn or mint handler.
    fn execute(&self, request: &ReplicaRequest) -> Result<SignedResponse, ReplicaError>;
}

/// Single-shard replication engine - outbound port.
///
/// Orders every request of the shard and executes each one exactly once.
/// Conflicting requests never interleave inside the executor, which is what
/// makes the handlers' check-then-write anti-replay safe.
pub trait ReplicationEngine: Send + Sync {
    /// Order `request` and run it through `executor` once. Redelivery of an
    /// already executed request returns the original response.
    fn deliver(
        &self,
        request: &ReplicaRequest,
        executor: &dyn RequestExecutor,
    ) -> Result<SignedResponse, ReplicaError>;
}
