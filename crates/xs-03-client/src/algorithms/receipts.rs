//! Receipt signature checks against the configured replica keys.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use shared_types::{
    burn_signing_message, mint_signing_message, Hash, ReplicaId, ShardId, SignerDirectory,
};

/// Which signing message a receipt covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptKind {
    /// Burn receipt over `(shard, tx_hash)`.
    Burn,
    /// Mint receipt over `(shard, outputs_digest)`.
    Mint,
}

/// Verify a receipt from `(shard_id, replica_id)`.
///
/// `digest` is the tx hash for burns and the outputs digest for mints.
/// Unknown replicas and malformed keys or signatures fail verification.
pub fn verify_receipt(
    signers: &SignerDirectory,
    kind: ReceiptKind,
    shard_id: ShardId,
    replica_id: ReplicaId,
    digest: &Hash,
    signature: &[u8],
) -> bool {
    let Some(key_bytes) = signers.key(shard_id, replica_id) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(key_bytes) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    let message = match kind {
        ReceiptKind::Burn => burn_signing_message(shard_id, digest),
        ReceiptKind::Mint => mint_signing_message(shard_id, digest),
    };
    key.verify(&message, &signature).is_ok()
}
