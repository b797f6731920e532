//! # Hashing and Signing Messages
//!
//! BLAKE3 digests plus the exact byte strings replicas sign. Clients and
//! replicas must build these identically or certificates never verify.

use crate::entities::{Hash, ShardId};

const BURN_DOMAIN: &[u8] = b"xs-burn";
const MINT_DOMAIN: &[u8] = b"xs-mint";

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// `Hash(shardId ‖ txHash)`: the message a burn receipt signs.
pub fn burn_signing_message(shard_id: ShardId, tx_hash: &Hash) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(BURN_DOMAIN);
    hasher.update(&u64::from(shard_id).to_le_bytes());
    hasher.update(tx_hash);
    *hasher.finalize().as_bytes()
}

/// `Hash("mint" ‖ shardId ‖ outputsDigest)`: the message a mint receipt signs.
pub fn mint_signing_message(shard_id: ShardId, outputs_digest: &Hash) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(MINT_DOMAIN);
    hasher.update(&u64::from(shard_id).to_le_bytes());
    hasher.update(outputs_digest);
    *hasher.finalize().as_bytes()
}
