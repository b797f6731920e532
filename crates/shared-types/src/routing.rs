//! # Responsibility Router
//!
//! Deterministic nullifier → shard assignment.
//!
//! `shard_of(n) = u16_be(n[30..32]) mod num_shards`
//!
//! Every client and replica runs this exact function. A divergence makes every
//! shard answer "not my responsibility", so there is deliberately no
//! configuration knob here.

use crate::entities::{Nullifier, ShardId};
use std::collections::BTreeSet;

/// Byte offset of the routing field inside a nullifier.
pub const ROUTING_FIELD_OFFSET: usize = 30;

/// Width of the routing field in bytes.
pub const ROUTING_FIELD_WIDTH: usize = 2;

/// Shard responsible for burning a nullifier.
///
/// Total for every [`Nullifier`]: the constructor guarantees the routing field
/// exists. A zero shard count maps everything to shard 0.
pub fn shard_of(nullifier: &Nullifier, num_shards: u32) -> ShardId {
    if num_shards == 0 {
        return 0;
    }
    let bytes = nullifier.as_bytes();
    let field = u16::from_be_bytes([
        bytes[ROUTING_FIELD_OFFSET],
        bytes[ROUTING_FIELD_OFFSET + 1],
    ]);
    u32::from(field) % num_shards
}

/// Union of `shard_of(n)` over a transaction's nullifiers, ascending.
pub fn responsible_shards<'a, I>(nullifiers: I, num_shards: u32) -> BTreeSet<ShardId>
where
    I: IntoIterator<Item = &'a Nullifier>,
{
    nullifiers
        .into_iter()
        .map(|n| shard_of(n, num_shards))
        .collect()
}

/// Whether `shard_id` must burn at least one of the nullifiers.
pub fn is_responsible<'a, I>(shard_id: ShardId, nullifiers: I, num_shards: u32) -> bool
where
    I: IntoIterator<Item = &'a Nullifier>,
{
    nullifiers
        .into_iter()
        .any(|n| shard_of(n, num_shards) == shard_id)
}

/// Target (minting) shard of a client. Fixed partition over the client id.
pub fn mint_shard_for_client(client_id: u64, num_shards: u32) -> ShardId {
    if num_shards == 0 {
        return 0;
    }
    (client_id % u64::from(num_shards)) as ShardId
}
