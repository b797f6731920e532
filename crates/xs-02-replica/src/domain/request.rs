//! Requests ordered by the replication engine.

use crate::domain::errors::ReplicaError;
use shared_types::{blake3_hash, Hash};
use xs_01_wire_codec::{BurnRequest, Message, MintRequest};

/// A client request accepted off the wire, before ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicaRequest {
    /// Burn the transaction's nullifiers on this shard.
    Burn(BurnRequest),
    /// Verify the proof and mint the outputs on this shard.
    Mint(MintRequest),
}

impl ReplicaRequest {
    /// Client transaction index.
    pub fn seq(&self) -> u64 {
        match self {
            ReplicaRequest::Burn(r) => r.seq,
            ReplicaRequest::Mint(r) => r.seq,
        }
    }

    /// `burn` or `mint`.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplicaRequest::Burn(_) => "burn",
            ReplicaRequest::Mint(_) => "mint",
        }
    }

    /// Digest over the type byte and the canonical payload encoding.
    ///
    /// Two deliveries of the same request produce the same digest.
    pub fn digest(&self) -> Result<Hash, ReplicaError> {
        let message = match self {
            ReplicaRequest::Burn(r) => Message::BurnRequest(r.clone()),
            ReplicaRequest::Mint(r) => Message::MintRequest(r.clone()),
        };
        let frame = message.to_frame()?;
        let mut data = Vec::with_capacity(1 + frame.payload.len());
        data.push(frame.msg_type as u8);
        data.extend_from_slice(&frame.payload);
        Ok(blake3_hash(&data))
    }
}
