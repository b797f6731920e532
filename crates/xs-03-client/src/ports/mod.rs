//! # Ports Layer
//!
//! Outbound dependencies of the coordinator.

use crate::domain::ClientError;
use shared_types::{ReplicaId, ShardId, Transaction};
use xs_01_wire_codec::Message;

/// Replica connections - outbound port.
///
/// `send` only queues the message on the connection; it never waits on the
/// network.
pub trait Transport: Send + Sync {
    /// Queue `message` for `(shard_id, replica_id)`.
    fn send(
        &self,
        shard_id: ShardId,
        replica_id: ReplicaId,
        message: Message,
    ) -> Result<(), ClientError>;
}

/// Transactions to run - outbound port.
pub trait TransactionSource: Send {
    /// Transaction for index `seq`.
    fn next_transaction(&mut self, seq: u64) -> Result<Transaction, ClientError>;
}
