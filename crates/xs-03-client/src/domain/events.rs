//! Coordinator inputs and outputs.
//!
//! Connection tasks and timers post [`ClientEvent`]s onto one dispatch loop;
//! the coordinator answers with [`Action`]s for the loop to carry out.

use shared_types::{ReplicaId, ShardId};
use std::time::Duration;
use xs_01_wire_codec::Message;

/// Coordinator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Waiting for replica connections.
    Connecting,
    /// Sending burn requests to every responsible shard.
    BurningAllResponsibleShards,
    /// Collecting one certificate per responsible shard.
    AwaitingBurnQuorums,
    /// Assembling the mint proof.
    BuildingMintProof,
    /// Sending the mint request to the target shard.
    Minting,
    /// Collecting the mint quorum.
    AwaitingMintQuorum,
    /// Between transactions.
    Idle,
    /// Every configured transaction has finished.
    Done,
}

/// Phase a timer belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Connection deadline.
    Connect,
    /// Burn response deadline.
    Burn,
    /// Mint response deadline.
    Mint,
}

/// Identifies one armed timer. A fired timer whose id is no longer current is
/// stale and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId {
    /// Phase.
    pub phase: Phase,
    /// Transaction index (0 for the connect timer).
    pub seq: u64,
    /// Retry attempt.
    pub attempt: u32,
}

impl TimerId {
    /// The connection deadline.
    pub const CONNECT: TimerId = TimerId {
        phase: Phase::Connect,
        seq: 0,
        attempt: 0,
    };
}

/// Input to the coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    /// Connection to a replica is up.
    Connected {
        /// Shard
        shard_id: ShardId,
        /// Replica
        replica_id: ReplicaId,
    },
    /// Connection to a replica closed.
    Disconnected {
        /// Shard
        shard_id: ShardId,
        /// Replica
        replica_id: ReplicaId,
    },
    /// Decoded message from the connection to `(shard_id, replica_id)`.
    Response {
        /// Connection's shard
        shard_id: ShardId,
        /// Connection's replica
        replica_id: ReplicaId,
        /// Decoded message
        message: Message,
    },
    /// An armed timer fired.
    TimerFired(TimerId),
}

/// Output of the coordinator.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Post `TimerFired(id)` after `after`.
    ArmTimer {
        /// Timer id
        id: TimerId,
        /// Delay
        after: Duration,
    },
    /// Drop the timer if it has not fired yet.
    CancelTimer(TimerId),
    /// Run complete.
    Finished(RunReport),
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// Transactions that reached a mint quorum.
    pub completed: u64,
    /// Transactions abandoned on timeout.
    pub stalled: u64,
    /// Wall time from first burn to last outcome.
    pub elapsed: Duration,
}

impl RunReport {
    /// Completed transactions per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}
