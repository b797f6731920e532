//! # Algorithms
//!
//! - [`quorum_collector`]: distinct-signer accumulation with exactly-once handoff
//! - [`receipts`]: receipt signature checks
//! - [`coordinator`]: the two-phase state machine

pub mod coordinator;
pub mod quorum_collector;
pub mod receipts;

pub use coordinator::ClientCoordinator;
pub use quorum_collector::{AddOutcome, QuorumCollector, QuorumKey};
pub use receipts::{verify_receipt, ReceiptKind};
