//! # XS-03 Client
//!
//! Client-side two-phase burn/mint coordinator.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Moves each transaction through two phases: burn its inputs on every
//! responsible shard, collecting one quorum certificate per shard, then mint
//! its outputs on the client's target shard with those certificates as proof.
//!
//! ## Module Structure
//!
//! ```text
//! xs-03-client/
//! ├── domain/          # ClientConfig, events/actions, errors
//! ├── algorithms/      # QuorumCollector, receipt checks, ClientCoordinator
//! ├── ports/           # Transport, TransactionSource
//! ├── adapters/        # Random and fixed workloads
//! └── stats.rs         # Latency accumulator
//! ```
//!
//! The coordinator is synchronous. A runtime feeds it [`ClientEvent`]s from a
//! single dispatch loop and executes the returned [`Action`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod stats;

// Re-exports
pub use adapters::{FixedWorkload, RandomWorkload};
pub use algorithms::{
    verify_receipt, AddOutcome, ClientCoordinator, QuorumCollector, QuorumKey, ReceiptKind,
};
pub use domain::{
    Action, ClientConfig, ClientError, ClientEvent, CoordinatorState, Phase, RunReport, TimerId,
};
pub use ports::{TransactionSource, Transport};
pub use stats::{LatencyStats, LatencySummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
