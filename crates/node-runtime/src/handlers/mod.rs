//! # Network Handlers
//!
//! Replica-side TCP serving: one task per accepted connection, frames decoded
//! with the wire codec and answered in arrival order.

pub mod replica_server;

pub use replica_server::ReplicaServer;
