//! # Ports Layer
//!
//! Inbound API and outbound dependency traits.

pub mod inbound;
pub mod outbound;

pub use inbound::ReplicaApi;
pub use outbound::{AntiReplayStore, CredentialProvider, ReplicationEngine, RequestExecutor};
