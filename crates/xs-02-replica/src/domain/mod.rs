//! # Domain Layer
//!
//! Replica identity, requests and error types.

pub mod config;
pub mod errors;
pub mod request;

pub use config::ReplicaConfig;
pub use errors::{RejectReason, ReplicaError, StoreError};
pub use request::ReplicaRequest;
