//! # Domain Layer
//!
//! Client configuration, coordinator events and errors.

pub mod config;
pub mod errors;
pub mod events;

pub use config::ClientConfig;
pub use errors::ClientError;
pub use events::{Action, ClientEvent, CoordinatorState, Phase, RunReport, TimerId};
