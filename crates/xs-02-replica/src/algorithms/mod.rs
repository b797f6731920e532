//! # Algorithms
//!
//! Burn and mint request processing.

pub mod anti_replay;
pub mod burn;
pub mod mint;

pub use anti_replay::Namespace;
pub use burn::BurnHandler;
pub use mint::MintHandler;
