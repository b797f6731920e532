//! # Adapters Layer
//!
//! Transaction sources. The TCP transport lives in `node-runtime`.

pub mod workload;

pub use workload::{FixedWorkload, RandomWorkload};
