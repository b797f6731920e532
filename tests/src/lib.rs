//! # Cross-Shard Test Suite
//!
//! End-to-end scenarios spanning the wire codec, replicas, the client
//! coordinator and the TCP runtime.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # In-process cluster and deterministic driver
//! └── integration/
//!     ├── e2e_burn_mint.rs   # Full burn → mint runs, forged proofs
//!     ├── byzantine.rs       # Silent and forging replicas, replays
//!     └── tcp_cluster.rs     # Real sockets on loopback
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p xs-tests
//! cargo test -p xs-tests integration::tcp_cluster
//!
//! # Benchmarks
//! cargo bench -p xs-tests
//! ```

pub mod harness;
pub mod integration;
