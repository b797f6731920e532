//! # Cluster Genesis
//!
//! Key and cluster-file generation for `xs-node init-cluster`.
//!
//! ## Output Layout
//!
//! ```text
//! <out>/
//! ├── cluster.json                    # membership, f_val, public keys
//! └── keys/
//!     └── shard-<s>-replica-<r>.key   # hex ed25519 seed, one per replica
//! ```

pub mod cluster_init;

pub use cluster_init::{ClusterInit, ClusterInitError, GeneratedCluster};
