//! # Node Runtime Library
//!
//! Process-level wiring for the `xs-node` binary, exposed as a library for
//! integration tests.
//!
//! - `container/` - replica assembly from cluster file and key
//! - `genesis/` - key and cluster-file generation
//! - `adapters/` - TCP implementation of the client transport port
//! - `handlers/` - replica TCP server
//! - `wiring/` - client dispatch loop and timers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod container;
pub mod genesis;
pub mod handlers;
pub mod wiring;

pub use container::{ClientNodeConfig, ReplicaContainer, ReplicaNodeConfig};
pub use genesis::{ClusterInit, GeneratedCluster};
pub use handlers::ReplicaServer;
pub use wiring::{run_client, run_client_with, ClientRunSummary};

use anyhow::{Context, Result};
use tokio::sync::watch;

/// Assemble a replica, bind its endpoint and serve until `shutdown` is set.
pub async fn run_replica(config: ReplicaNodeConfig, shutdown: watch::Receiver<bool>) -> Result<()> {
    let container = ReplicaContainer::build(&config)?;
    let server = ReplicaServer::bind(
        &container.listen_addr,
        container.service,
        container.max_message_size,
    )
    .await
    .with_context(|| format!("failed to bind {}", container.listen_addr))?;
    server.run(shutdown).await?;
    Ok(())
}
