//! # xs-node
//!
//! Entry point for cross-shard burn/mint nodes.
//!
//! ```bash
//! # Generate keys and a cluster file for 4 shards of 4 replicas (f = 1)
//! xs-node init-cluster --shards 4 --replicas 4 --f-val 1 --out ./cluster
//!
//! # One process per replica slot
//! xs-node replica --config ./cluster/cluster.json --shard 0 --replica 0 \
//!     --key ./cluster/keys/shard-0-replica-0.key
//!
//! # Move 100 transactions as client 6 (mints on shard 6 mod 4 = 2)
//! xs-node client --config ./cluster/cluster.json --client-id 6 --transactions 100
//! ```
//!
//! Exit status is non-zero when configuration is invalid or the client cannot
//! reach a quorum of every shard by its connection deadline.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use node_runtime::{
    run_client, run_replica, ClientNodeConfig, ClusterInit, ReplicaNodeConfig,
};
use shard_telemetry::{gather_text, init_telemetry, TelemetryConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use xs_03_client::ClientConfig;

/// Cross-shard burn/mint node
#[derive(Parser, Debug)]
#[command(name = "xs-node")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve one replica slot of a shard
    Replica(ReplicaArgs),
    /// Run burn/mint transactions against the cluster
    Client(ClientArgs),
    /// Generate replica keys and a cluster file
    InitCluster(InitClusterArgs),
}

#[derive(Args, Debug)]
struct ReplicaArgs {
    /// Cluster file (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Shard id
    #[arg(long)]
    shard: u32,

    /// Replica id within the shard
    #[arg(long)]
    replica: u32,

    /// Hex-encoded ed25519 seed file
    #[arg(long)]
    key: PathBuf,

    /// Anti-replay store directory (requires the `rocksdb` feature)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ClientArgs {
    /// Cluster file (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Client id; fixes the mint shard
    #[arg(long, default_value = "0")]
    client_id: u64,

    /// Transactions to run
    #[arg(long, default_value = "1")]
    transactions: u64,

    /// Deadline for replica connections
    #[arg(long, default_value = "5000")]
    connect_timeout_ms: u64,

    /// Per-phase response deadline
    #[arg(long, default_value = "10000")]
    response_timeout_ms: u64,

    /// Re-sends per phase before a transaction is abandoned
    #[arg(long, default_value = "0")]
    max_retries: u32,

    /// Upper bound on the backed-off response deadline
    #[arg(long, default_value = "60000")]
    max_backoff_ms: u64,

    /// Nullifiers per generated transaction
    #[arg(long, default_value = "2", value_parser = parse_positive)]
    inputs: usize,

    /// Output commitments per generated transaction
    #[arg(long, default_value = "1", value_parser = parse_positive)]
    outputs: usize,

    /// Seed for a reproducible workload
    #[arg(long)]
    seed: Option<u64>,

    /// Count receipts without checking their signatures
    #[arg(long)]
    no_verify: bool,

    /// Print Prometheus metrics after the summary
    #[arg(long)]
    metrics: bool,
}

#[derive(Args, Debug)]
struct InitClusterArgs {
    /// Number of shards
    #[arg(long, default_value = "4")]
    shards: u32,

    /// Replicas per shard
    #[arg(long, default_value = "4")]
    replicas: u32,

    /// Byzantine replicas tolerated per shard
    #[arg(long, default_value = "1")]
    f_val: u32,

    /// Host every replica binds to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port of shard 0 replica 0
    #[arg(long, default_value = "7000")]
    base_port: u16,

    /// Output directory
    #[arg(long)]
    out: PathBuf,
}

/// A transaction needs at least one input and one output.
fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let role = match &cli.command {
        Command::Replica(_) => "replica",
        Command::Client(_) => "client",
        Command::InitCluster(_) => "init",
    };
    if let Err(e) = init_telemetry(&TelemetryConfig::for_role(role)) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Replica(args) => replica(args).await,
        Command::Client(args) => client(args).await,
        Command::InitCluster(args) => init_cluster(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Fatal error");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn replica(args: ReplicaArgs) -> Result<()> {
    let config =
        ReplicaNodeConfig::load(&args.config, args.shard, args.replica, &args.key, args.data_dir)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, stopping replica");
            let _ = shutdown_tx.send(true);
        }
    });

    run_replica(config, shutdown_rx).await
}

async fn client(args: ClientArgs) -> Result<()> {
    let client = ClientConfig {
        client_id: args.client_id,
        transactions: args.transactions,
        connect_timeout: Duration::from_millis(args.connect_timeout_ms),
        response_timeout: Duration::from_millis(args.response_timeout_ms),
        max_retries: args.max_retries,
        max_backoff: Duration::from_millis(args.max_backoff_ms),
        verify_receipts: !args.no_verify,
    };
    let mut config = ClientNodeConfig::load(&args.config, client)?;
    config.inputs_per_tx = args.inputs;
    config.outputs_per_tx = args.outputs;
    config.seed = args.seed;

    let summary = run_client(config).await.context("client run failed")?;
    println!("{}", summary.render());
    if args.metrics {
        println!("\n{}", gather_text()?);
    }
    Ok(())
}

fn init_cluster(args: InitClusterArgs) -> Result<()> {
    let init = ClusterInit {
        num_shards: args.shards,
        num_replicas: args.replicas,
        f_val: args.f_val,
        host: args.host,
        base_port: args.base_port,
        seed: None,
    };
    let generated = init.generate()?;
    let cluster_path = generated.write(&args.out)?;
    println!(
        "wrote {} ({} shards x {} replicas, threshold {})",
        cluster_path.display(),
        generated.cluster.num_shards,
        generated.cluster.num_replicas,
        generated.cluster.threshold()
    );
    Ok(())
}
