//! Prometheus metrics for burn/mint nodes.
//!
//! All metrics follow the naming convention: `xs_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // REPLICA METRICS
    // =========================================================================

    /// Burn requests by result: `accepted` or the rejection reason
    pub static ref BURN_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("xs_replica_burn_requests_total", "Burn requests handled"),
        &["result"]
    ).expect("metric creation failed");

    /// Mint requests by result: `accepted` or the rejection reason
    pub static ref MINT_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("xs_replica_mint_requests_total", "Mint requests handled"),
        &["result"]
    ).expect("metric creation failed");

    /// Frames that closed a connection, by error kind
    pub static ref MALFORMED_FRAMES: CounterVec = CounterVec::new(
        Opts::new("xs_wire_malformed_frames_total", "Malformed frames received"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // CLIENT METRICS
    // =========================================================================

    /// Quorums formed, by phase (burn/mint)
    pub static ref QUORUMS_FORMED: CounterVec = CounterVec::new(
        Opts::new("xs_client_quorums_formed_total", "Quorum certificates assembled"),
        &["phase"]
    ).expect("metric creation failed");

    /// Responses dropped before counting, by reason
    pub static ref RESPONSES_DROPPED: CounterVec = CounterVec::new(
        Opts::new("xs_client_responses_dropped_total", "Responses dropped by the client"),
        &["reason"]
    ).expect("metric creation failed");

    /// Transactions finished, by outcome (completed/stalled)
    pub static ref TRANSACTIONS: CounterVec = CounterVec::new(
        Opts::new("xs_client_transactions_total", "Transactions finished by the client"),
        &["outcome"]
    ).expect("metric creation failed");

    /// End-to-end burn+mint latency
    pub static ref TRANSACTION_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "xs_client_transaction_latency_seconds",
            "Time from first burn request to mint quorum"
        ).buckets(exponential_buckets(0.0005, 2.0, 16).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Live replica connections held by the client
    pub static ref CONNECTIONS_LIVE: Gauge = Gauge::new(
        "xs_client_connections_live",
        "Replica connections currently open"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Repeated calls are no-ops.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Replica
        Box::new(BURN_REQUESTS.clone()),
        Box::new(MINT_REQUESTS.clone()),
        Box::new(MALFORMED_FRAMES.clone()),
        // Client
        Box::new(QUORUMS_FORMED.clone()),
        Box::new(RESPONSES_DROPPED.clone()),
        Box::new(TRANSACTIONS.clone()),
        Box::new(TRANSACTION_LATENCY.clone()),
        Box::new(CONNECTIONS_LIVE.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all registered metrics in the Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
