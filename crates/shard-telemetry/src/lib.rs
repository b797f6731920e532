//! # Shard Telemetry
//!
//! Structured logging and Prometheus metrics for `xs-node` processes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shard_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::for_role("replica"))?;
//!     // tracing macros and metrics are live from here on
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XS_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `XS_JSON_LOGS` | `false` | JSON log lines |
//! | `XS_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `XS_SERVICE_NAME` | `xs-node` | Service name in startup logs |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_text, register_metrics, BURN_REQUESTS, CONNECTIONS_LIVE, MALFORMED_FRAMES,
    MINT_REQUESTS, QUORUMS_FORMED, REGISTRY, RESPONSES_DROPPED, TRANSACTIONS,
    TRANSACTION_LATENCY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics, then install the logging subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_inc_macro() {
        metric_inc!(RESPONSES_DROPPED, &["stale"]);
        assert!(RESPONSES_DROPPED.with_label_values(&["stale"]).get() >= 1.0);
    }
}
