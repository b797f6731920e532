//! Per-transaction latency accumulator.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shard_telemetry::TRANSACTION_LATENCY;
use std::time::Duration;

/// Aggregate latency figures for a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LatencySummary {
    /// Samples recorded.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: Duration,
    /// Median.
    pub p50: Duration,
    /// 99th percentile.
    pub p99: Duration,
    /// Fastest transaction.
    pub min: Duration,
    /// Slowest transaction.
    pub max: Duration,
}

/// Samples kept for percentiles. Past this, a uniform reservoir stands in
/// for the full run; count, mean, min and max stay exact.
pub const MAX_SAMPLES: usize = 100_000;

#[derive(Debug)]
struct Samples {
    reservoir: Vec<Duration>,
    seen: usize,
    total: Duration,
    min: Duration,
    max: Duration,
    rng: StdRng,
}

/// Latency samples behind their own lock, separate from the collectors.
#[derive(Debug)]
pub struct LatencyStats {
    capacity: usize,
    samples: Mutex<Samples>,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }
}

impl LatencyStats {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty accumulator retaining at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: Mutex::new(Samples {
                reservoir: Vec::new(),
                seen: 0,
                total: Duration::ZERO,
                min: Duration::MAX,
                max: Duration::ZERO,
                rng: StdRng::from_entropy(),
            }),
        }
    }

    /// Record one completed transaction.
    pub fn record(&self, latency: Duration) {
        TRANSACTION_LATENCY.observe(latency.as_secs_f64());

        let mut guard = self.samples.lock();
        let samples = &mut *guard;
        samples.seen += 1;
        samples.total = samples.total.saturating_add(latency);
        samples.min = samples.min.min(latency);
        samples.max = samples.max.max(latency);

        if samples.reservoir.len() < self.capacity {
            samples.reservoir.push(latency);
        } else {
            let slot = samples.rng.gen_range(0..samples.seen);
            if slot < self.capacity {
                samples.reservoir[slot] = latency;
            }
        }
    }

    /// Samples recorded so far.
    pub fn count(&self) -> usize {
        self.samples.lock().seen
    }

    /// Samples currently held for percentiles.
    pub fn retained(&self) -> usize {
        self.samples.lock().reservoir.len()
    }

    /// Snapshot summary.
    pub fn summary(&self) -> LatencySummary {
        let (mut retained, count, total, min, max) = {
            let samples = self.samples.lock();
            (
                samples.reservoir.clone(),
                samples.seen,
                samples.total,
                samples.min,
                samples.max,
            )
        };
        if count == 0 {
            return LatencySummary::default();
        }
        retained.sort_unstable();

        let kept = retained.len();
        let nth = |q: f64| retained[((kept as f64 * q).ceil() as usize).clamp(1, kept) - 1];

        LatencySummary {
            count,
            mean: Duration::from_nanos((total.as_nanos() / count as u128) as u64),
            p50: nth(0.50),
            p99: nth(0.99),
            min,
            max,
        }
    }
}
