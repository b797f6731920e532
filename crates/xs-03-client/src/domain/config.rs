//! Client runtime knobs.

use std::time::Duration;

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Client id; fixes the mint shard (`client_id mod num_shards`).
    pub client_id: u64,
    /// Transactions to run before terminating.
    pub transactions: u64,
    /// Deadline for establishing replica connections.
    pub connect_timeout: Duration,
    /// Per-phase response deadline.
    pub response_timeout: Duration,
    /// Re-sends of a phase's requests before the transaction is abandoned.
    pub max_retries: u32,
    /// Upper bound on the backed-off response deadline.
    pub max_backoff: Duration,
    /// Check receipt signatures against configured replica keys.
    pub verify_receipts: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: 0,
            transactions: 1,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(10),
            max_retries: 0,
            max_backoff: Duration::from_secs(60),
            verify_receipts: true,
        }
    }
}

impl ClientConfig {
    /// Short deadlines for tests.
    pub fn for_testing(client_id: u64, transactions: u64) -> Self {
        Self {
            client_id,
            transactions,
            connect_timeout: Duration::from_millis(200),
            response_timeout: Duration::from_millis(200),
            max_retries: 0,
            max_backoff: Duration::from_secs(1),
            verify_receipts: true,
        }
    }

    /// Response deadline for the given attempt: doubles per retry, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.response_timeout
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}
