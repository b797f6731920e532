//! # Quorum Collector
//!
//! Accumulates signed responses per shard for the active transaction and
//! hands the assembled set over exactly once, when the number of distinct
//! signers reaches `num_replicas - f_val`.
//!
//! One mutex guards the whole response map. `add` holds it only for the
//! read-modify-write, so concurrent callers race for the threshold and exactly
//! one of them observes [`AddOutcome::Complete`].

use parking_lot::Mutex;
use shared_types::{ReplicaId, ShardId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Key of a pending quorum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QuorumKey {
    /// Shard the responses come from.
    pub shard_id: ShardId,
    /// Client transaction index.
    pub tx_index: u64,
}

/// Result of [`QuorumCollector::add`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddOutcome<P> {
    /// Counted; `count` distinct signers so far.
    Pending {
        /// Distinct signers for this key.
        count: usize,
    },
    /// Threshold reached by this call. Signers in ascending replica order.
    Complete(Vec<(ReplicaId, P)>),
    /// Replica already counted for this key.
    Duplicate,
    /// Key reached its quorum earlier.
    AlreadyFinished,
    /// Transaction index is not the active one.
    Stale,
}

#[derive(Debug)]
struct CollectorState<P> {
    active_tx: Option<u64>,
    pending: HashMap<ShardId, BTreeMap<ReplicaId, P>>,
    finished: BTreeSet<ShardId>,
}

/// Per-(shard, tx index) distinct-signer accumulator.
#[derive(Debug)]
pub struct QuorumCollector<P> {
    threshold: usize,
    state: Mutex<CollectorState<P>>,
}

impl<P> QuorumCollector<P> {
    /// Collector handing over sets of `threshold` distinct signers.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            state: Mutex::new(CollectorState {
                active_tx: None,
                pending: HashMap::new(),
                finished: BTreeSet::new(),
            }),
        }
    }

    /// Quorum size.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Make `tx_index` the active transaction, discarding everything collected
    /// for the previous one.
    pub fn begin(&self, tx_index: u64) {
        let mut state = self.state.lock();
        state.active_tx = Some(tx_index);
        state.pending.clear();
        state.finished.clear();
    }

    /// Count `payload` from `replica_id` towards `key`.
    pub fn add(&self, key: QuorumKey, replica_id: ReplicaId, payload: P) -> AddOutcome<P> {
        let mut state = self.state.lock();

        if state.active_tx != Some(key.tx_index) {
            debug!(
                shard_id = key.shard_id,
                replica_id,
                tx_index = key.tx_index,
                "[xs-03] Stale response dropped"
            );
            return AddOutcome::Stale;
        }
        if state.finished.contains(&key.shard_id) {
            debug!(
                shard_id = key.shard_id,
                replica_id, "[xs-03] Response after quorum dropped"
            );
            return AddOutcome::AlreadyFinished;
        }

        let responses = state.pending.entry(key.shard_id).or_default();
        if responses.contains_key(&replica_id) {
            debug!(
                shard_id = key.shard_id,
                replica_id, "[xs-03] Duplicate signer dropped"
            );
            return AddOutcome::Duplicate;
        }
        responses.insert(replica_id, payload);

        let count = responses.len();
        if count < self.threshold {
            return AddOutcome::Pending { count };
        }

        let assembled = state
            .pending
            .remove(&key.shard_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        state.finished.insert(key.shard_id);
        AddOutcome::Complete(assembled)
    }

    /// Distinct signers counted for `shard_id`; the threshold once finished.
    pub fn size(&self, shard_id: ShardId) -> usize {
        let state = self.state.lock();
        if state.finished.contains(&shard_id) {
            return self.threshold;
        }
        state.pending.get(&shard_id).map_or(0, BTreeMap::len)
    }

    /// Whether `shard_id` already reached its quorum.
    pub fn is_finished(&self, shard_id: ShardId) -> bool {
        self.state.lock().finished.contains(&shard_id)
    }

    /// Drop all state; every arrival is stale until the next `begin`.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.active_tx = None;
        state.pending.clear();
        state.finished.clear();
    }
}
