//! Single-process replication engine.
//!
//! Executes requests one at a time under a mutex and remembers the response to
//! each executed request digest, so redelivery returns the original receipt
//! instead of running the handler again.

use crate::domain::{ReplicaError, ReplicaRequest};
use crate::ports::{ReplicationEngine, RequestExecutor};
use parking_lot::Mutex;
use shared_types::Hash;
use std::collections::{HashMap, VecDeque};
use xs_01_wire_codec::SignedResponse;

/// Default number of remembered responses.
pub const DEFAULT_RESPONSE_CACHE: usize = 16_384;

#[derive(Default)]
struct EngineState {
    executed: HashMap<Hash, SignedResponse>,
    order: VecDeque<Hash>,
}

/// Serializing engine for a replica that is its own ordering authority.
pub struct LocalReplicationEngine {
    state: Mutex<EngineState>,
    capacity: usize,
}

impl Default for LocalReplicationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_CACHE)
    }
}

impl LocalReplicationEngine {
    /// Engine remembering up to `capacity` responses.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(EngineState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Number of remembered responses.
    pub fn executed_count(&self) -> usize {
        self.state.lock().executed.len()
    }
}

impl ReplicationEngine for LocalReplicationEngine {
    fn deliver(
        &self,
        request: &ReplicaRequest,
        executor: &dyn RequestExecutor,
    ) -> Result<SignedResponse, ReplicaError> {
        let digest = request.digest()?;
        let mut state = self.state.lock();

        if let Some(response) = state.executed.get(&digest) {
            tracing::debug!(
                seq = request.seq(),
                kind = request.kind(),
                "[xs-02] Redelivered request, returning recorded response"
            );
            return Ok(response.clone());
        }

        let response = executor.execute(request)?;

        if state.order.len() >= self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.executed.remove(&oldest);
            }
        }
        state.order.push_back(digest);
        state.executed.insert(digest, response.clone());
        Ok(response)
    }
}
