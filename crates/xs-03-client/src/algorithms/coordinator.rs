//! # Client Coordinator
//!
//! Two-phase burn/mint state machine. Every completion (connection change,
//! decoded response, timer) arrives as a [`ClientEvent`] on one dispatch loop;
//! the coordinator sends requests through the [`Transport`] port and answers
//! with timer [`Action`]s.
//!
//! ```text
//! Connecting ─► BurningAllResponsibleShards ─► AwaitingBurnQuorums
//!                      ▲                              │ all certificates
//!                      │ next tx                      ▼
//!                    Idle ◄─ AwaitingMintQuorum ◄─ Minting ◄─ BuildingMintProof
//!                      │
//!                      └─► Done
//! ```
//!
//! Timers are tagged with `(phase, seq, attempt)`; a fired timer that is not
//! the one currently armed is ignored, so cancelling is always best-effort.

use crate::algorithms::quorum_collector::{AddOutcome, QuorumCollector, QuorumKey};
use crate::algorithms::receipts::{verify_receipt, ReceiptKind};
use crate::domain::{
    Action, ClientConfig, ClientError, ClientEvent, CoordinatorState, Phase, RunReport, TimerId,
};
use crate::ports::{TransactionSource, Transport};
use crate::stats::LatencyStats;
use shard_telemetry::{CONNECTIONS_LIVE, QUORUMS_FORMED, RESPONSES_DROPPED, TRANSACTIONS};
use shared_types::{
    mint_shard_for_client, responsible_shards, BurnReceipt, ClusterConfig, Hash, MintProof,
    QuorumCertificate, QuorumParams, ReplicaId, ShardId, SignerDirectory, Transaction,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use xs_01_wire_codec::{BurnRequest, Message, MintRequest, SignedResponse};

/// The transaction currently being moved.
struct InFlight {
    seq: u64,
    tx: Transaction,
    tx_hash: Hash,
    outputs_digest: Hash,
    responsible: BTreeSet<ShardId>,
    mint_shard: ShardId,
    proof: MintProof,
    started: Instant,
    attempt: u32,
    timer: Option<TimerId>,
}

/// Client-side burn/mint driver.
pub struct ClientCoordinator {
    config: ClientConfig,
    num_shards: u32,
    quorum: QuorumParams,
    signers: SignerDirectory,
    transport: Arc<dyn Transport>,
    source: Box<dyn TransactionSource>,

    state: CoordinatorState,
    live: BTreeSet<(ShardId, ReplicaId)>,
    burn_quorums: QuorumCollector<Vec<u8>>,
    mint_quorums: QuorumCollector<Vec<u8>>,
    in_flight: Option<InFlight>,
    next_seq: u64,

    stats: Arc<LatencyStats>,
    completed: u64,
    stalled: u64,
    run_started: Option<Instant>,
}

impl ClientCoordinator {
    /// Coordinator for a validated cluster.
    pub fn new(
        config: ClientConfig,
        cluster: &ClusterConfig,
        transport: Arc<dyn Transport>,
        source: Box<dyn TransactionSource>,
    ) -> Result<Self, ClientError> {
        cluster.validate()?;
        let quorum = cluster.quorum();
        let threshold = quorum.threshold();

        Ok(Self {
            config,
            num_shards: cluster.num_shards,
            quorum,
            signers: cluster.signer_directory()?,
            transport,
            source,
            state: CoordinatorState::Connecting,
            live: BTreeSet::new(),
            burn_quorums: QuorumCollector::new(threshold),
            mint_quorums: QuorumCollector::new(threshold),
            in_flight: None,
            next_seq: 0,
            stats: Arc::new(LatencyStats::new()),
            completed: 0,
            stalled: 0,
            run_started: None,
        })
    }

    /// Current state.
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Latency samples of completed transactions.
    pub fn stats(&self) -> Arc<LatencyStats> {
        Arc::clone(&self.stats)
    }

    /// Live connections.
    pub fn live_connections(&self) -> usize {
        self.live.len()
    }

    /// Index of the transaction in flight.
    pub fn current_seq(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|f| f.seq)
    }

    /// Outcome counts so far.
    pub fn report(&self) -> RunReport {
        RunReport {
            completed: self.completed,
            stalled: self.stalled,
            elapsed: self
                .run_started
                .map(|t| t.elapsed())
                .unwrap_or_default(),
        }
    }

    /// Arm the connection deadline.
    pub fn start(&mut self) -> Vec<Action> {
        info!(
            client_id = self.config.client_id,
            transactions = self.config.transactions,
            num_shards = self.num_shards,
            threshold = self.quorum.threshold(),
            "[xs-03] Connecting to cluster"
        );
        vec![Action::ArmTimer {
            id: TimerId::CONNECT,
            after: self.config.connect_timeout,
        }]
    }

    /// Process one event.
    ///
    /// Only the connection-quorum check at the connect deadline is fatal.
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<Action>, ClientError> {
        if self.state == CoordinatorState::Done {
            return Ok(Vec::new());
        }
        match event {
            ClientEvent::Connected {
                shard_id,
                replica_id,
            } => self.on_connected(shard_id, replica_id),
            ClientEvent::Disconnected {
                shard_id,
                replica_id,
            } => {
                if self.live.remove(&(shard_id, replica_id)) {
                    CONNECTIONS_LIVE.dec();
                    warn!(shard_id, replica_id, "[xs-03] Replica connection lost");
                }
                Ok(Vec::new())
            }
            ClientEvent::Response {
                shard_id,
                replica_id,
                message,
            } => self.on_response(shard_id, replica_id, message),
            ClientEvent::TimerFired(id) => self.on_timer(id),
        }
    }

    fn total_replicas(&self) -> usize {
        self.num_shards as usize * self.quorum.num_replicas as usize
    }

    fn on_connected(
        &mut self,
        shard_id: ShardId,
        replica_id: ReplicaId,
    ) -> Result<Vec<Action>, ClientError> {
        if shard_id >= self.num_shards || replica_id >= self.quorum.num_replicas {
            warn!(shard_id, replica_id, "[xs-03] Connection to unknown replica ignored");
            return Ok(Vec::new());
        }
        if self.live.insert((shard_id, replica_id)) {
            CONNECTIONS_LIVE.inc();
            debug!(shard_id, replica_id, "[xs-03] Replica connected");
        }

        if self.state == CoordinatorState::Connecting && self.live.len() == self.total_replicas() {
            info!(connections = self.live.len(), "[xs-03] All replica connections up");
            let mut actions = vec![Action::CancelTimer(TimerId::CONNECT)];
            actions.extend(self.begin_run()?);
            return Ok(actions);
        }
        Ok(Vec::new())
    }

    fn on_timer(&mut self, id: TimerId) -> Result<Vec<Action>, ClientError> {
        if id.phase == Phase::Connect {
            if self.state != CoordinatorState::Connecting {
                return Ok(Vec::new());
            }
            self.check_connection_quorum()?;
            return self.begin_run();
        }

        let current = self.in_flight.as_ref().and_then(|f| f.timer);
        if current != Some(id) {
            debug!(?id, "[xs-03] Stale timer ignored");
            return Ok(Vec::new());
        }
        self.on_phase_timeout(id)
    }

    /// At the connect deadline: every shard needs at least `threshold` live
    /// replicas, otherwise the run cannot make progress.
    fn check_connection_quorum(&self) -> Result<(), ClientError> {
        if self.live.len() == self.total_replicas() {
            return Ok(());
        }
        let required = self.quorum.threshold();
        for shard_id in 0..self.num_shards {
            let live = self.live.iter().filter(|(s, _)| *s == shard_id).count();
            if live < required {
                return Err(ClientError::InsufficientConnections {
                    shard_id,
                    live,
                    required,
                });
            }
        }
        warn!(
            connections = self.live.len(),
            total = self.total_replicas(),
            "[xs-03] Proceeding with degraded connectivity"
        );
        Ok(())
    }

    fn begin_run(&mut self) -> Result<Vec<Action>, ClientError> {
        self.run_started = Some(Instant::now());
        self.begin_next()
    }

    fn begin_next(&mut self) -> Result<Vec<Action>, ClientError> {
        if self.next_seq >= self.config.transactions {
            return Ok(vec![self.finish()]);
        }
        let seq = self.next_seq;
        self.next_seq += 1;

        let tx = self.source.next_transaction(seq)?;
        let responsible = responsible_shards(&tx.inputs, self.num_shards);
        let flight = InFlight {
            seq,
            tx_hash: tx.tx_hash()?,
            outputs_digest: tx.outputs_digest(),
            mint_shard: mint_shard_for_client(self.config.client_id, self.num_shards),
            responsible,
            tx,
            proof: MintProof::new(),
            started: Instant::now(),
            attempt: 0,
            timer: None,
        };
        self.burn_quorums.begin(seq);
        self.mint_quorums.begin(seq);

        self.state = CoordinatorState::BurningAllResponsibleShards;
        debug!(
            seq,
            shards = ?flight.responsible,
            mint_shard = flight.mint_shard,
            "[xs-03] Burning transaction"
        );
        self.in_flight = Some(flight);

        if self.proof_complete() {
            return self.start_mint(Vec::new());
        }
        self.send_burns();
        self.state = CoordinatorState::AwaitingBurnQuorums;
        Ok(self.arm_timer(Phase::Burn).into_iter().collect())
    }

    fn finish(&mut self) -> Action {
        self.state = CoordinatorState::Done;
        self.in_flight = None;
        self.burn_quorums.clear();
        self.mint_quorums.clear();
        let report = self.report();
        info!(
            completed = report.completed,
            stalled = report.stalled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "[xs-03] Run finished"
        );
        Action::Finished(report)
    }

    fn arm_timer(&mut self, phase: Phase) -> Option<Action> {
        let flight = self.in_flight.as_mut()?;
        let id = TimerId {
            phase,
            seq: flight.seq,
            attempt: flight.attempt,
        };
        flight.timer = Some(id);
        Some(Action::ArmTimer {
            id,
            after: self.config.backoff(flight.attempt),
        })
    }

    fn cancel_timer(&mut self) -> Option<Action> {
        self.in_flight
            .as_mut()
            .and_then(|f| f.timer.take())
            .map(Action::CancelTimer)
    }

    fn live_replicas(&self, shard_id: ShardId) -> Vec<ReplicaId> {
        self.live
            .iter()
            .filter(|(s, _)| *s == shard_id)
            .map(|(_, r)| *r)
            .collect()
    }

    fn send(&self, shard_id: ShardId, replica_id: ReplicaId, message: Message) {
        if let Err(err) = self.transport.send(shard_id, replica_id, message) {
            warn!(shard_id, replica_id, error = %err, "[xs-03] Send failed");
        }
    }

    /// Burn requests to every live replica of every responsible shard that has
    /// no certificate yet.
    fn send_burns(&self) {
        let Some(flight) = self.in_flight.as_ref() else {
            return;
        };
        for &shard_id in &flight.responsible {
            if self.burn_quorums.is_finished(shard_id) {
                continue;
            }
            let request = BurnRequest {
                seq: flight.seq,
                target_shard: u64::from(shard_id),
                tx: flight.tx.clone(),
            };
            for replica_id in self.live_replicas(shard_id) {
                self.send(shard_id, replica_id, Message::BurnRequest(request.clone()));
            }
        }
    }

    fn send_mints(&self) {
        let Some(flight) = self.in_flight.as_ref() else {
            return;
        };
        let request = MintRequest {
            seq: flight.seq,
            client_id: self.config.client_id,
            tx: flight.tx.clone(),
            proof: flight.proof.clone(),
        };
        for replica_id in self.live_replicas(flight.mint_shard) {
            self.send(
                flight.mint_shard,
                replica_id,
                Message::MintRequest(request.clone()),
            );
        }
    }

    fn proof_complete(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| f.proof.covers_exactly(&f.responsible))
    }

    fn start_mint(&mut self, mut actions: Vec<Action>) -> Result<Vec<Action>, ClientError> {
        self.state = CoordinatorState::BuildingMintProof;
        if let Some(flight) = self.in_flight.as_mut() {
            flight.attempt = 0;
            debug!(
                seq = flight.seq,
                certificates = flight.proof.len(),
                mint_shard = flight.mint_shard,
                "[xs-03] Mint proof assembled"
            );
        }
        self.state = CoordinatorState::Minting;
        self.send_mints();
        self.state = CoordinatorState::AwaitingMintQuorum;
        actions.extend(self.arm_timer(Phase::Mint));
        Ok(actions)
    }

    fn drop_response(&self, reason: &str, shard_id: ShardId, replica_id: ReplicaId, seq: u64) {
        RESPONSES_DROPPED.with_label_values(&[reason]).inc();
        debug!(shard_id, replica_id, seq, reason, "[xs-03] Response dropped");
    }

    fn on_response(
        &mut self,
        shard_id: ShardId,
        replica_id: ReplicaId,
        message: Message,
    ) -> Result<Vec<Action>, ClientError> {
        let (phase, response) = match message {
            Message::BurnResponse(r) => (Phase::Burn, r),
            Message::MintResponse(r) => (Phase::Mint, r),
            other => {
                self.drop_response("unexpected_type", shard_id, replica_id, other.seq());
                return Ok(Vec::new());
            }
        };

        // The connection identity is authoritative.
        if response.shard_id != shard_id || response.replica_id != replica_id {
            self.drop_response("identity_mismatch", shard_id, replica_id, response.seq);
            return Ok(Vec::new());
        }

        if let Some(reason) = self.admission_failure(phase, &response) {
            self.drop_response(reason, shard_id, replica_id, response.seq);
            return Ok(Vec::new());
        }

        let key = QuorumKey {
            shard_id,
            tx_index: response.seq,
        };
        let collector = match phase {
            Phase::Mint => &self.mint_quorums,
            _ => &self.burn_quorums,
        };
        match collector.add(key, replica_id, response.signature) {
            AddOutcome::Pending { count } => {
                debug!(shard_id, replica_id, seq = response.seq, count, ?phase, "[xs-03] Receipt counted");
                Ok(Vec::new())
            }
            AddOutcome::Duplicate => {
                self.drop_response("duplicate", shard_id, replica_id, response.seq);
                Ok(Vec::new())
            }
            AddOutcome::AlreadyFinished => {
                self.drop_response("already_finished", shard_id, replica_id, response.seq);
                Ok(Vec::new())
            }
            AddOutcome::Stale => {
                self.drop_response("stale", shard_id, replica_id, response.seq);
                Ok(Vec::new())
            }
            AddOutcome::Complete(signers) => match phase {
                Phase::Mint => self.on_mint_quorum(),
                _ => self.on_burn_quorum(shard_id, signers),
            },
        }
    }

    /// Checks that need the in-flight transaction. Responses for any other
    /// index skip them and are dropped as stale by the collector.
    fn admission_failure(&self, phase: Phase, response: &SignedResponse) -> Option<&'static str> {
        let flight = self.in_flight.as_ref()?;
        if response.seq != flight.seq {
            return None;
        }

        let (expected, kind, digest) = match phase {
            Phase::Mint => (
                response.shard_id == flight.mint_shard,
                ReceiptKind::Mint,
                &flight.outputs_digest,
            ),
            _ => (
                flight.responsible.contains(&response.shard_id),
                ReceiptKind::Burn,
                &flight.tx_hash,
            ),
        };
        if !expected {
            return Some("unexpected_shard");
        }
        if self.config.verify_receipts
            && !verify_receipt(
                &self.signers,
                kind,
                response.shard_id,
                response.replica_id,
                digest,
                &response.signature,
            )
        {
            return Some("bad_signature");
        }
        None
    }

    fn on_burn_quorum(
        &mut self,
        shard_id: ShardId,
        signers: Vec<(ReplicaId, Vec<u8>)>,
    ) -> Result<Vec<Action>, ClientError> {
        QUORUMS_FORMED.with_label_values(&["burn"]).inc();
        let Some(flight) = self.in_flight.as_mut() else {
            return Ok(Vec::new());
        };

        let receipts = signers
            .into_iter()
            .map(|(replica_id, signature)| BurnReceipt {
                replica_id,
                shard_id,
                signature,
            })
            .collect();
        flight
            .proof
            .insert(shard_id, QuorumCertificate::new(shard_id, receipts));
        debug!(
            seq = flight.seq,
            shard_id,
            have = flight.proof.len(),
            need = flight.responsible.len(),
            "[xs-03] Burn certificate formed"
        );

        if !self.proof_complete() {
            return Ok(Vec::new());
        }
        let actions = self.cancel_timer().into_iter().collect();
        self.start_mint(actions)
    }

    fn on_mint_quorum(&mut self) -> Result<Vec<Action>, ClientError> {
        QUORUMS_FORMED.with_label_values(&["mint"]).inc();
        let mut actions: Vec<Action> = self.cancel_timer().into_iter().collect();

        if let Some(flight) = self.in_flight.take() {
            let latency = flight.started.elapsed();
            self.stats.record(latency);
            self.completed += 1;
            TRANSACTIONS.with_label_values(&["completed"]).inc();
            info!(
                seq = flight.seq,
                latency_us = latency.as_micros() as u64,
                "[xs-03] Transaction complete"
            );
        }

        self.state = CoordinatorState::Idle;
        actions.extend(self.begin_next()?);
        Ok(actions)
    }

    fn on_phase_timeout(&mut self, id: TimerId) -> Result<Vec<Action>, ClientError> {
        let Some(flight) = self.in_flight.as_mut() else {
            return Ok(Vec::new());
        };
        flight.timer = None;

        if flight.attempt < self.config.max_retries {
            flight.attempt += 1;
            warn!(
                seq = id.seq,
                phase = ?id.phase,
                attempt = flight.attempt,
                "[xs-03] Phase timed out, retrying"
            );
            match id.phase {
                Phase::Mint => self.send_mints(),
                _ => self.send_burns(),
            }
            return Ok(self.arm_timer(id.phase).into_iter().collect());
        }

        let pending: HashMap<ShardId, usize> = match id.phase {
            Phase::Mint => [(flight.mint_shard, self.mint_quorums.size(flight.mint_shard))]
                .into_iter()
                .collect(),
            _ => flight
                .responsible
                .iter()
                .filter(|s| !self.burn_quorums.is_finished(**s))
                .map(|s| (*s, self.burn_quorums.size(*s)))
                .collect(),
        };
        warn!(
            seq = id.seq,
            phase = ?id.phase,
            ?pending,
            "[xs-03] Phase timed out, abandoning transaction"
        );

        self.in_flight = None;
        self.burn_quorums.clear();
        self.mint_quorums.clear();
        self.stalled += 1;
        TRANSACTIONS.with_label_values(&["stalled"]).inc();

        self.state = CoordinatorState::Idle;
        self.begin_next()
    }
}
