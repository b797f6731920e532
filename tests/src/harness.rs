//! # Test Harness
//!
//! An in-process cluster of real replica services plus a driver that runs a
//! [`ClientCoordinator`] against it without sockets or wall-clock timers:
//! requests are delivered synchronously, and when the network goes quiet the
//! most recently armed timer fires.

use parking_lot::Mutex;
use shared_types::{
    burn_signing_message, BurnReceipt, ClusterConfig, MintProof, Nullifier, QuorumCertificate,
    QuorumParams, ReplicaId, ShardId, Transaction, ROUTING_FIELD_OFFSET,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use xs_01_wire_codec::Message;
use xs_02_replica::{
    CredentialProvider, Ed25519Credentials, InMemoryAntiReplayStore, LocalReplicationEngine,
    ReplicaApi, ReplicaConfig, ReplicaService,
};
use xs_03_client::{
    Action, ClientConfig, ClientCoordinator, ClientError, ClientEvent, FixedWorkload, RunReport,
    TimerId, Transport,
};

/// Deterministic ed25519 seed of a slot.
pub fn seed_of(shard_id: ShardId, replica_id: ReplicaId) -> [u8; 32] {
    *blake3::hash(format!("xs-tests/{shard_id}/{replica_id}").as_bytes()).as_bytes()
}

/// A 32-byte nullifier routed to `shard_id`.
pub fn nullifier_on(shard_id: ShardId, salt: u8) -> Nullifier {
    let mut bytes = vec![salt; 32];
    bytes[ROUTING_FIELD_OFFSET..ROUTING_FIELD_OFFSET + 2]
        .copy_from_slice(&(shard_id as u16).to_be_bytes());
    Nullifier::new(bytes).expect("32 bytes")
}

/// A transaction spending one nullifier on each of `shards`.
pub fn tx_on(shards: &[ShardId], salt: u8) -> Transaction {
    Transaction::new(
        shards.iter().map(|s| nullifier_on(*s, salt)).collect(),
        vec![[salt; 32], [salt.wrapping_add(1); 32]],
    )
}

/// Every replica of a cluster, in process.
pub struct LocalCluster {
    /// Cluster description shared by all participants.
    pub cluster: ClusterConfig,
    replicas: HashMap<(ShardId, ReplicaId), Arc<ReplicaService>>,
}

impl LocalCluster {
    /// Fresh cluster with empty anti-replay stores.
    pub fn new(num_shards: u32, num_replicas: u32, f_val: u32) -> Self {
        let quorum = QuorumParams::new(num_replicas, f_val).expect("valid quorum");
        let cluster = ClusterConfig::generate(
            num_shards,
            quorum,
            |s, r| format!("127.0.0.1:{}", 20_000 + s * num_replicas + r),
            |s, r| Ed25519Credentials::from_seed(&seed_of(s, r)).public_key(),
        )
        .expect("valid cluster");

        let signers = cluster.signer_directory().expect("valid keys");
        let replicas = cluster
            .all_replicas()
            .into_iter()
            .map(|(s, r)| {
                let service = ReplicaService::new(
                    ReplicaConfig::from_cluster(&cluster, s, r).expect("slot exists"),
                    Arc::new(Ed25519Credentials::from_seed(&seed_of(s, r))),
                    Arc::new(InMemoryAntiReplayStore::new()),
                    Arc::new(LocalReplicationEngine::default()),
                    signers.clone(),
                );
                ((s, r), Arc::new(service))
            })
            .collect();

        Self { cluster, replicas }
    }

    /// The replica serving a slot.
    pub fn replica(&self, shard_id: ShardId, replica_id: ReplicaId) -> &Arc<ReplicaService> {
        &self.replicas[&(shard_id, replica_id)]
    }

    /// Signing credentials of a slot.
    pub fn credentials(&self, shard_id: ShardId, replica_id: ReplicaId) -> Ed25519Credentials {
        Ed25519Credentials::from_seed(&seed_of(shard_id, replica_id))
    }

    /// Deliver a request to one replica.
    pub fn deliver(
        &self,
        shard_id: ShardId,
        replica_id: ReplicaId,
        message: Message,
    ) -> Option<Message> {
        self.replicas
            .get(&(shard_id, replica_id))?
            .handle_message(message)
    }

    /// Burn certificate for `tx` signed directly by `signers`, bypassing the
    /// replicas' stores.
    pub fn certificate(
        &self,
        shard_id: ShardId,
        signers: &[ReplicaId],
        tx: &Transaction,
    ) -> QuorumCertificate {
        let message = burn_signing_message(shard_id, &tx.tx_hash().expect("hashable"));
        let receipts = signers
            .iter()
            .map(|&replica_id| BurnReceipt {
                replica_id,
                shard_id,
                signature: self.credentials(shard_id, replica_id).sign(&message),
            })
            .collect();
        QuorumCertificate::new(shard_id, receipts)
    }

    /// Proof with one threshold-sized certificate per shard.
    pub fn proof(&self, shards: &[ShardId], tx: &Transaction) -> MintProof {
        let signers: Vec<ReplicaId> = (0..self.cluster.threshold() as ReplicaId).collect();
        let mut proof = MintProof::new();
        for &shard_id in shards {
            proof.insert(shard_id, self.certificate(shard_id, &signers, tx));
        }
        proof
    }
}

/// Transport that only queues; the driver delivers.
#[derive(Default)]
pub struct QueueTransport {
    queue: Mutex<VecDeque<(ShardId, ReplicaId, Message)>>,
}

impl QueueTransport {
    /// Take everything sent so far.
    pub fn drain(&self) -> Vec<(ShardId, ReplicaId, Message)> {
        self.queue.lock().drain(..).collect()
    }
}

impl Transport for QueueTransport {
    fn send(
        &self,
        shard_id: ShardId,
        replica_id: ReplicaId,
        message: Message,
    ) -> Result<(), ClientError> {
        self.queue.lock().push_back((shard_id, replica_id, message));
        Ok(())
    }
}

/// Runs one coordinator against a [`LocalCluster`].
pub struct Driver<'a> {
    local: &'a LocalCluster,
    transport: Arc<QueueTransport>,
    coordinator: ClientCoordinator,
    down: HashSet<(ShardId, ReplicaId)>,
    silent: HashSet<(ShardId, ReplicaId)>,
    forging: HashSet<(ShardId, ReplicaId)>,
    /// Requests delivered to replicas.
    pub delivered: usize,
}

impl<'a> Driver<'a> {
    /// Coordinator running `txs` in order.
    pub fn new(local: &'a LocalCluster, config: ClientConfig, txs: Vec<Transaction>) -> Self {
        let transport = Arc::new(QueueTransport::default());
        let coordinator = ClientCoordinator::new(
            config,
            &local.cluster,
            transport.clone(),
            Box::new(FixedWorkload::new(txs)),
        )
        .expect("valid cluster");
        Self {
            local,
            transport,
            coordinator,
            down: HashSet::new(),
            silent: HashSet::new(),
            forging: HashSet::new(),
            delivered: 0,
        }
    }

    /// Never connects.
    pub fn down(mut self, shard_id: ShardId, replica_id: ReplicaId) -> Self {
        self.down.insert((shard_id, replica_id));
        self
    }

    /// Connects, processes requests, never answers.
    pub fn silent(mut self, shard_id: ShardId, replica_id: ReplicaId) -> Self {
        self.silent.insert((shard_id, replica_id));
        self
    }

    /// Answers with a corrupted signature.
    pub fn forging(mut self, shard_id: ShardId, replica_id: ReplicaId) -> Self {
        self.forging.insert((shard_id, replica_id));
        self
    }

    /// The coordinator under test.
    pub fn coordinator(&self) -> &ClientCoordinator {
        &self.coordinator
    }

    /// Connect, then pump messages and timers until the run finishes.
    pub fn run(&mut self) -> Result<RunReport, ClientError> {
        let mut armed: Vec<TimerId> = Vec::new();
        let mut actions = self.coordinator.start();

        for (s, r) in self.local.cluster.all_replicas() {
            if self.down.contains(&(s, r)) {
                continue;
            }
            actions.extend(self.coordinator.handle(ClientEvent::Connected {
                shard_id: s,
                replica_id: r,
            })?);
        }

        for _ in 0..100_000 {
            for action in actions.drain(..) {
                match action {
                    Action::ArmTimer { id, .. } => armed.push(id),
                    Action::CancelTimer(id) => armed.retain(|t| *t != id),
                    Action::Finished(report) => return Ok(report),
                }
            }

            let sent = self.transport.drain();
            if sent.is_empty() {
                let Some(id) = armed.pop() else {
                    return Ok(self.coordinator.report());
                };
                actions = self.coordinator.handle(ClientEvent::TimerFired(id))?;
                continue;
            }

            for (s, r, message) in sent {
                self.delivered += 1;
                let Some(mut reply) = self.local.deliver(s, r, message) else {
                    continue;
                };
                if self.silent.contains(&(s, r)) {
                    continue;
                }
                if self.forging.contains(&(s, r)) {
                    if let Message::BurnResponse(resp) | Message::MintResponse(resp) = &mut reply {
                        resp.signature[0] ^= 0xFF;
                    }
                }
                actions.extend(self.coordinator.handle(ClientEvent::Response {
                    shard_id: s,
                    replica_id: r,
                    message: reply,
                })?);
            }
        }
        panic!("run did not settle");
    }
}
