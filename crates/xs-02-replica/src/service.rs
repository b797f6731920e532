//! # Replica Service
//!
//! Routes decoded messages through the replication engine into the burn and
//! mint handlers. Rejections are logged and counted; they never produce a
//! response.

use crate::algorithms::{BurnHandler, MintHandler};
use crate::domain::{ReplicaConfig, ReplicaError, ReplicaRequest};
use crate::ports::{
    AntiReplayStore, CredentialProvider, ReplicaApi, ReplicationEngine, RequestExecutor,
};
use shard_telemetry::{BURN_REQUESTS, MINT_REQUESTS};
use shared_types::SignerDirectory;
use std::sync::Arc;
use xs_01_wire_codec::{BurnRequest, Message, MintRequest, SignedResponse};

/// One replica's request processing.
pub struct ReplicaService {
    config: ReplicaConfig,
    burn: BurnHandler,
    mint: MintHandler,
    engine: Arc<dyn ReplicationEngine>,
}

impl ReplicaService {
    /// Wire the handlers to their capabilities.
    pub fn new(
        config: ReplicaConfig,
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn AntiReplayStore>,
        engine: Arc<dyn ReplicationEngine>,
        signers: SignerDirectory,
    ) -> Self {
        Self {
            config,
            burn: BurnHandler::new(config, credentials.clone(), store.clone()),
            mint: MintHandler::new(config, credentials, store, signers),
            engine,
        }
    }

    /// This replica's configuration.
    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    fn submit(&self, request: ReplicaRequest) -> Result<SignedResponse, ReplicaError> {
        let result = self.engine.deliver(&request, self);
        let counter = match &request {
            ReplicaRequest::Burn(_) => &*BURN_REQUESTS,
            ReplicaRequest::Mint(_) => &*MINT_REQUESTS,
        };

        match &result {
            Ok(_) => counter.with_label_values(&["accepted"]).inc(),
            Err(err) => {
                counter.with_label_values(&[err.label()]).inc();
                match err.reject_reason() {
                    Some(reason) => tracing::warn!(
                        shard = self.config.shard_id,
                        replica = self.config.replica_id,
                        seq = request.seq(),
                        kind = request.kind(),
                        reason = %reason,
                        "[xs-02] Request rejected"
                    ),
                    None => tracing::error!(
                        shard = self.config.shard_id,
                        replica = self.config.replica_id,
                        seq = request.seq(),
                        kind = request.kind(),
                        error = %err,
                        "[xs-02] Request failed"
                    ),
                }
            }
        }
        result
    }
}

impl RequestExecutor for ReplicaService {
    fn execute(&self, request: &ReplicaRequest) -> Result<SignedResponse, ReplicaError> {
        match request {
            ReplicaRequest::Burn(r) => self.burn.handle(r),
            ReplicaRequest::Mint(r) => self.mint.handle(r),
        }
    }
}

impl ReplicaApi for ReplicaService {
    fn handle_burn(&self, request: &BurnRequest) -> Result<SignedResponse, ReplicaError> {
        self.submit(ReplicaRequest::Burn(request.clone()))
    }

    fn handle_mint(&self, request: &MintRequest) -> Result<SignedResponse, ReplicaError> {
        self.submit(ReplicaRequest::Mint(request.clone()))
    }

    fn handle_message(&self, message: Message) -> Option<Message> {
        match message {
            Message::BurnRequest(r) => self
                .submit(ReplicaRequest::Burn(r))
                .ok()
                .map(Message::BurnResponse),
            Message::MintRequest(r) => self
                .submit(ReplicaRequest::Mint(r))
                .ok()
                .map(Message::MintResponse),
            other => {
                tracing::debug!(
                    shard = self.config.shard_id,
                    replica = self.config.replica_id,
                    msg_type = ?other.message_type(),
                    "[xs-02] Ignoring response-type message"
                );
                None
            }
        }
    }
}
