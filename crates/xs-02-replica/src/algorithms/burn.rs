//! # Burn Handler
//!
//! 1. Reject unless the target shard is in range, is this replica's shard and
//!    is responsible for at least one of the transaction's nullifiers.
//! 2. Reject if any nullifier is already burnt here.
//! 3. Record every nullifier. Irreversible.
//! 4. Sign `Hash(shardId ‖ txHash)`.

use crate::algorithms::anti_replay::{ensure_unspent, record_spent, Namespace};
use crate::domain::{RejectReason, ReplicaConfig, ReplicaError};
use crate::ports::{AntiReplayStore, CredentialProvider};
use shared_types::{burn_signing_message, is_responsible, ShardId};
use std::sync::Arc;
use xs_01_wire_codec::{BurnRequest, SignedResponse};

/// Replica-side burn processing.
pub struct BurnHandler {
    config: ReplicaConfig,
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<dyn AntiReplayStore>,
}

impl BurnHandler {
    /// Create a handler.
    pub fn new(
        config: ReplicaConfig,
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn AntiReplayStore>,
    ) -> Self {
        Self {
            config,
            credentials,
            store,
        }
    }

    /// Burn and sign, or reject without a signature.
    pub fn handle(&self, request: &BurnRequest) -> Result<SignedResponse, ReplicaError> {
        let local = self.config.shard_id;
        let target = self.check_target(request.target_shard)?;
        if target != local {
            return Err(RejectReason::WrongShard {
                requested: target,
                local,
            }
            .into());
        }

        let nullifiers = self.credentials.nullifiers(&request.tx);
        if !is_responsible(local, nullifiers.iter(), self.config.num_shards) {
            return Err(RejectReason::NotResponsible { shard: local }.into());
        }

        let tx_hash = request.tx.tx_hash()?;

        ensure_unspent(self.store.as_ref(), Namespace::Burn, &nullifiers)?;
        record_spent(self.store.as_ref(), Namespace::Burn, &nullifiers, &tx_hash)?;

        let signature = self
            .credentials
            .sign(&burn_signing_message(local, &tx_hash));

        tracing::info!(
            shard = local,
            replica = self.config.replica_id,
            seq = request.seq,
            nullifiers = nullifiers.len(),
            "[xs-02] Burnt transaction"
        );

        Ok(SignedResponse {
            seq: request.seq,
            shard_id: local,
            replica_id: self.config.replica_id,
            signature,
        })
    }

    fn check_target(&self, target: u64) -> Result<ShardId, ReplicaError> {
        let out_of_range = || RejectReason::ShardOutOfRange {
            shard: target,
            num_shards: self.config.num_shards,
        };
        let shard = ShardId::try_from(target).map_err(|_| out_of_range())?;
        if shard >= self.config.num_shards {
            return Err(out_of_range().into());
        }
        Ok(shard)
    }
}
