//! # Mint Handler
//!
//! 1. The client id must map to this shard, and the proof must cover exactly
//!    the transaction's responsible shards.
//! 2. Every certificate carries exactly `threshold` receipts from distinct
//!    replicas of its own shard, each verifying over `Hash(shardId ‖ txHash)`
//!    with `txHash` recomputed here.
//! 3. The credential capability accepts the transaction.
//! 4. None of the nullifiers was minted here before; record them.
//! 5. Sign the minted outputs.

use crate::algorithms::anti_replay::{ensure_unspent, record_spent, Namespace};
use crate::domain::{RejectReason, ReplicaConfig, ReplicaError};
use crate::ports::{AntiReplayStore, CredentialProvider};
use shared_types::{
    burn_signing_message, mint_shard_for_client, mint_signing_message, responsible_shards, Hash,
    MintProof, QuorumCertificate, ShardId, SignerDirectory,
};
use std::collections::HashSet;
use std::sync::Arc;
use xs_01_wire_codec::{MintRequest, SignedResponse};

/// Replica-side mint processing.
pub struct MintHandler {
    config: ReplicaConfig,
    credentials: Arc<dyn CredentialProvider>,
    store: Arc<dyn AntiReplayStore>,
    signers: SignerDirectory,
}

impl MintHandler {
    /// Create a handler. `signers` holds every replica key of every shard.
    pub fn new(
        config: ReplicaConfig,
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn AntiReplayStore>,
        signers: SignerDirectory,
    ) -> Self {
        Self {
            config,
            credentials,
            store,
            signers,
        }
    }

    /// Verify, mint and sign, or reject without a signature.
    pub fn handle(&self, request: &MintRequest) -> Result<SignedResponse, ReplicaError> {
        let local = self.config.shard_id;
        let expected = mint_shard_for_client(request.client_id, self.config.num_shards);
        if expected != local {
            return Err(RejectReason::WrongMintShard {
                client_id: request.client_id,
                expected,
                local,
            }
            .into());
        }

        let tx = &request.tx;
        let nullifiers = self.credentials.nullifiers(tx);
        let responsible = responsible_shards(nullifiers.iter(), self.config.num_shards);
        if !request.proof.covers_exactly(&responsible) {
            return Err(RejectReason::ProofCoverage {
                expected: responsible.into_iter().collect(),
                found: request.proof.shards().into_iter().collect(),
            }
            .into());
        }

        let tx_hash = tx.tx_hash()?;
        self.verify_proof(&request.proof, &tx_hash)?;

        if !self.credentials.validate(tx) {
            return Err(RejectReason::InvalidTransaction.into());
        }

        ensure_unspent(self.store.as_ref(), Namespace::Mint, &nullifiers)?;
        record_spent(self.store.as_ref(), Namespace::Mint, &nullifiers, &tx_hash)?;

        let signature = self
            .credentials
            .sign(&mint_signing_message(local, &tx.outputs_digest()));

        tracing::info!(
            shard = local,
            replica = self.config.replica_id,
            seq = request.seq,
            client = request.client_id,
            outputs = tx.outputs.len(),
            "[xs-02] Minted transaction"
        );

        Ok(SignedResponse {
            seq: request.seq,
            shard_id: local,
            replica_id: self.config.replica_id,
            signature,
        })
    }

    fn verify_proof(&self, proof: &MintProof, tx_hash: &Hash) -> Result<(), ReplicaError> {
        for (&shard, certificate) in &proof.certificates {
            self.verify_certificate(shard, certificate, tx_hash)?;
        }
        Ok(())
    }

    fn verify_certificate(
        &self,
        shard: ShardId,
        certificate: &QuorumCertificate,
        tx_hash: &Hash,
    ) -> Result<(), ReplicaError> {
        if certificate.shard_id != shard {
            return Err(RejectReason::CertificateShardMismatch {
                key: shard,
                embedded: certificate.shard_id,
            }
            .into());
        }

        let required = self.config.threshold();
        if certificate.len() != required {
            return Err(RejectReason::WrongReceiptCount {
                shard,
                got: certificate.len(),
                required,
            }
            .into());
        }

        let message = burn_signing_message(shard, tx_hash);
        let mut seen = HashSet::with_capacity(required);
        for receipt in &certificate.receipts {
            if receipt.shard_id != shard {
                return Err(RejectReason::CertificateShardMismatch {
                    key: shard,
                    embedded: receipt.shard_id,
                }
                .into());
            }
            if !seen.insert(receipt.replica_id) {
                return Err(RejectReason::DuplicateSigner {
                    shard,
                    replica: receipt.replica_id,
                }
                .into());
            }

            let unknown = RejectReason::UnknownSigner {
                shard,
                replica: receipt.replica_id,
            };
            if receipt.replica_id >= self.config.quorum.num_replicas {
                return Err(unknown.into());
            }
            let public_key = self
                .signers
                .key(shard, receipt.replica_id)
                .ok_or(unknown)?;

            if !self
                .credentials
                .verify(public_key, &message, &receipt.signature)
            {
                return Err(RejectReason::BadSignature {
                    shard,
                    replica: receipt.replica_id,
                }
                .into());
            }
        }
        Ok(())
    }
}
