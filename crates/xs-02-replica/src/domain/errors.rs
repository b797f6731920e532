//! # Domain Errors
//!
//! A rejected request never produces a signature. The reason is logged at the
//! replica and counted; the client only ever observes silence.

use shared_types::{ReplicaId, ShardError, ShardId};
use thiserror::Error;
use xs_01_wire_codec::WireError;

/// Why a burn or mint request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Requested shard id is not a shard of this cluster.
    #[error("Target shard {shard} out of range (num_shards = {num_shards})")]
    ShardOutOfRange {
        /// Requested shard
        shard: u64,
        /// Configured shard count
        num_shards: u32,
    },

    /// Request addressed a different shard than this replica's.
    #[error("Request for shard {requested} delivered to shard {local}")]
    WrongShard {
        /// Requested shard
        requested: ShardId,
        /// This replica's shard
        local: ShardId,
    },

    /// This shard owns none of the transaction's nullifiers.
    #[error("Shard {shard} is not responsible for the transaction")]
    NotResponsible {
        /// This replica's shard
        shard: ShardId,
    },

    /// A nullifier is already recorded in the anti-replay store.
    #[error("Nullifier already spent: {nullifier}")]
    AlreadySpent {
        /// Hex-encoded nullifier
        nullifier: String,
    },

    /// Proof does not cover exactly the responsible shards.
    #[error("Proof covers {found:?}, responsible set is {expected:?}")]
    ProofCoverage {
        /// Responsible shards
        expected: Vec<ShardId>,
        /// Shards in the proof
        found: Vec<ShardId>,
    },

    /// Certificate or receipt claims a shard other than its proof entry.
    #[error("Certificate under shard {key} claims shard {embedded}")]
    CertificateShardMismatch {
        /// Proof entry key
        key: ShardId,
        /// Shard claimed inside the certificate
        embedded: ShardId,
    },

    /// Certificate size differs from the quorum threshold.
    #[error("Certificate for shard {shard} has {got} receipts, need exactly {required}")]
    WrongReceiptCount {
        /// Shard
        shard: ShardId,
        /// Receipts present
        got: usize,
        /// Quorum threshold
        required: usize,
    },

    /// Same replica signed twice in one certificate.
    #[error("Certificate for shard {shard} repeats signer {replica}")]
    DuplicateSigner {
        /// Shard
        shard: ShardId,
        /// Repeated replica
        replica: ReplicaId,
    },

    /// Signer is not a replica of the shard.
    #[error("Unknown signer {replica} in certificate for shard {shard}")]
    UnknownSigner {
        /// Shard
        shard: ShardId,
        /// Claimed replica
        replica: ReplicaId,
    },

    /// Receipt signature does not verify under the shard's key.
    #[error("Bad signature from replica {replica} of shard {shard}")]
    BadSignature {
        /// Shard
        shard: ShardId,
        /// Replica
        replica: ReplicaId,
    },

    /// Client id maps to a different mint shard.
    #[error("Client {client_id} mints on shard {expected}, not {local}")]
    WrongMintShard {
        /// Requesting client
        client_id: u64,
        /// Shard the client maps to
        expected: ShardId,
        /// This replica's shard
        local: ShardId,
    },

    /// Credential capability rejected the transaction.
    #[error("Transaction failed credential validation")]
    InvalidTransaction,
}

impl RejectReason {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::ShardOutOfRange { .. } => "shard_out_of_range",
            RejectReason::WrongShard { .. } => "wrong_shard",
            RejectReason::NotResponsible { .. } => "not_responsible",
            RejectReason::AlreadySpent { .. } => "already_spent",
            RejectReason::ProofCoverage { .. } => "proof_coverage",
            RejectReason::CertificateShardMismatch { .. } => "certificate_shard_mismatch",
            RejectReason::WrongReceiptCount { .. } => "wrong_receipt_count",
            RejectReason::DuplicateSigner { .. } => "duplicate_signer",
            RejectReason::UnknownSigner { .. } => "unknown_signer",
            RejectReason::BadSignature { .. } => "bad_signature",
            RejectReason::WrongMintShard { .. } => "wrong_mint_shard",
            RejectReason::InvalidTransaction => "invalid_transaction",
        }
    }
}

/// Anti-replay store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend I/O failed.
    #[error("Store I/O error: {message}")]
    Io {
        /// Backend message
        message: String,
    },
}

/// Replica handler errors.
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// Request refused; no signature.
    #[error("Rejected: {0}")]
    Rejected(#[from] RejectReason),

    /// Anti-replay store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Transaction could not be hashed.
    #[error(transparent)]
    Shard(#[from] ShardError),

    /// Request could not be re-encoded for digesting.
    #[error(transparent)]
    Encoding(#[from] WireError),

    /// Signing key could not be loaded.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

impl ReplicaError {
    /// Rejection reason, if this is a refusal rather than a fault.
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            ReplicaError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ReplicaError::Rejected(reason) => reason.label(),
            ReplicaError::Store(_) => "store_error",
            ReplicaError::Shard(_) => "serialization_error",
            ReplicaError::Encoding(_) => "encoding_error",
            ReplicaError::InvalidKey(_) => "invalid_key",
        }
    }
}
