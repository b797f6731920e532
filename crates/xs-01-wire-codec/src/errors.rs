//! # Wire Errors
//!
//! Every variant is a malformed-message condition: the connection that
//! produced it is closed and no partial frame reaches upper layers.

use shared_types::{ShardError, ShardId};
use thiserror::Error;

/// Framing and payload decoding errors.
#[derive(Debug, Error)]
pub enum WireError {
    /// Underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header announced a payload above the configured maximum.
    #[error("Frame too large: {length} bytes (max {max})")]
    FrameTooLarge {
        /// Announced payload length
        length: u64,
        /// Configured maximum
        max: u64,
    },

    /// Header carried a type byte outside the protocol.
    #[error("Unknown message type: {0}")]
    UnknownMessageType(u8),

    /// Payload ended before a field was complete.
    #[error("Truncated payload while reading {field}")]
    Truncated {
        /// Field being read
        field: &'static str,
    },

    /// Payload carried bytes after the last field.
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    /// An id field does not fit its domain type.
    #[error("{field} out of range: {value}")]
    IdOverflow {
        /// Field name
        field: &'static str,
        /// Value on the wire
        value: u64,
    },

    /// Proof lists the same shard twice.
    #[error("Duplicate proof entry for shard {0}")]
    DuplicateProofEntry(ShardId),

    /// Embedded transaction failed to parse.
    #[error("Invalid transaction payload: {0}")]
    Transaction(#[from] ShardError),
}

impl WireError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WireError::Io(_) => "io",
            WireError::FrameTooLarge { .. } => "too_large",
            WireError::UnknownMessageType(_) => "unknown_type",
            WireError::Truncated { .. } => "truncated",
            WireError::TrailingBytes(_) => "trailing_bytes",
            WireError::IdOverflow { .. } => "id_overflow",
            WireError::DuplicateProofEntry(_) => "duplicate_proof_entry",
            WireError::Transaction(_) => "transaction",
        }
    }
}
