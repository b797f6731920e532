//! # XS-01 Wire Codec
//!
//! Frames and unframes length-prefixed binary messages over an unreliable
//! byte stream.
//!
//! **Subsystem ID:** 1
//!
//! ## Wire Format
//!
//! ```text
//! Header { type: u8, length: u64 }   (9 bytes, big-endian)
//! Payload[length]
//! ```
//!
//! | Type | Message |
//! |------|---------|
//! | 1 | Burn request |
//! | 2 | Burn response |
//! | 3 | Mint request |
//! | 4 | Mint response |
//!
//! ## Malformed Input
//!
//! An oversize header, an unknown type byte or an undecodable payload is a
//! [`WireError`]. Callers close the connection; nothing partial is delivered.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod frame;
pub mod messages;

pub use errors::WireError;
pub use frame::{Frame, FrameCodec, MessageType, DEFAULT_MAX_MESSAGE_SIZE, HEADER_LEN};
pub use messages::{
    decode_proof, encode_proof, BurnRequest, Message, MintRequest, SignedResponse,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
