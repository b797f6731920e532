//! # Frame Codec
//!
//! ```text
//! [type: u8][length: u64 BE][payload: length bytes]
//! ```
//!
//! The decoder is driven by `tokio_util::codec::FramedRead`, which owns the
//! per-connection accumulation buffer. Decoding waits for a full header, then
//! for `length` more bytes; the consumed prefix is split off and decoding is
//! retried until the buffer holds no complete frame.

use crate::errors::WireError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Header size: one type byte plus a u64 length.
pub const HEADER_LEN: usize = 9;

/// Default maximum payload size (4 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 4 * 1024 * 1024;

/// Message type byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Client → replica: burn a transaction.
    BurnRequest = 1,
    /// Replica → client: burn receipt.
    BurnResponse = 2,
    /// Client → replica: mint a transaction with its proof.
    MintRequest = 3,
    /// Replica → client: mint receipt.
    MintResponse = 4,
}

impl TryFrom<u8> for MessageType {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageType::BurnRequest),
            2 => Ok(MessageType::BurnResponse),
            3 => Ok(MessageType::MintRequest),
            4 => Ok(MessageType::MintResponse),
            other => Err(WireError::UnknownMessageType(other)),
        }
    }
}

/// One complete frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Message type from the header.
    pub msg_type: MessageType,
    /// Raw payload.
    pub payload: Bytes,
}

impl Frame {
    /// Build a frame.
    pub fn new(msg_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            payload: payload.into(),
        }
    }
}

/// Length-prefixed frame codec with an upper bound on payload size.
#[derive(Clone, Debug)]
pub struct FrameCodec {
    max_message_size: u64,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_SIZE)
    }
}

impl FrameCodec {
    /// Codec rejecting payloads above `max_message_size`.
    pub fn new(max_message_size: u64) -> Self {
        Self { max_message_size }
    }

    /// Configured maximum payload size.
    pub fn max_message_size(&self) -> u64 {
        self.max_message_size
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, WireError> {
        if src.len() < HEADER_LEN {
            src.reserve(HEADER_LEN - src.len());
            return Ok(None);
        }

        let msg_type = MessageType::try_from(src[0])?;
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&src[1..HEADER_LEN]);
        let length = u64::from_be_bytes(len_bytes);

        if length > self.max_message_size {
            return Err(WireError::FrameTooLarge {
                length,
                max: self.max_message_size,
            });
        }
        let length = usize::try_from(length).map_err(|_| WireError::FrameTooLarge {
            length,
            max: self.max_message_size,
        })?;

        let needed = HEADER_LEN + length;
        if src.len() < needed {
            src.reserve(needed - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(length).freeze();
        Ok(Some(Frame { msg_type, payload }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = WireError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), WireError> {
        let length = frame.payload.len() as u64;
        if length > self.max_message_size {
            return Err(WireError::FrameTooLarge {
                length,
                max: self.max_message_size,
            });
        }

        dst.reserve(HEADER_LEN + frame.payload.len());
        dst.put_u8(frame.msg_type as u8);
        dst.put_u64(length);
        dst.extend_from_slice(&frame.payload);
        Ok(())
    }
}
