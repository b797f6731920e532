//! # Typed Payloads
//!
//! ```text
//! BurnMsg  { seq, targetShardId, txLen, txBytes }
//! BurnResp { seq, shardId, replicaId, sigLen, sigBytes }
//! MintMsg  { seq, clientId, txLen, proofLen, txBytes, proofBytes }
//! MintResp { seq, shardId, replicaId, sigLen, sigBytes }
//! Proof    { entryCount, [ shardId, receiptCount, [ replicaId, sigLen, sigBytes ] ] }
//! ```
//!
//! All integers are big-endian u64. Every length is bounds-checked against the
//! remaining payload before any bytes are copied, and trailing bytes are an
//! error.

use crate::errors::WireError;
use crate::frame::{Frame, MessageType};
use bytes::{Buf, BufMut, BytesMut};
use shared_types::{BurnReceipt, MintProof, QuorumCertificate, ReplicaId, ShardId, Transaction};

/// Burn request sent to every replica of a responsible shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnRequest {
    /// Client transaction index.
    pub seq: u64,
    /// Shard the client believes it is talking to. Kept as the raw wire value
    /// so an out-of-range id reaches the handler and is rejected there.
    pub target_shard: u64,
    /// Transaction to burn.
    pub tx: Transaction,
}

/// Signed receipt returned by a replica. Burn and mint responses share it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedResponse {
    /// Echoed transaction index.
    pub seq: u64,
    /// Responding replica's shard.
    pub shard_id: ShardId,
    /// Responding replica.
    pub replica_id: ReplicaId,
    /// Signature bytes.
    pub signature: Vec<u8>,
}

/// Mint request sent to every replica of the target shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintRequest {
    /// Client transaction index.
    pub seq: u64,
    /// Client id; fixes the target shard.
    pub client_id: u64,
    /// Transaction to mint.
    pub tx: Transaction,
    /// One quorum certificate per responsible shard.
    pub proof: MintProof,
}

/// Any protocol message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Burn request.
    BurnRequest(BurnRequest),
    /// Burn receipt.
    BurnResponse(SignedResponse),
    /// Mint request.
    MintRequest(MintRequest),
    /// Mint receipt.
    MintResponse(SignedResponse),
}

impl Message {
    /// Header type byte for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::BurnRequest(_) => MessageType::BurnRequest,
            Message::BurnResponse(_) => MessageType::BurnResponse,
            Message::MintRequest(_) => MessageType::MintRequest,
            Message::MintResponse(_) => MessageType::MintResponse,
        }
    }

    /// Client transaction index carried by the message.
    pub fn seq(&self) -> u64 {
        match self {
            Message::BurnRequest(m) => m.seq,
            Message::MintRequest(m) => m.seq,
            Message::BurnResponse(m) | Message::MintResponse(m) => m.seq,
        }
    }

    /// Encode into a frame.
    pub fn to_frame(&self) -> Result<Frame, WireError> {
        let mut buf = BytesMut::new();
        match self {
            Message::BurnRequest(m) => encode_burn_request(m, &mut buf)?,
            Message::MintRequest(m) => encode_mint_request(m, &mut buf)?,
            Message::BurnResponse(m) | Message::MintResponse(m) => {
                encode_signed_response(m, &mut buf)
            }
        }
        Ok(Frame::new(self.message_type(), buf.freeze()))
    }

    /// Decode a frame's payload according to its header type.
    pub fn from_frame(frame: &Frame) -> Result<Self, WireError> {
        let mut payload: &[u8] = &frame.payload;
        let message = match frame.msg_type {
            MessageType::BurnRequest => Message::BurnRequest(decode_burn_request(&mut payload)?),
            MessageType::BurnResponse => {
                Message::BurnResponse(decode_signed_response(&mut payload)?)
            }
            MessageType::MintRequest => Message::MintRequest(decode_mint_request(&mut payload)?),
            MessageType::MintResponse => {
                Message::MintResponse(decode_signed_response(&mut payload)?)
            }
        };
        finish(payload)?;
        Ok(message)
    }
}

fn encode_burn_request(m: &BurnRequest, buf: &mut BytesMut) -> Result<(), WireError> {
    let tx = m.tx.to_bytes()?;
    buf.reserve(24 + tx.len());
    buf.put_u64(m.seq);
    buf.put_u64(m.target_shard);
    put_bytes(buf, &tx);
    Ok(())
}

fn decode_burn_request(buf: &mut &[u8]) -> Result<BurnRequest, WireError> {
    let seq = get_u64(buf, "seq")?;
    let target_shard = get_u64(buf, "target_shard_id")?;
    let tx_len = get_u64(buf, "tx_len")?;
    let tx_bytes = get_bytes(buf, tx_len, "tx_bytes")?;
    Ok(BurnRequest {
        seq,
        target_shard,
        tx: Transaction::from_bytes(tx_bytes)?,
    })
}

fn encode_signed_response(m: &SignedResponse, buf: &mut BytesMut) {
    buf.reserve(32 + m.signature.len());
    buf.put_u64(m.seq);
    buf.put_u64(m.shard_id as u64);
    buf.put_u64(m.replica_id as u64);
    put_bytes(buf, &m.signature);
}

fn decode_signed_response(buf: &mut &[u8]) -> Result<SignedResponse, WireError> {
    let seq = get_u64(buf, "seq")?;
    let shard_id = get_id(buf, "shard_id")?;
    let replica_id = get_id(buf, "replica_id")?;
    let sig_len = get_u64(buf, "sig_len")?;
    let signature = get_bytes(buf, sig_len, "sig_bytes")?.to_vec();
    Ok(SignedResponse {
        seq,
        shard_id,
        replica_id,
        signature,
    })
}

fn encode_mint_request(m: &MintRequest, buf: &mut BytesMut) -> Result<(), WireError> {
    let tx = m.tx.to_bytes()?;
    let proof = encode_proof(&m.proof);
    buf.reserve(32 + tx.len() + proof.len());
    buf.put_u64(m.seq);
    buf.put_u64(m.client_id);
    buf.put_u64(tx.len() as u64);
    buf.put_u64(proof.len() as u64);
    buf.extend_from_slice(&tx);
    buf.extend_from_slice(&proof);
    Ok(())
}

fn decode_mint_request(buf: &mut &[u8]) -> Result<MintRequest, WireError> {
    let seq = get_u64(buf, "seq")?;
    let client_id = get_u64(buf, "client_id")?;
    let tx_len = get_u64(buf, "tx_len")?;
    let proof_len = get_u64(buf, "proof_len")?;
    let tx_bytes = get_bytes(buf, tx_len, "tx_bytes")?;
    let proof_bytes = get_bytes(buf, proof_len, "proof_bytes")?;
    Ok(MintRequest {
        seq,
        client_id,
        tx: Transaction::from_bytes(tx_bytes)?,
        proof: decode_proof(proof_bytes)?,
    })
}

/// Encode a proof; entries come out in ascending shard order.
pub fn encode_proof(proof: &MintProof) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u64(proof.len() as u64);
    for (shard_id, certificate) in &proof.certificates {
        buf.put_u64(*shard_id as u64);
        buf.put_u64(certificate.receipts.len() as u64);
        for receipt in &certificate.receipts {
            buf.put_u64(receipt.replica_id as u64);
            put_bytes(&mut buf, &receipt.signature);
        }
    }
    buf.to_vec()
}

/// Decode a proof. Each receipt is stamped with the entry's shard id.
pub fn decode_proof(bytes: &[u8]) -> Result<MintProof, WireError> {
    let mut cursor = bytes;
    let buf = &mut cursor;
    let mut proof = MintProof::new();
    let entry_count = get_u64(buf, "entry_count")?;

    for _ in 0..entry_count {
        let shard_id: ShardId = get_id(buf, "proof_shard_id")?;
        let receipt_count = get_u64(buf, "receipt_count")?;

        let mut receipts = Vec::new();
        for _ in 0..receipt_count {
            let replica_id = get_id(buf, "receipt_replica_id")?;
            let sig_len = get_u64(buf, "receipt_sig_len")?;
            let signature = get_bytes(buf, sig_len, "receipt_sig_bytes")?.to_vec();
            receipts.push(BurnReceipt {
                replica_id,
                shard_id,
                signature,
            });
        }

        if proof.get(shard_id).is_some() {
            return Err(WireError::DuplicateProofEntry(shard_id));
        }
        proof.insert(shard_id, QuorumCertificate::new(shard_id, receipts));
    }

    finish(cursor)?;
    Ok(proof)
}

fn put_bytes(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u64(bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn get_u64(buf: &mut &[u8], field: &'static str) -> Result<u64, WireError> {
    if buf.remaining() < 8 {
        return Err(WireError::Truncated { field });
    }
    Ok(buf.get_u64())
}

fn get_id(buf: &mut &[u8], field: &'static str) -> Result<u32, WireError> {
    let value = get_u64(buf, field)?;
    u32::try_from(value).map_err(|_| WireError::IdOverflow { field, value })
}

fn get_bytes<'a>(
    buf: &mut &'a [u8],
    len: u64,
    field: &'static str,
) -> Result<&'a [u8], WireError> {
    let len = usize::try_from(len).map_err(|_| WireError::Truncated { field })?;
    if buf.len() < len {
        return Err(WireError::Truncated { field });
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

fn finish(buf: &[u8]) -> Result<(), WireError> {
    if buf.is_empty() {
        Ok(())
    } else {
        Err(WireError::TrailingBytes(buf.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameCodec;
    use shared_types::Nullifier;
    use tokio_util::codec::{Decoder, Encoder};

    fn sample_tx() -> Transaction {
        let mut a = vec![0u8; 32];
        a[31] = 1;
        let mut b = vec![0u8; 32];
        b[31] = 2;
        Transaction::new(
            vec![Nullifier::new(a).unwrap(), Nullifier::new(b).unwrap()],
            vec![[5u8; 32]],
        )
    }

    fn certificate(shard_id: ShardId) -> QuorumCertificate {
        QuorumCertificate::new(
            shard_id,
            (0..3)
                .map(|replica_id| BurnReceipt {
                    replica_id,
                    shard_id,
                    signature: vec![shard_id as u8 + replica_id as u8; 64],
                })
                .collect(),
        )
    }

    fn through_codec(message: &Message) -> Message {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(message.to_frame().unwrap(), &mut buf).unwrap();
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        Message::from_frame(&frame).unwrap()
    }

    #[test]
    fn test_burn_request_layout() {
        let message = Message::BurnRequest(BurnRequest {
            seq: 7,
            target_shard: 2,
            tx: sample_tx(),
        });
        let frame = message.to_frame().unwrap();
        let tx_len = sample_tx().to_bytes().unwrap().len() as u64;

        assert_eq!(frame.msg_type, MessageType::BurnRequest);
        assert_eq!(&frame.payload[0..8], &7u64.to_be_bytes());
        assert_eq!(&frame.payload[8..16], &2u64.to_be_bytes());
        assert_eq!(&frame.payload[16..24], &tx_len.to_be_bytes());
        assert_eq!(frame.payload.len() as u64, 24 + tx_len);
        assert_eq!(through_codec(&message), message);
    }

    #[test]
    fn test_burn_request_split_across_two_reads() {
        let message = Message::BurnRequest(BurnRequest {
            seq: 3,
            target_shard: 1,
            tx: sample_tx(),
        });
        let mut encoded = BytesMut::new();
        FrameCodec::default()
            .encode(message.to_frame().unwrap(), &mut encoded)
            .unwrap();

        for split in 0..=encoded.len() {
            let mut codec = FrameCodec::default();
            let mut buf = BytesMut::from(&encoded[..split]);
            let early = codec.decode(&mut buf).unwrap();
            if split < encoded.len() {
                assert!(early.is_none(), "frame emitted after {split} bytes");
            }
            buf.extend_from_slice(&encoded[split..]);

            let frame = match early {
                Some(frame) => frame,
                None => codec.decode(&mut buf).unwrap().unwrap(),
            };
            assert_eq!(Message::from_frame(&frame).unwrap(), message, "split at {split}");
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_mint_request_with_proof() {
        let mut proof = MintProof::new();
        proof.insert(2, certificate(2));
        proof.insert(1, certificate(1));

        let message = Message::MintRequest(MintRequest {
            seq: 3,
            client_id: 8,
            tx: sample_tx(),
            proof,
        });
        assert_eq!(through_codec(&message), message);
    }

    #[test]
    fn test_proof_entries_ascending() {
        let mut proof = MintProof::new();
        proof.insert(3, certificate(3));
        proof.insert(0, certificate(0));

        let bytes = encode_proof(&proof);
        assert_eq!(&bytes[0..8], &2u64.to_be_bytes());
        assert_eq!(&bytes[8..16], &0u64.to_be_bytes());
    }

    #[test]
    fn test_duplicate_proof_entry_rejected() {
        let mut proof = MintProof::new();
        proof.insert(1, certificate(1));
        let single = encode_proof(&proof);

        let mut doubled = BytesMut::new();
        doubled.put_u64(2);
        doubled.extend_from_slice(&single[8..]);
        doubled.extend_from_slice(&single[8..]);

        assert!(matches!(
            decode_proof(&doubled),
            Err(WireError::DuplicateProofEntry(1))
        ));
    }

    #[test]
    fn test_responses_roundtrip() {
        let response = SignedResponse {
            seq: 11,
            shard_id: 3,
            replica_id: 1,
            signature: vec![0xAB; 64],
        };
        let burn = Message::BurnResponse(response.clone());
        let mint = Message::MintResponse(response);
        assert_eq!(through_codec(&burn), burn);
        assert_eq!(through_codec(&mint), mint);
        assert_eq!(mint.seq(), 11);
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let mut payload = BytesMut::new();
        payload.put_u64(1);
        payload.put_u64(0);
        payload.put_u64(0);
        payload.put_u64(64);
        payload.extend_from_slice(&[0u8; 10]);

        let frame = Frame::new(MessageType::BurnResponse, payload.freeze());
        assert!(matches!(
            Message::from_frame(&frame),
            Err(WireError::Truncated { field: "sig_bytes" })
        ));
    }

    #[test]
    fn test_huge_length_field_rejected() {
        let mut payload = BytesMut::new();
        payload.put_u64(1);
        payload.put_u64(0);
        payload.put_u64(u64::MAX);

        let frame = Frame::new(MessageType::BurnRequest, payload.freeze());
        assert!(Message::from_frame(&frame).is_err());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let frame = Message::BurnResponse(SignedResponse {
            seq: 1,
            shard_id: 0,
            replica_id: 0,
            signature: vec![1, 2, 3],
        })
        .to_frame()
        .unwrap();

        let mut padded = BytesMut::from(&frame.payload[..]);
        padded.put_u8(0);
        let frame = Frame::new(MessageType::BurnResponse, padded.freeze());
        assert!(matches!(
            Message::from_frame(&frame),
            Err(WireError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_shard_id_overflow_rejected() {
        let mut payload = BytesMut::new();
        payload.put_u64(1);
        payload.put_u64(u64::from(u32::MAX) + 1);
        payload.put_u64(0);
        payload.put_u64(0);

        let frame = Frame::new(MessageType::MintResponse, payload.freeze());
        assert!(matches!(
            Message::from_frame(&frame),
            Err(WireError::IdOverflow { field: "shard_id", .. })
        ));
    }
}
