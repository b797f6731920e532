//! # Inbound Ports
//!
//! API the network layer drives.

use crate::domain::ReplicaError;
use xs_01_wire_codec::{BurnRequest, Message, MintRequest, SignedResponse};

/// Replica API - inbound port.
pub trait ReplicaApi: Send + Sync {
    /// Burn a transaction's nullifiers and sign a burn receipt.
    fn handle_burn(&self, request: &BurnRequest) -> Result<SignedResponse, ReplicaError>;

    /// Verify a mint proof, mint, and sign a mint receipt.
    fn handle_mint(&self, request: &MintRequest) -> Result<SignedResponse, ReplicaError>;

    /// Dispatch a decoded message. `None` means nothing is sent back.
    fn handle_message(&self, message: Message) -> Option<Message>;
}
