//! Transaction sources.

use crate::domain::ClientError;
use crate::ports::TransactionSource;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use shared_types::{Nullifier, OutputCommitment, Transaction};
use std::collections::VecDeque;

/// Random transactions with fresh 32-byte nullifiers and commitments.
pub struct RandomWorkload {
    rng: StdRng,
    inputs_per_tx: usize,
    outputs_per_tx: usize,
}

impl RandomWorkload {
    /// Entropy-seeded workload.
    pub fn new(inputs_per_tx: usize, outputs_per_tx: usize) -> Self {
        Self::with_rng(StdRng::from_entropy(), inputs_per_tx, outputs_per_tx)
    }

    /// Reproducible workload.
    pub fn seeded(seed: u64, inputs_per_tx: usize, outputs_per_tx: usize) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), inputs_per_tx, outputs_per_tx)
    }

    fn with_rng(rng: StdRng, inputs_per_tx: usize, outputs_per_tx: usize) -> Self {
        Self {
            rng,
            inputs_per_tx: inputs_per_tx.max(1),
            outputs_per_tx: outputs_per_tx.max(1),
        }
    }
}

impl TransactionSource for RandomWorkload {
    fn next_transaction(&mut self, _seq: u64) -> Result<Transaction, ClientError> {
        let mut inputs = Vec::with_capacity(self.inputs_per_tx);
        for _ in 0..self.inputs_per_tx {
            let mut bytes = vec![0u8; Nullifier::MIN_LEN];
            self.rng.fill_bytes(&mut bytes);
            inputs.push(Nullifier::new(bytes)?);
        }
        let outputs = (0..self.outputs_per_tx)
            .map(|_| {
                let mut commitment: OutputCommitment = [0u8; 32];
                self.rng.fill_bytes(&mut commitment);
                commitment
            })
            .collect();
        Ok(Transaction::new(inputs, outputs))
    }
}

/// Replays a fixed list, then repeats the last transaction.
pub struct FixedWorkload {
    queue: VecDeque<Transaction>,
    last: Option<Transaction>,
}

impl FixedWorkload {
    /// Source yielding `transactions` in order.
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            queue: transactions.into(),
            last: None,
        }
    }
}

impl TransactionSource for FixedWorkload {
    fn next_transaction(&mut self, seq: u64) -> Result<Transaction, ClientError> {
        if let Some(tx) = self.queue.pop_front() {
            self.last = Some(tx.clone());
            return Ok(tx);
        }
        self.last.clone().ok_or_else(|| {
            ClientError::Workload(format!("no transaction available for index {seq}"))
        })
    }
}
