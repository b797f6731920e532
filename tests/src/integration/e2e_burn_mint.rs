//! # Burn → Mint End to End
//!
//! A coordinator drives real replica services through both phases. The mint
//! side is also exercised directly with hand-built proofs to check that a
//! certificate only ever vouches for the shard that produced it.

#[cfg(test)]
mod tests {
    use crate::harness::{nullifier_on, tx_on, Driver, LocalCluster};
    use shared_types::{mint_shard_for_client, responsible_shards, Transaction};
    use xs_01_wire_codec::{BurnRequest, MintRequest};
    use xs_02_replica::{RejectReason, ReplicaApi};
    use xs_03_client::{ClientConfig, CoordinatorState};

    fn mint_request(local: &LocalCluster, tx: &Transaction, client_id: u64) -> MintRequest {
        let shards: Vec<_> = responsible_shards(&tx.inputs, local.cluster.num_shards)
            .into_iter()
            .collect();
        MintRequest {
            seq: 0,
            client_id,
            tx: tx.clone(),
            proof: local.proof(&shards, tx),
        }
    }

    fn rejection(local: &LocalCluster, request: &MintRequest) -> RejectReason {
        local
            .replica(0, 0)
            .handle_mint(request)
            .expect_err("mint must be rejected")
            .reject_reason()
            .cloned()
            .expect("rejection carries a reason")
    }

    #[test]
    fn test_two_shard_transaction_completes() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[1, 2], 1);
        assert_eq!(mint_shard_for_client(0, 4), 0);

        let mut driver = Driver::new(&local, ClientConfig::for_testing(0, 1), vec![tx.clone()]);
        let report = driver.run().unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(report.stalled, 0);
        assert_eq!(driver.coordinator().state(), CoordinatorState::Done);
        // 4 burns to shard 1, 4 to shard 2, 4 mints to shard 0.
        assert_eq!(driver.delivered, 12);

        // The burn is irrevocable: shard 1 refuses the nullifier again.
        let replay = BurnRequest {
            seq: 9,
            target_shard: 1,
            tx: tx.clone(),
        };
        let err = local.replica(1, 0).handle_burn(&replay).unwrap_err();
        assert!(matches!(
            err.reject_reason(),
            Some(RejectReason::AlreadySpent { .. })
        ));
    }

    #[test]
    fn test_sequential_transactions_complete() {
        let local = LocalCluster::new(4, 4, 1);
        let txs = vec![tx_on(&[1, 2], 1), tx_on(&[3], 2), tx_on(&[0, 1, 2, 3], 3)];

        let mut driver = Driver::new(&local, ClientConfig::for_testing(5, 3), txs);
        let report = driver.run().unwrap();

        assert_eq!(report.completed, 3);
        assert_eq!(report.stalled, 0);
        assert_eq!(driver.coordinator().stats().summary().count, 3);
    }

    #[test]
    fn test_mint_accepted_with_both_certificates() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[1, 2], 4);
        let request = mint_request(&local, &tx, 0);

        for replica in 0..4 {
            let response = local.replica(0, replica).handle_mint(&request).unwrap();
            assert_eq!(response.shard_id, 0);
            assert_eq!(response.replica_id, replica);
        }
    }

    #[test]
    fn test_mint_rejects_substituted_certificate() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[1, 2], 5);
        let mut request = mint_request(&local, &tx, 0);

        let shard_two = request.proof.get(2).cloned().unwrap();
        request.proof.insert(1, shard_two);

        assert!(matches!(
            rejection(&local, &request),
            RejectReason::CertificateShardMismatch {
                key: 1,
                embedded: 2
            }
        ));
    }

    #[test]
    fn test_mint_rejects_relabelled_certificate() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[1, 2], 6);
        let mut request = mint_request(&local, &tx, 0);

        // Shard 2's signatures, claimed to be shard 1's.
        let mut relabelled = request.proof.get(2).cloned().unwrap();
        relabelled.shard_id = 1;
        for receipt in &mut relabelled.receipts {
            receipt.shard_id = 1;
        }
        request.proof.insert(1, relabelled);

        assert!(matches!(
            rejection(&local, &request),
            RejectReason::BadSignature { shard: 1, .. }
        ));
    }

    #[test]
    fn test_mint_rejects_missing_and_extra_shards() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[1, 2], 7);

        let mut missing = mint_request(&local, &tx, 0);
        missing.proof = local.proof(&[1], &tx);
        assert!(matches!(
            rejection(&local, &missing),
            RejectReason::ProofCoverage { .. }
        ));

        let mut extra = mint_request(&local, &tx, 0);
        extra.proof = local.proof(&[1, 2, 3], &tx);
        assert!(matches!(
            rejection(&local, &extra),
            RejectReason::ProofCoverage { .. }
        ));
    }

    #[test]
    fn test_mint_rejects_oversized_certificate() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[1], 8);
        let mut request = mint_request(&local, &tx, 0);
        request.proof.insert(1, local.certificate(1, &[0, 1, 2, 3], &tx));

        assert!(matches!(
            rejection(&local, &request),
            RejectReason::WrongReceiptCount {
                got: 4,
                required: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_mint_rejects_certificate_for_other_transaction() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[1], 9);
        let other = Transaction::new(vec![nullifier_on(1, 10)], tx.outputs.clone());

        let mut request = mint_request(&local, &tx, 0);
        request.proof.insert(1, local.certificate(1, &[0, 1, 2], &other));

        assert!(matches!(
            rejection(&local, &request),
            RejectReason::BadSignature { shard: 1, .. }
        ));
    }

    #[test]
    fn test_mint_on_wrong_shard_rejected() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[1], 11);
        // Client 3 mints on shard 3, not shard 0.
        let request = mint_request(&local, &tx, 3);

        assert!(matches!(
            rejection(&local, &request),
            RejectReason::WrongMintShard { expected: 3, .. }
        ));
    }
}
