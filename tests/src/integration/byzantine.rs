//! # Faulty Replicas and Replays
//!
//! Up to `f` replicas per shard may stay silent or sign garbage; transactions
//! must still complete. A spent nullifier must never burn or mint twice.

#[cfg(test)]
mod tests {
    use crate::harness::{nullifier_on, tx_on, Driver, LocalCluster};
    use shared_types::Transaction;
    use xs_01_wire_codec::MintRequest;
    use xs_02_replica::{RejectReason, ReplicaApi};
    use xs_03_client::{ClientConfig, ClientError};

    #[test]
    fn test_completes_with_one_faulty_replica_per_shard() {
        let local = LocalCluster::new(4, 4, 1);
        let txs = vec![tx_on(&[1, 2], 1), tx_on(&[1, 2], 2)];

        let mut driver = Driver::new(&local, ClientConfig::for_testing(0, 2), txs)
            .silent(0, 1)
            .silent(1, 0)
            .forging(2, 3);
        let report = driver.run().unwrap();

        assert_eq!(report.completed, 2);
        assert_eq!(report.stalled, 0);
    }

    #[test]
    fn test_forged_receipt_caught_by_verification() {
        let local = LocalCluster::new(4, 4, 1);

        // Replica 0 answers first; its forged receipt must not enter the
        // certificate.
        let mut driver = Driver::new(&local, ClientConfig::for_testing(0, 1), vec![tx_on(&[1], 3)])
            .forging(1, 0);
        let report = driver.run().unwrap();
        assert_eq!(report.completed, 1);
    }

    #[test]
    fn test_unverified_forged_receipt_poisons_certificate() {
        let local = LocalCluster::new(4, 4, 1);
        let config = ClientConfig {
            verify_receipts: false,
            ..ClientConfig::for_testing(0, 1)
        };

        let mut driver = Driver::new(&local, config, vec![tx_on(&[1], 4)]).forging(1, 0);
        let report = driver.run().unwrap();

        // Shard 0 rejects the proof, so the mint never reaches quorum.
        assert_eq!(report.completed, 0);
        assert_eq!(report.stalled, 1);
    }

    #[test]
    fn test_too_many_silent_replicas_stall() {
        let local = LocalCluster::new(4, 4, 1);

        let mut driver = Driver::new(&local, ClientConfig::for_testing(0, 1), vec![tx_on(&[2], 5)])
            .silent(2, 0)
            .silent(2, 1);
        let report = driver.run().unwrap();

        assert_eq!(report.completed, 0);
        assert_eq!(report.stalled, 1);
    }

    #[test]
    fn test_double_spend_stalls_second_transaction() {
        let local = LocalCluster::new(4, 4, 1);
        let first = tx_on(&[1], 6);
        let second = Transaction::new(first.inputs.clone(), vec![[0xEE; 32]]);

        let mut driver = Driver::new(&local, ClientConfig::for_testing(0, 2), vec![first, second]);
        let report = driver.run().unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(report.stalled, 1);
    }

    #[test]
    fn test_retries_do_not_rescue_double_spend() {
        let local = LocalCluster::new(4, 4, 1);
        let first = tx_on(&[3], 7);
        let second = Transaction::new(first.inputs.clone(), vec![[0xDD; 32]]);
        let config = ClientConfig {
            max_retries: 2,
            ..ClientConfig::for_testing(0, 2)
        };

        let mut driver = Driver::new(&local, config, vec![first, second]);
        let report = driver.run().unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(report.stalled, 1);
        // 4 burns + 4 mints, then 4 burns for each of 3 attempts.
        assert_eq!(driver.delivered, 8 + 12);
    }

    #[test]
    fn test_mint_replay_rejected() {
        let local = LocalCluster::new(4, 4, 1);
        let tx = tx_on(&[2], 8);

        let mut driver = Driver::new(&local, ClientConfig::for_testing(0, 1), vec![tx.clone()]);
        assert_eq!(driver.run().unwrap().completed, 1);

        let replay = MintRequest {
            seq: 1,
            client_id: 0,
            tx: tx.clone(),
            proof: local.proof(&[2], &tx),
        };
        let err = local.replica(0, 2).handle_mint(&replay).unwrap_err();
        assert!(matches!(
            err.reject_reason(),
            Some(RejectReason::AlreadySpent { .. })
        ));
    }

    #[test]
    fn test_burn_and_mint_on_same_shard() {
        let local = LocalCluster::new(4, 4, 1);
        // Client 1 mints on shard 1, the shard that burns the input.
        let tx = Transaction::new(vec![nullifier_on(1, 9)], vec![[9; 32]]);

        let mut driver = Driver::new(&local, ClientConfig::for_testing(1, 1), vec![tx]);
        let report = driver.run().unwrap();

        assert_eq!(report.completed, 1);
    }

    #[test]
    fn test_degraded_start_with_one_replica_down() {
        let local = LocalCluster::new(4, 4, 1);

        let mut driver = Driver::new(&local, ClientConfig::for_testing(0, 1), vec![tx_on(&[1], 10)])
            .down(1, 3)
            .down(0, 0);
        let report = driver.run().unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(driver.coordinator().live_connections(), 14);
    }

    #[test]
    fn test_start_fails_below_threshold() {
        let local = LocalCluster::new(4, 4, 1);

        let mut driver = Driver::new(&local, ClientConfig::for_testing(0, 1), vec![tx_on(&[1], 11)])
            .down(3, 0)
            .down(3, 1);
        let err = driver.run().unwrap_err();

        assert!(matches!(
            err,
            ClientError::InsufficientConnections {
                shard_id: 3,
                live: 2,
                required: 3
            }
        ));
    }
}
