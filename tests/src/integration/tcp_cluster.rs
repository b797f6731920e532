//! # Loopback TCP Cluster
//!
//! Replica servers on ephemeral ports and the real client dispatch loop.

#[cfg(test)]
mod tests {
    use crate::harness::{tx_on, LocalCluster};
    use node_runtime::{run_client, run_client_with, ClientNodeConfig, ReplicaServer};
    use shared_types::ClusterConfig;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::watch;
    use tokio::task::JoinHandle;
    use xs_03_client::{ClientConfig, ClientError, FixedWorkload};

    struct Running {
        cluster: ClusterConfig,
        shutdown: watch::Sender<bool>,
        servers: Vec<JoinHandle<std::io::Result<()>>>,
    }

    impl Running {
        async fn stop(self) {
            let _ = self.shutdown.send(true);
            for server in self.servers {
                let _ = server.await;
            }
        }
    }

    /// An address nothing listens on.
    async fn dead_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    }

    /// Serve every replica except `offline`, rewriting the cluster's
    /// addresses to the bound ports.
    async fn serve(local: &LocalCluster, offline: &[(u32, u32)]) -> Running {
        let (shutdown, rx) = watch::channel(false);
        let mut cluster = local.cluster.clone();
        let mut servers = Vec::new();

        for members in &mut cluster.shards {
            for endpoint in &mut members.replicas {
                let slot = (members.shard_id, endpoint.replica_id);
                if offline.contains(&slot) {
                    endpoint.addr = dead_addr().await;
                    continue;
                }
                let server = ReplicaServer::bind(
                    "127.0.0.1:0",
                    Arc::clone(local.replica(slot.0, slot.1)),
                    local.cluster.max_message_size,
                )
                .await
                .unwrap();
                endpoint.addr = server.local_addr().unwrap().to_string();
                servers.push(tokio::spawn(server.run(rx.clone())));
            }
        }

        Running {
            cluster,
            shutdown,
            servers,
        }
    }

    fn client(cluster: ClusterConfig, client_id: u64, transactions: u64) -> ClientNodeConfig {
        ClientNodeConfig {
            cluster,
            client: ClientConfig {
                connect_timeout: Duration::from_secs(2),
                response_timeout: Duration::from_secs(2),
                ..ClientConfig::for_testing(client_id, transactions)
            },
            inputs_per_tx: 2,
            outputs_per_tx: 2,
            seed: Some(11),
        }
    }

    #[tokio::test]
    async fn test_random_workload_over_tcp() {
        let local = LocalCluster::new(2, 4, 1);
        let running = serve(&local, &[]).await;

        let summary = run_client(client(running.cluster.clone(), 0, 3))
            .await
            .unwrap();

        assert_eq!(summary.report.completed, 3);
        assert_eq!(summary.report.stalled, 0);
        assert_eq!(summary.latency.count, 3);
        assert!(summary.render().contains("completed"));
        running.stop().await;
    }

    #[tokio::test]
    async fn test_fixed_transactions_with_replica_offline() {
        let local = LocalCluster::new(4, 4, 1);
        let running = serve(&local, &[(1, 2)]).await;

        let mut config = client(running.cluster.clone(), 0, 2);
        config.client.connect_timeout = Duration::from_millis(500);
        let source = FixedWorkload::new(vec![tx_on(&[1, 2], 1), tx_on(&[1, 3], 2)]);

        let summary = run_client_with(config, Box::new(source)).await.unwrap();

        assert_eq!(summary.report.completed, 2);
        running.stop().await;
    }

    #[tokio::test]
    async fn test_insufficient_connections_is_fatal() {
        let local = LocalCluster::new(2, 4, 1);
        let running = serve(&local, &[(0, 0), (0, 1)]).await;

        let mut config = client(running.cluster.clone(), 0, 1);
        config.client.connect_timeout = Duration::from_millis(300);

        let err = run_client(config).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::InsufficientConnections {
                shard_id: 0,
                live: 2,
                required: 3
            }
        ));
        running.stop().await;
    }
}
