//! # TCP Transport
//!
//! One TCP connection per (shard, replica). The connection table maps each
//! slot to the sending half of a channel drained by that connection's writer;
//! the reader posts decoded responses back to the dispatch loop as
//! [`ClientEvent`]s.

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use shard_telemetry::MALFORMED_FRAMES;
use shared_types::{ClusterConfig, ReplicaId, ShardId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::codec::Framed;
use tracing::{debug, warn};
use xs_01_wire_codec::{FrameCodec, Message};
use xs_03_client::{ClientError, ClientEvent, Transport};

const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Live connections keyed by slot.
#[derive(Default)]
pub struct TcpTransport {
    connections: Mutex<HashMap<(ShardId, ReplicaId), mpsc::UnboundedSender<Message>>>,
}

impl TcpTransport {
    /// Empty connection table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// Spawn one connection task per replica in the cluster. Each task keeps
    /// retrying until `connect_within` elapses.
    pub fn connect_all(
        self: &Arc<Self>,
        cluster: &ClusterConfig,
        connect_within: Duration,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Vec<JoinHandle<()>> {
        let deadline = Instant::now() + connect_within;
        cluster
            .shards
            .iter()
            .flat_map(|shard| {
                shard
                    .replicas
                    .iter()
                    .map(move |r| (shard.shard_id, r.replica_id, r.addr.clone()))
            })
            .map(|(shard_id, replica_id, addr)| {
                let transport = Arc::clone(self);
                let events = events.clone();
                let max = cluster.max_message_size;
                tokio::spawn(async move {
                    transport
                        .run_connection(shard_id, replica_id, addr, max, deadline, events)
                        .await;
                })
            })
            .collect()
    }

    /// Drop every connection; writers exit once their channel closes.
    pub fn close_all(&self) {
        self.connections.lock().clear();
    }

    async fn run_connection(
        &self,
        shard_id: ShardId,
        replica_id: ReplicaId,
        addr: String,
        max_message_size: u64,
        deadline: Instant,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) {
        let Some(stream) = connect_until(&addr, deadline).await else {
            warn!(shard_id, replica_id, %addr, "[xs-03] Could not connect before deadline");
            return;
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!(shard_id, replica_id, error = %e, "[xs-03] set_nodelay failed");
        }

        let (mut sink, mut frames) = Framed::new(stream, FrameCodec::new(max_message_size)).split();
        let (tx, mut outbound) = mpsc::unbounded_channel::<Message>();
        self.connections.lock().insert((shard_id, replica_id), tx);
        if events
            .send(ClientEvent::Connected {
                shard_id,
                replica_id,
            })
            .is_err()
        {
            return;
        }

        let writer = async {
            while let Some(message) = outbound.recv().await {
                let frame = match message.to_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(shard_id, replica_id, error = %e, "[xs-03] Failed to encode request");
                        continue;
                    }
                };
                if let Err(e) = sink.send(frame).await {
                    debug!(shard_id, replica_id, error = %e, "[xs-03] Write failed");
                    break;
                }
            }
        };

        let reader = async {
            while let Some(item) = frames.next().await {
                match item.and_then(|frame| Message::from_frame(&frame)) {
                    Ok(message) => {
                        let event = ClientEvent::Response {
                            shard_id,
                            replica_id,
                            message,
                        };
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        MALFORMED_FRAMES.with_label_values(&[e.kind()]).inc();
                        warn!(shard_id, replica_id, error = %e, "[xs-03] Malformed message, closing connection");
                        break;
                    }
                }
            }
        };

        tokio::select! {
            _ = writer => {}
            _ = reader => {}
        }

        self.connections.lock().remove(&(shard_id, replica_id));
        let _ = events.send(ClientEvent::Disconnected {
            shard_id,
            replica_id,
        });
    }
}

async fn connect_until(addr: &str, deadline: Instant) -> Option<TcpStream> {
    loop {
        match tokio::time::timeout_at(deadline, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Some(stream),
            Ok(Err(e)) => debug!(%addr, error = %e, "[xs-03] Connect failed, retrying"),
            Err(_) => return None,
        }
        if Instant::now() + CONNECT_RETRY_INTERVAL >= deadline {
            return None;
        }
        tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
    }
}

impl Transport for TcpTransport {
    fn send(
        &self,
        shard_id: ShardId,
        replica_id: ReplicaId,
        message: Message,
    ) -> Result<(), ClientError> {
        let connections = self.connections.lock();
        let sender = connections
            .get(&(shard_id, replica_id))
            .ok_or_else(|| ClientError::Transport {
                shard_id,
                replica_id,
                message: "not connected".to_string(),
            })?;
        sender.send(message).map_err(|_| ClientError::Transport {
            shard_id,
            replica_id,
            message: "connection closed".to_string(),
        })
    }
}
