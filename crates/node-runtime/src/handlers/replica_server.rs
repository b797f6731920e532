//! # Replica Server
//!
//! Accept loop plus per-connection request handling. A malformed frame closes
//! its connection; the server keeps running.

use futures::{SinkExt, StreamExt};
use shard_telemetry::MALFORMED_FRAMES;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};
use xs_01_wire_codec::{FrameCodec, Message};
use xs_02_replica::{ReplicaApi, ReplicaService};

/// TCP front end of one replica.
pub struct ReplicaServer {
    listener: TcpListener,
    service: Arc<ReplicaService>,
    max_message_size: u64,
}

impl ReplicaServer {
    /// Bind the listening socket.
    pub async fn bind(
        addr: &str,
        service: Arc<ReplicaService>,
        max_message_size: u64,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            service,
            max_message_size,
        })
    }

    /// Bound address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve connections until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> std::io::Result<()> {
        let config = *self.service.config();
        info!(
            shard = config.shard_id,
            replica = config.replica_id,
            addr = ?self.listener.local_addr().ok(),
            "[xs-02] Replica listening"
        );

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let service = Arc::clone(&self.service);
                            let max = self.max_message_size;
                            tokio::spawn(serve_connection(stream, peer, service, max));
                        }
                        Err(e) => warn!(error = %e, "[xs-02] Accept failed"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("[xs-02] Shutdown signal received");
                        return Ok(());
                    }
                }
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    service: Arc<ReplicaService>,
    max_message_size: u64,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer, error = %e, "[xs-02] set_nodelay failed");
    }
    debug!(%peer, "[xs-02] Client connected");
    let mut framed = Framed::new(stream, FrameCodec::new(max_message_size));

    while let Some(item) = framed.next().await {
        let message = match item.and_then(|frame| Message::from_frame(&frame)) {
            Ok(message) => message,
            Err(e) => {
                MALFORMED_FRAMES.with_label_values(&[e.kind()]).inc();
                warn!(%peer, error = %e, "[xs-02] Malformed message, closing connection");
                return;
            }
        };

        // Signature checks and store writes block; keep them off the reactor
        // while still answering this connection in order.
        let handler = Arc::clone(&service);
        let reply = match tokio::task::spawn_blocking(move || handler.handle_message(message)).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(%peer, error = %e, "[xs-02] Request task failed");
                return;
            }
        };

        let Some(reply) = reply else {
            continue;
        };
        let frame = match reply.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(%peer, error = %e, "[xs-02] Failed to encode response");
                continue;
            }
        };
        if let Err(e) = framed.send(frame).await {
            debug!(%peer, error = %e, "[xs-02] Client went away");
            return;
        }
    }
    debug!(%peer, "[xs-02] Client disconnected");
}
