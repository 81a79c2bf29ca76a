//! Datagram (UDP) transport.
//!
//! There is no session: every datagram is decoded on its own and handed to
//! the dispatcher with a reply handle bound to the sender's address.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use dualcast_core::{Message, Result};

use crate::dispatch::InboundSender;
use crate::transport::connection::{Connection, TransportKind};

/// Largest UDP payload we accept.
pub const MAX_DATAGRAM_BYTES: usize = 64 * 1024;

/// Reply handle for one datagram peer.
///
/// Sends go straight to the shared socket. Failures are logged and swallowed;
/// the handle never reports itself disconnected.
pub struct DatagramConnection {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
}

impl DatagramConnection {
    pub fn new(socket: Arc<UdpSocket>, peer: SocketAddr) -> Self {
        Self { socket, peer }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl Connection for DatagramConnection {
    async fn send(&self, message: Message) {
        let bytes = message.encode();
        if let Err(e) = self.socket.send_to(&bytes, self.peer).await {
            error!(peer = %self.peer, opcode = message.opcode, error = %e, "datagram send failed");
        }
    }

    /// Datagrams arrive through the listener, never through a handle.
    async fn receive(&self) -> Result<Option<Message>> {
        Ok(None)
    }

    async fn disconnect(&self) {}

    fn is_connected(&self) -> bool {
        true
    }

    fn transport(&self) -> TransportKind {
        TransportKind::Datagram
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}

/// Receive datagrams until shutdown and submit each decoded one.
///
/// Malformed datagrams are logged and dropped; the loop keeps going.
pub async fn run_listener(socket: Arc<UdpSocket>, inbound: InboundSender, shutdown: CancellationToken) {
    let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
    info!(local = ?socket.local_addr().ok(), "datagram listener started");

    loop {
        let received = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            r = socket.recv_from(&mut buf) => r,
        };

        let (len, peer) = match received {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "datagram receive failed");
                continue;
            }
        };

        let message = match Message::decode(&buf[..len]) {
            Ok(m) => m,
            Err(e) => {
                warn!(%peer, bytes = len, error = %e, "dropping malformed datagram");
                continue;
            }
        };

        debug!(%peer, opcode = message.opcode, "datagram received");
        let reply: Arc<dyn Connection> = Arc::new(DatagramConnection::new(Arc::clone(&socket), peer));
        if !inbound.submit(message, reply) {
            debug!("inbound pipeline closed");
            break;
        }
    }

    info!("datagram listener stopped");
}
