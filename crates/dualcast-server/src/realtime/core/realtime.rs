use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use dualcast_core::Message;

use crate::realtime::core::ClientsRegistry;
use crate::transport::{Connection, DatagramConnection};

/// RealtimeCore: egress engine (send to one client / broadcast to all).
pub struct RealtimeCore {
    pub clients: Arc<ClientsRegistry>,
    datagram: OnceLock<Arc<UdpSocket>>,
}

impl Default for RealtimeCore {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeCore {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(ClientsRegistry::new()),
            datagram: OnceLock::new(),
        }
    }

    /// Share the server's UDP socket for datagram egress. First call wins.
    pub fn attach_datagram_socket(&self, socket: Arc<UdpSocket>) {
        if self.datagram.set(socket).is_err() {
            warn!("datagram socket already attached");
        }
    }

    /// Send over the client's connection if it is still connected.
    /// Unknown or disconnected clients are a silent no-op (returns false).
    pub async fn send_to_client(&self, client_id: &str, message: Message) -> bool {
        match self.clients.lookup(client_id) {
            Some(conn) if conn.is_connected() => {
                conn.send(message).await;
                true
            }
            Some(_) => {
                debug!(client_id, "send_to_client: client disconnected");
                false
            }
            None => {
                debug!(client_id, "send_to_client: unknown client");
                false
            }
        }
    }

    /// Deliver one message to every connected client except `exclude`.
    ///
    /// Recipients are taken from a snapshot and served concurrently, one task
    /// each; a panicking recipient is logged and does not affect the others.
    /// Returns the number of recipients attempted.
    pub async fn broadcast(&self, message: Message, exclude: Option<&str>) -> usize {
        let targets: Vec<(String, Arc<dyn Connection>)> = self
            .clients
            .snapshot()
            .into_iter()
            .filter(|(id, conn)| Some(id.as_str()) != exclude && conn.is_connected())
            .collect();
        let attempted = targets.len();

        let mut tasks = JoinSet::new();
        for (_, conn) in targets {
            let message = message.clone();
            tasks.spawn(async move { conn.send(message).await });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "broadcast recipient failed");
            }
        }
        attempted
    }

    /// Send over UDP to the client's recorded return address.
    pub async fn send_datagram_to_client(&self, client_id: &str, message: Message) -> bool {
        let Some(addr) = self.clients.return_address(client_id) else {
            debug!(client_id, "no datagram return address");
            return false;
        };
        self.send_datagram_to(addr, message).await
    }

    pub async fn send_datagram_to(&self, addr: SocketAddr, message: Message) -> bool {
        let Some(socket) = self.datagram.get() else {
            warn!("datagram egress requested before the socket was attached");
            return false;
        };
        DatagramConnection::new(Arc::clone(socket), addr).send(message).await;
        true
    }
}

/// Per-message context passed to the dispatcher.
#[derive(Clone)]
pub struct RealtimeCtx {
    core: Arc<RealtimeCore>,
}

impl RealtimeCtx {
    pub fn new(core: Arc<RealtimeCore>) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &RealtimeCore {
        &self.core
    }

    pub fn clients(&self) -> &ClientsRegistry {
        &self.core.clients
    }

    pub async fn send_to_client(&self, client_id: &str, message: Message) -> bool {
        self.core.send_to_client(client_id, message).await
    }

    pub async fn broadcast(&self, message: Message, exclude: Option<&str>) -> usize {
        self.core.broadcast(message, exclude).await
    }

    pub async fn send_datagram_to_client(&self, client_id: &str, message: Message) -> bool {
        self.core.send_datagram_to_client(client_id, message).await
    }
}
