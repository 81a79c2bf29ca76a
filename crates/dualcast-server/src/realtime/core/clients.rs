use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::transport::Connection;

#[derive(Clone)]
struct ClientRecord {
    conn: Arc<dyn Connection>,
    return_address: Option<SocketAddr>,
}

/// Live clients:
/// - `client_id -> connection`
/// - `client_id -> datagram return address` (optional, set by the application)
///
/// Safe for concurrent use; every operation observes a consistent state for
/// the key it touches.
#[derive(Default)]
pub struct ClientsRegistry {
    clients: DashMap<String, ClientRecord>,
}

impl ClientsRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Fresh identifier, never derived from the peer's address.
    pub fn generate_client_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Register (or replace) a client. A replaced entry loses its return address.
    pub fn add(&self, client_id: impl Into<String>, conn: Arc<dyn Connection>) {
        self.clients.insert(
            client_id.into(),
            ClientRecord {
                conn,
                return_address: None,
            },
        );
    }

    pub fn remove(&self, client_id: &str) -> Option<Arc<dyn Connection>> {
        self.clients.remove(client_id).map(|(_, rec)| rec.conn)
    }

    pub fn lookup(&self, client_id: &str) -> Option<Arc<dyn Connection>> {
        self.clients.get(client_id).map(|r| Arc::clone(&r.value().conn))
    }

    /// Point-in-time copy; later registry changes do not affect it.
    pub fn snapshot(&self) -> HashMap<String, Arc<dyn Connection>> {
        self.clients
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(&e.value().conn)))
            .collect()
    }

    pub fn client_ids(&self) -> Vec<String> {
        self.clients.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Record where datagrams for this client should go.
    /// Returns false when the client is not registered.
    pub fn update_return_address(&self, client_id: &str, addr: SocketAddr) -> bool {
        match self.clients.get_mut(client_id) {
            Some(mut rec) => {
                rec.return_address = Some(addr);
                true
            }
            None => false,
        }
    }

    pub fn return_address(&self, client_id: &str) -> Option<SocketAddr> {
        self.clients.get(client_id).and_then(|r| r.value().return_address)
    }
}
