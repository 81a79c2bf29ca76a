//! Connection capability shared by both transports.

use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;

use dualcast_core::{Message, Result};

/// Which transport a connection rides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Ordered, full-duplex WebSocket session.
    Stream,
    /// Connectionless UDP reply channel.
    Datagram,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stream => f.write_str("stream"),
            TransportKind::Datagram => f.write_str("datagram"),
        }
    }
}

/// A live peer channel.
///
/// Transport failures never surface from `send`: a failed connection closes
/// itself and later sends are dropped. `receive` reports end of stream as
/// `Ok(None)` and only returns an error for bytes that fail to decode.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Queue or transmit one message.
    async fn send(&self, message: Message);

    /// Wait for the next inbound message.
    async fn receive(&self) -> Result<Option<Message>>;

    /// Close the channel. Safe to call any number of times.
    async fn disconnect(&self);

    /// Point-in-time connectivity.
    fn is_connected(&self) -> bool;

    fn transport(&self) -> TransportKind;

    fn peer_addr(&self) -> Option<SocketAddr>;
}
