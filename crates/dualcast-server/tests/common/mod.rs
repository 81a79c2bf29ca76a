//! Shared fixtures: recording connections and an in-memory frame transport.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::Message as Frame;
use futures::channel::mpsc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use dualcast_core::{Message, Result};
use dualcast_server::transport::StreamConnection;
use dualcast_server::{Connection, TransportKind};

/// Connection that keeps every message it is asked to send.
pub struct RecordingConnection {
    sent: Mutex<Vec<Message>>,
    transport: TransportKind,
    peer: Option<SocketAddr>,
    panic_on_send: bool,
    connected: AtomicBool,
}

impl RecordingConnection {
    pub fn stream() -> Arc<Self> {
        Arc::new(Self::new(TransportKind::Stream, None, false))
    }

    pub fn datagram(peer: SocketAddr) -> Arc<Self> {
        Arc::new(Self::new(TransportKind::Datagram, Some(peer), false))
    }

    pub fn panicking() -> Arc<Self> {
        Arc::new(Self::new(TransportKind::Stream, None, true))
    }

    fn new(transport: TransportKind, peer: Option<SocketAddr>, panic_on_send: bool) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            transport,
            peer,
            panic_on_send,
            connected: AtomicBool::new(true),
        }
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn send(&self, message: Message) {
        if self.panic_on_send {
            panic!("recipient exploded");
        }
        self.sent.lock().unwrap().push(message);
    }

    async fn receive(&self) -> Result<Option<Message>> {
        Ok(None)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn transport(&self) -> TransportKind {
        self.transport
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

/// The far end of an in-memory stream connection.
pub struct Peer {
    pub to_server: mpsc::UnboundedSender<std::result::Result<Frame, String>>,
    pub from_server: mpsc::UnboundedReceiver<Frame>,
}

impl Peer {
    pub fn send_message(&self, message: &Message) {
        self.to_server
            .unbounded_send(Ok(Frame::Binary(message.encode().to_vec())))
            .unwrap();
    }

    pub fn send_frame(&self, frame: Frame) {
        self.to_server.unbounded_send(Ok(frame)).unwrap();
    }

    /// Next frame written by the server, or `None` once the sink is closed.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        tokio::time::timeout(Duration::from_secs(5), self.from_server.next())
            .await
            .expect("timed out waiting for a frame")
    }

    /// Next binary frame decoded as an envelope.
    pub async fn next_message(&mut self) -> Message {
        match self.next_frame().await {
            Some(Frame::Binary(bytes)) => Message::decode(&bytes).unwrap(),
            other => panic!("expected a binary frame, got {other:?}"),
        }
    }

    /// Drain until the server closes its side.
    pub async fn drain(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(f) = self.next_frame().await {
            frames.push(f);
        }
        frames
    }
}

pub fn memory_stream(shutdown: &CancellationToken) -> (Arc<StreamConnection>, Peer) {
    let (to_server, server_in) = mpsc::unbounded::<std::result::Result<Frame, String>>();
    let (server_out, from_server) = mpsc::unbounded::<Frame>();
    let peer_addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    let conn = StreamConnection::from_parts(server_out, server_in, Some(peer_addr), shutdown);
    (
        conn,
        Peer {
            to_server,
            from_server,
        },
    )
}

/// Poll `cond` until it holds or the deadline passes.
pub async fn eventually<F: Fn() -> bool>(within: Duration, cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
