//! Stream (WebSocket) connection.
//!
//! Lifecycle: Open -> Closing -> Closed.
//! - Any trigger (explicit disconnect, peer close, send/receive failure,
//!   server shutdown) moves Open -> Closing exactly once: the outbound queue
//!   is closed and the connection token is cancelled.
//! - The send loop then writes a close frame, closes the sink, and marks the
//!   connection Closed. The sink is owned by that loop alone, so the transport
//!   is released exactly once no matter how many triggers race.

use std::fmt::Display;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{close_code, CloseFrame, Message as Frame, WebSocket};
use futures_util::stream::BoxStream;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use dualcast_core::{DualcastError, Message, Result};

use crate::transport::connection::{Connection, TransportKind};
use crate::transport::outbound::OutboundQueue;

type FrameSink = Pin<Box<dyn Sink<Frame, Error = DualcastError> + Send>>;
type FrameStream = BoxStream<'static, Result<Frame>>;

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// Upper bound on the farewell close frame; a stalled peer must not pin the
/// send loop after shutdown.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closing,
    Closed,
}

struct Shared {
    state: AtomicU8,
    queue: OutboundQueue,
    cancel: CancellationToken,
}

impl Shared {
    /// Open -> Closing. Only the first caller performs the transition.
    fn begin_close(&self, reason: &'static str) -> bool {
        if self
            .state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        debug!(reason, "stream connection closing");
        self.queue.close();
        self.cancel.cancel();
        true
    }
}

pub struct StreamConnection {
    shared: Arc<Shared>,
    inbound: Mutex<FrameStream>,
    send_loop: std::sync::Mutex<Option<JoinHandle<()>>>,
    peer: Option<SocketAddr>,
}

impl StreamConnection {
    /// Wrap an upgraded WebSocket. `shutdown` is the server-wide signal.
    pub fn from_websocket(
        socket: WebSocket,
        peer: Option<SocketAddr>,
        shutdown: &CancellationToken,
    ) -> Arc<Self> {
        let (sink, stream) = socket.split();
        Self::from_parts(sink, stream, peer, shutdown)
    }

    /// Build over any frame sink/stream pair.
    ///
    /// Must be called inside a tokio runtime: the send loop is spawned here.
    pub fn from_parts<Si, SE, St, RE>(
        sink: Si,
        stream: St,
        peer: Option<SocketAddr>,
        shutdown: &CancellationToken,
    ) -> Arc<Self>
    where
        Si: Sink<Frame, Error = SE> + Send + 'static,
        SE: Display + 'static,
        St: Stream<Item = std::result::Result<Frame, RE>> + Send + 'static,
        RE: Display + 'static,
    {
        let sink: FrameSink =
            Box::pin(sink.sink_map_err(|e| DualcastError::transport(e.to_string())));
        let stream: FrameStream = stream
            .map(|r| r.map_err(|e| DualcastError::transport(e.to_string())))
            .boxed();

        let (queue, rx) = OutboundQueue::new();
        let shared = Arc::new(Shared {
            state: AtomicU8::new(OPEN),
            queue,
            cancel: shutdown.child_token(),
        });
        let handle = tokio::spawn(send_loop(Arc::clone(&shared), rx, sink));

        Arc::new(Self {
            shared,
            inbound: Mutex::new(stream),
            send_loop: std::sync::Mutex::new(Some(handle)),
            peer,
        })
    }

    pub fn state(&self) -> ConnectionState {
        match self.shared.state.load(Ordering::Acquire) {
            OPEN if self.shared.cancel.is_cancelled() => ConnectionState::Closing,
            OPEN => ConnectionState::Open,
            CLOSING => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }

    fn take_send_loop(&self) -> Option<JoinHandle<()>> {
        match self.send_loop.lock() {
            Ok(mut g) => g.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.shared.begin_close("connection dropped");
    }
}

#[async_trait]
impl Connection for StreamConnection {
    async fn send(&self, message: Message) {
        if !self.is_connected() {
            return;
        }
        if !self.shared.queue.push(message) {
            trace!("send dropped: outbound queue closed");
        }
    }

    async fn receive(&self) -> Result<Option<Message>> {
        if !self.is_connected() {
            return Ok(None);
        }
        let mut inbound = self.inbound.lock().await;
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shared.cancel.cancelled() => {
                    self.shared.begin_close("cancelled");
                    return Ok(None);
                }
                next = inbound.next() => next,
            };

            match next {
                Some(Ok(Frame::Binary(bytes))) => return Message::decode(&bytes).map(Some),
                Some(Ok(Frame::Text(text))) => return Message::decode(text.as_bytes()).map(Some),
                Some(Ok(Frame::Ping(_))) | Some(Ok(Frame::Pong(_))) => continue,
                Some(Ok(Frame::Close(_))) => {
                    self.shared.begin_close("peer closed");
                    return Ok(None);
                }
                Some(Err(e)) => {
                    debug!(error = %e, "stream receive failed");
                    self.shared.begin_close("receive failed");
                    return Ok(None);
                }
                None => {
                    self.shared.begin_close("stream ended");
                    return Ok(None);
                }
            }
        }
    }

    async fn disconnect(&self) {
        self.shared.begin_close("disconnect requested");
        if let Some(handle) = self.take_send_loop() {
            if let Err(e) = handle.await {
                warn!(error = %e, "stream send loop task failed");
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) == OPEN && !self.shared.cancel.is_cancelled()
    }

    fn transport(&self) -> TransportKind {
        TransportKind::Stream
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

async fn send_loop(
    shared: Arc<Shared>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    mut sink: FrameSink,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(m) => m,
                None => break,
            },
        };

        let frame = Frame::Binary(message.encode().to_vec());
        let sent = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            r = sink.send(frame) => r,
        };
        if let Err(e) = sent {
            debug!(error = %e, "stream send failed");
            break;
        }
    }

    shared.begin_close("send loop finished");
    rx.close();

    let farewell = Frame::Close(Some(CloseFrame {
        code: close_code::NORMAL,
        reason: "disconnect".into(),
    }));
    match timeout(CLOSE_GRACE, sink.send(farewell)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => trace!(error = %e, "close frame not delivered"),
        Err(_) => trace!("close frame timed out"),
    }
    match timeout(CLOSE_GRACE, sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => trace!(error = %e, "sink close failed"),
        Err(_) => trace!("sink close timed out"),
    }

    shared.state.store(CLOSED, Ordering::Release);
}
