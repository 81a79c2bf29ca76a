//! Per-connection outbound queue.
//!
//! Unbounded and single-consumer: producers never wait, the connection's send
//! loop is the only reader. Closing drops the sender so the reader observes
//! the end of the queue and later pushes are discarded.

use std::sync::Mutex;

use tokio::sync::mpsc;

use dualcast_core::Message;

pub struct OutboundQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<Message>>>,
}

impl OutboundQueue {
    /// Create the queue and hand back its single reader.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Mutex::new(Some(tx)) }, rx)
    }

    /// Enqueue in arrival order. Returns false when the queue is closed.
    pub fn push(&self, message: Message) -> bool {
        let guard = match self.tx.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_ref() {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Close the queue. Returns true only for the call that closed it.
    pub fn close(&self) -> bool {
        let mut guard = match self.tx.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        match self.tx.lock() {
            Ok(g) => g.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}
