//! Inbound pipeline: one unbounded queue fed by both transports, drained by a
//! single consumer that admits at most `max_concurrent` dispatches at once.
//!
//! Every dequeued item is counted exactly once and dispatched exactly once.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use dualcast_core::Message;

use crate::dispatch::Dispatcher;
use crate::obs::ThroughputCounter;
use crate::realtime::RealtimeCtx;
use crate::transport::Connection;

struct Inbound {
    message: Message,
    connection: Arc<dyn Connection>,
}

/// Producer side, shared by every transport.
#[derive(Clone)]
pub struct InboundSender {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl InboundSender {
    /// Enqueue without waiting. Returns false once the pipeline has stopped.
    pub fn submit(&self, message: Message, connection: Arc<dyn Connection>) -> bool {
        self.tx.send(Inbound { message, connection }).is_ok()
    }
}

/// Read-only view of pipeline activity.
#[derive(Clone)]
pub struct PipelineStats {
    counter: Arc<ThroughputCounter>,
    gate: Arc<Semaphore>,
    max_concurrent: usize,
}

impl PipelineStats {
    pub fn counter(&self) -> Arc<ThroughputCounter> {
        Arc::clone(&self.counter)
    }

    pub fn dispatched_total(&self) -> u64 {
        self.counter.total()
    }

    pub fn in_flight(&self) -> usize {
        self.max_concurrent.saturating_sub(self.gate.available_permits())
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

pub struct InboundPipeline {
    rx: mpsc::UnboundedReceiver<Inbound>,
    stats: PipelineStats,
}

impl InboundPipeline {
    /// `max_concurrent` is clamped to at least 1.
    pub fn new(max_concurrent: usize) -> (InboundSender, Self) {
        let max_concurrent = max_concurrent.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = PipelineStats {
            counter: Arc::new(ThroughputCounter::default()),
            gate: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        };
        (InboundSender { tx }, Self { rx, stats })
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats.clone()
    }

    /// Consume until shutdown or until every sender is gone.
    ///
    /// Dispatches already running are not awaited.
    pub async fn run(
        mut self,
        dispatcher: Arc<dyn Dispatcher>,
        ctx: RealtimeCtx,
        shutdown: CancellationToken,
    ) {
        info!(max_concurrent = self.stats.max_concurrent, "inbound pipeline started");

        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = self.rx.recv() => match next {
                    Some(item) => item,
                    None => break,
                },
            };
            self.stats.counter.record();

            let permit = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                p = Arc::clone(&self.stats.gate).acquire_owned() => match p {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };

            let dispatcher = Arc::clone(&dispatcher);
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let _permit = permit;
                dispatch_one(dispatcher.as_ref(), ctx, item).await;
            });
        }

        self.rx.close();
        info!("inbound pipeline stopped");
    }
}

async fn dispatch_one(dispatcher: &dyn Dispatcher, ctx: RealtimeCtx, item: Inbound) {
    let opcode = item.message.opcode;
    let transport = item.connection.transport();
    debug!(opcode, %transport, "dispatching");

    let outcome = AssertUnwindSafe(dispatcher.dispatch(ctx, item.message, item.connection))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(opcode, %transport, error = %e, "dispatch failed"),
        Err(panic) => error!(opcode, %transport, panic = panic_message(&*panic), "dispatch panicked"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
