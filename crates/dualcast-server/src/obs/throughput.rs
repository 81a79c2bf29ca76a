//! Dispatch throughput counter and its once-per-second reporter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Counts messages taken off the inbound queue.
///
/// `window` is reset by the reporter; `total` only grows.
#[derive(Debug, Default)]
pub struct ThroughputCounter {
    window: AtomicU64,
    total: AtomicU64,
}

impl ThroughputCounter {
    pub fn record(&self) {
        self.window.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically read and reset the current window.
    pub fn take_window(&self) -> u64 {
        self.window.swap(0, Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

/// Log the per-window count every `every` until shutdown.
pub async fn run_reporter(
    counter: Arc<ThroughputCounter>,
    every: Duration,
    shutdown: CancellationToken,
) {
    let mut tick = interval_at(Instant::now() + every, every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = tick.tick() => {
                let messages_per_sec = counter.take_window() as f64 / every.as_secs_f64();
                info!(messages_per_sec, "dispatch throughput");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_resets_total_does_not() {
        let c = ThroughputCounter::default();
        for _ in 0..5 {
            c.record();
        }
        assert_eq!(c.take_window(), 5);
        assert_eq!(c.take_window(), 0);
        c.record();
        assert_eq!(c.take_window(), 1);
        assert_eq!(c.total(), 6);
    }
}
