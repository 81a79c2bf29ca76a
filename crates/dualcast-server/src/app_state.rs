//! Shared state handed to the HTTP/WS handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerSettings;
use crate::dispatch::{InboundSender, PipelineStats};
use crate::realtime::RealtimeCore;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    core: Arc<RealtimeCore>,
}

struct AppStateInner {
    settings: ServerSettings,
    inbound: InboundSender,
    stats: PipelineStats,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        settings: ServerSettings,
        core: Arc<RealtimeCore>,
        inbound: InboundSender,
        stats: PipelineStats,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                settings,
                inbound,
                stats,
                shutdown,
            }),
            core,
        }
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.inner.settings
    }

    pub fn core(&self) -> &RealtimeCore {
        &self.core
    }

    pub fn inbound(&self) -> &InboundSender {
        &self.inner.inbound
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.inner.stats
    }

    /// Server-wide shutdown signal.
    pub fn shutdown(&self) -> &CancellationToken {
        &self.inner.shutdown
    }
}
