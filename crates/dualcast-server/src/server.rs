//! Server assembly: builder, startup and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use dualcast_core::error::{DualcastError, Result};

use crate::app_state::AppState;
use crate::config::schema::default_ws_path;
use crate::config::{ServerConfig, ServerSettings};
use crate::dispatch::{Dispatcher, InboundPipeline, PipelineStats};
use crate::obs;
use crate::realtime::{RealtimeCore, RealtimeCtx};
use crate::router::build_router;
use crate::transport::datagram;

const STATS_WINDOW: Duration = Duration::from_secs(1);

/// Builder for a [`Server`].
///
/// `build` validates every parameter and fails fast with a `CONFIG` error;
/// no socket is bound until [`Server::start`].
///
/// # Example
///
/// ```rust,ignore
/// let handle = Server::builder()
///     .listen("127.0.0.1:8080")
///     .udp_port(9000)
///     .dispatcher(Arc::new(EchoService::new()))
///     .build()?
///     .start()
///     .await?;
/// ```
pub struct ServerBuilder {
    listen: Option<String>,
    ws_path: String,
    udp_port: Option<u32>,
    max_concurrent_dispatch: Option<usize>,
    debug_stats: bool,
    dispatcher: Option<Arc<dyn Dispatcher>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            listen: None,
            ws_path: default_ws_path(),
            udp_port: None,
            max_concurrent_dispatch: None,
            debug_stats: false,
            dispatcher: None,
        }
    }

    /// Seed every parameter from a loaded config. The dispatcher is still
    /// required.
    pub fn from_config(cfg: &ServerConfig) -> Self {
        let s = &cfg.server;
        Self {
            listen: s.listen.clone(),
            ws_path: s.ws_path.clone(),
            udp_port: s.udp_port,
            max_concurrent_dispatch: s.max_concurrent_dispatch,
            debug_stats: s.debug_stats,
            dispatcher: None,
        }
    }

    /// Stream listen address, `ip:port`. Port 0 picks a free port.
    pub fn listen(mut self, addr: impl Into<String>) -> Self {
        self.listen = Some(addr.into());
        self
    }

    /// Default: `/ws`
    pub fn ws_path(mut self, path: impl Into<String>) -> Self {
        self.ws_path = path.into();
        self
    }

    /// Datagram port on the listen IP. Required; 0 picks a free port.
    pub fn udp_port(mut self, port: u32) -> Self {
        self.udp_port = Some(port);
        self
    }

    /// Default: four per available core.
    pub fn max_concurrent_dispatch(mut self, n: usize) -> Self {
        self.max_concurrent_dispatch = Some(n);
        self
    }

    /// Log dispatch throughput once per second.
    ///
    /// Default: `false`
    pub fn debug_stats(mut self, enable: bool) -> Self {
        self.debug_stats = enable;
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn build(self) -> Result<Server> {
        let settings = ServerSettings::resolve(
            self.listen.as_deref(),
            &self.ws_path,
            self.udp_port,
            self.max_concurrent_dispatch,
            self.debug_stats,
        )?;
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| DualcastError::config("a dispatcher is required"))?;

        Ok(Server {
            settings,
            dispatcher,
            core: Arc::new(RealtimeCore::new()),
        })
    }
}

/// A configured, not yet started server.
pub struct Server {
    settings: ServerSettings,
    dispatcher: Arc<dyn Dispatcher>,
    core: Arc<RealtimeCore>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    pub fn core(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.core)
    }

    /// Bind both sockets and spawn the listeners, the pipeline consumer and
    /// (optionally) the throughput reporter.
    pub async fn start(self) -> Result<ServerHandle> {
        let Server {
            settings,
            dispatcher,
            core,
        } = self;
        let shutdown = CancellationToken::new();

        let udp = UdpSocket::bind(SocketAddr::new(settings.listen.ip(), settings.udp_port))
            .await
            .map_err(|e| DualcastError::transport(format!("udp bind failed: {e}")))?;
        let tcp = TcpListener::bind(settings.listen)
            .await
            .map_err(|e| DualcastError::transport(format!("tcp bind failed: {e}")))?;

        let udp_addr = udp
            .local_addr()
            .map_err(|e| DualcastError::transport(e.to_string()))?;
        let ws_addr = tcp
            .local_addr()
            .map_err(|e| DualcastError::transport(e.to_string()))?;

        let udp = Arc::new(udp);
        core.attach_datagram_socket(Arc::clone(&udp));

        let (inbound, pipeline) = InboundPipeline::new(settings.max_concurrent_dispatch);
        let stats = pipeline.stats();

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(pipeline.run(
            dispatcher,
            RealtimeCtx::new(Arc::clone(&core)),
            shutdown.clone(),
        )));
        tasks.push(tokio::spawn(datagram::run_listener(
            udp,
            inbound.clone(),
            shutdown.clone(),
        )));

        if settings.debug_stats {
            tasks.push(tokio::spawn(obs::run_reporter(
                stats.counter(),
                STATS_WINDOW,
                shutdown.clone(),
            )));
        } else {
            debug!("throughput reporting disabled");
        }

        let ws_path = settings.ws_path.clone();
        let state = AppState::new(
            settings,
            Arc::clone(&core),
            inbound,
            stats.clone(),
            shutdown.clone(),
        );
        let app = build_router(state)
            .into_make_service_with_connect_info::<SocketAddr>();
        let http_shutdown = shutdown.clone();
        tasks.push(tokio::spawn(async move {
            let served = axum::serve(tcp, app)
                .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
                .await;
            if let Err(e) = served {
                error!(error = %e, "stream listener failed");
            }
        }));

        info!(%ws_addr, %ws_path, %udp_addr, "dualcast server started");

        Ok(ServerHandle {
            ws_addr,
            udp_addr,
            core,
            stats,
            shutdown,
            tasks,
        })
    }
}

/// A running server.
pub struct ServerHandle {
    ws_addr: SocketAddr,
    udp_addr: SocketAddr,
    core: Arc<RealtimeCore>,
    stats: PipelineStats,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn ws_addr(&self) -> SocketAddr {
        self.ws_addr
    }

    pub fn udp_addr(&self) -> SocketAddr {
        self.udp_addr
    }

    pub fn core(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.core)
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Signal observed by every connection and background task.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Signal shutdown and wait for the background tasks to finish.
    ///
    /// Dispatches already in flight are not awaited.
    pub async fn stop(self) {
        info!("dualcast server stopping");
        self.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "background task failed");
            }
        }
        info!("dualcast server stopped");
    }
}
