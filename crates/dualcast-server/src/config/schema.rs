use std::net::SocketAddr;

use serde::Deserialize;
use dualcast_core::error::{DualcastError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    pub server: ServerSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(DualcastError::config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.settings().map(|_| ())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Stream (WebSocket) listen address, `ip:port`.
    pub listen: Option<String>,

    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Datagram (UDP) port, bound on the listen address's IP.
    pub udp_port: Option<u32>,

    #[serde(default)]
    pub max_concurrent_dispatch: Option<usize>,

    #[serde(default)]
    pub debug_stats: bool,
}

impl ServerSection {
    pub fn settings(&self) -> Result<ServerSettings> {
        ServerSettings::resolve(
            self.listen.as_deref(),
            &self.ws_path,
            self.udp_port,
            self.max_concurrent_dispatch,
            self.debug_stats,
        )
    }
}

/// Validated startup parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub listen: SocketAddr,
    pub ws_path: String,
    pub udp_port: u16,
    pub max_concurrent_dispatch: usize,
    pub debug_stats: bool,
}

/// Paths served next to the WebSocket route.
pub const RESERVED_PATHS: [&str; 2] = ["/healthz", "/stats"];

impl ServerSettings {
    /// Validate raw parameters. Nothing is bound here.
    pub fn resolve(
        listen: Option<&str>,
        ws_path: &str,
        udp_port: Option<u32>,
        max_concurrent_dispatch: Option<usize>,
        debug_stats: bool,
    ) -> Result<Self> {
        let listen = listen
            .ok_or_else(|| DualcastError::config("server.listen is required"))?;
        let listen: SocketAddr = listen.parse().map_err(|e| {
            DualcastError::config(format!("server.listen must be ip:port ({listen}): {e}"))
        })?;

        if !ws_path.starts_with('/') {
            return Err(DualcastError::config("server.ws_path must start with '/'"));
        }
        if RESERVED_PATHS.contains(&ws_path) {
            return Err(DualcastError::config(format!(
                "server.ws_path {ws_path} collides with a built-in route"
            )));
        }

        let udp_port = udp_port
            .ok_or_else(|| DualcastError::config("server.udp_port is required"))?;
        let udp_port = u16::try_from(udp_port).map_err(|_| {
            DualcastError::config(format!("server.udp_port {udp_port} is out of range"))
        })?;

        let max_concurrent_dispatch =
            max_concurrent_dispatch.unwrap_or_else(default_max_concurrent_dispatch);
        if max_concurrent_dispatch == 0 {
            return Err(DualcastError::config(
                "server.max_concurrent_dispatch must be at least 1",
            ));
        }

        Ok(Self {
            listen,
            ws_path: ws_path.to_owned(),
            udp_port,
            max_concurrent_dispatch,
            debug_stats,
        })
    }
}

pub fn default_ws_path() -> String {
    "/ws".into()
}

/// Four dispatches per available core.
pub fn default_max_concurrent_dispatch() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_mul(4)
}
