//! dualcast server binary.
//!
//! - WebSocket endpoint: `server.ws_path` on `server.listen`
//! - UDP datagrams on `server.udp_port`
//! - Demo dispatcher: [`EchoService`]
//!
//! Usage: `dualcast-server [config.yaml]` (default `dualcast.yaml`).

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use dualcast_server::services::EchoService;
use dualcast_server::{config, ServerBuilder};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dualcast.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");

    let server = ServerBuilder::from_config(&cfg)
        .dispatcher(Arc::new(EchoService::new()))
        .build()
        .expect("invalid server settings");

    let handle = server.start().await.expect("server failed to start");
    tracing::info!(ws = %handle.ws_addr(), udp = %handle.udp_addr(), "dualcast-server running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    handle.stop().await;
}
