//! WebSocket session handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Assign a client id and register the connection
//! - Stamp `sender_id` on every inbound message and submit it for dispatch
//! - Tear down on peer close, malformed frame or server shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocket, ws::WebSocketUpgrade, ConnectInfo, State},
    response::Response,
};
use tracing::{info, info_span, warn, Instrument};

use dualcast_core::protocol::opcodes;
use dualcast_core::Message;

use crate::app_state::AppState;
use crate::dispatch::InboundSender;
use crate::realtime::RealtimeCore;
use crate::transport::connection::Connection;
use crate::transport::stream::StreamConnection;

pub async fn ws_upgrade(
    State(app): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_session(app, peer, socket))
}

async fn run_session(app: AppState, peer: SocketAddr, socket: WebSocket) {
    let conn = StreamConnection::from_websocket(socket, Some(peer), app.shutdown());
    serve_stream(app.core(), app.inbound(), conn).await;
}

/// Drive one stream connection from registration to removal.
///
/// The peer is greeted with a `CONNECT` envelope whose `recipient_id` carries
/// its assigned client id. Returns that id once the session is over.
pub async fn serve_stream(
    core: &RealtimeCore,
    inbound: &InboundSender,
    conn: Arc<dyn Connection>,
) -> String {
    let client_id = core.clients.generate_client_id();
    let span = info_span!("session", client_id = %client_id, peer = ?conn.peer_addr());

    async {
        core.clients.add(client_id.clone(), Arc::clone(&conn));
        info!(clients = core.clients.len(), "client connected");

        conn.send(
            Message::builder()
                .opcode(opcodes::CONNECT)
                .to(client_id.clone())
                .build(),
        )
        .await;

        receive_loop(inbound, &client_id, Arc::clone(&conn)).await;

        core.clients.remove(&client_id);
        conn.disconnect().await;
        info!(clients = core.clients.len(), "client disconnected");
    }
    .instrument(span)
    .await;

    client_id
}

async fn receive_loop(inbound: &InboundSender, client_id: &str, conn: Arc<dyn Connection>) {
    while conn.is_connected() {
        match conn.receive().await {
            Ok(Some(mut message)) => {
                message.sender_id = client_id.to_owned();
                if !inbound.submit(message, Arc::clone(&conn)) {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "closing session after malformed frame");
                break;
            }
        }
    }
}
