use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use dualcast_core::error::{DualcastError, Result};
use dualcast_core::protocol::opcodes;
use dualcast_core::Message;

use crate::dispatch::Dispatcher;
use crate::realtime::RealtimeCtx;
use crate::transport::{Connection, TransportKind};

/// Demo dispatcher used by the binary.
///
/// - `PING`: answered on the arriving transport
/// - `CONNECT` over UDP: records the datagram return address of `sender_id`
/// - `DISCONNECT`: closes the arriving connection
/// - `CHAT_MESSAGE`: broadcast to everyone else
/// - `MOVE_PLAYER`, `VOICE_DATA`, `VIDEO_FRAME`: relayed to everyone else,
///   over UDP where a return address is known
/// - anything else: echoed back
#[derive(Debug, Default)]
pub struct EchoService;

impl EchoService {
    pub fn new() -> Self {
        Self
    }

    async fn relay(&self, ctx: &RealtimeCtx, message: Message) {
        let sender = message.sender_id.clone();
        for client_id in ctx.clients().client_ids() {
            if client_id == sender {
                continue;
            }
            if !ctx.send_datagram_to_client(&client_id, message.clone()).await {
                ctx.send_to_client(&client_id, message.clone()).await;
            }
        }
    }
}

#[async_trait]
impl Dispatcher for EchoService {
    async fn dispatch(
        &self,
        ctx: RealtimeCtx,
        message: Message,
        connection: Arc<dyn Connection>,
    ) -> Result<()> {
        match message.opcode {
            opcodes::PING => {
                let pong = Message::builder()
                    .opcode(opcodes::PING)
                    .to(message.sender_id.clone())
                    .raw(message.raw_payload.clone())
                    .build();
                connection.send(pong).await;
            }

            opcodes::CONNECT if connection.transport() == TransportKind::Datagram => {
                let addr = connection
                    .peer_addr()
                    .ok_or_else(|| DualcastError::dispatch("datagram without a peer address"))?;
                if !ctx.clients().update_return_address(&message.sender_id, addr) {
                    return Err(DualcastError::dispatch(format!(
                        "unknown client {:?}",
                        message.sender_id
                    )));
                }
                debug!(client_id = %message.sender_id, %addr, "datagram return address recorded");
                connection
                    .send(Message::builder().opcode(opcodes::CONNECT).to(message.sender_id).build())
                    .await;
            }

            opcodes::DISCONNECT => connection.disconnect().await,

            opcodes::CHAT_MESSAGE => {
                let sender = message.sender_id.clone();
                ctx.broadcast(message, Some(&sender)).await;
            }

            opcodes::MOVE_PLAYER | opcodes::VOICE_DATA | opcodes::VIDEO_FRAME => {
                self.relay(&ctx, message).await;
            }

            _ => connection.send(message).await,
        }
        Ok(())
    }
}
