use std::sync::Arc;

use async_trait::async_trait;

use dualcast_core::{Message, Result};

use crate::realtime::RealtimeCtx;
use crate::transport::Connection;

/// Application handler for inbound messages from either transport.
///
/// Invoked concurrently, at most `max_concurrent_dispatch` at a time.
/// `connection` replies on the transport the message arrived on. An error or
/// panic is logged and affects only the one message.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        ctx: RealtimeCtx,
        message: Message,
        connection: Arc<dyn Connection>,
    ) -> Result<()>;
}
