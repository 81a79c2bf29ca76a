//! Realtime core components for the server runtime.
//!
//! Clients registry plus the egress runtime/context shared with the
//! dispatcher.

mod clients;
mod realtime;

pub use clients::ClientsRegistry;
pub use realtime::{RealtimeCore, RealtimeCtx};
