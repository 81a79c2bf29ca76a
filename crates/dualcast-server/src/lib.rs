//! dualcast server library entry.
//!
//! This crate wires the stream and datagram transports, the clients registry,
//! the bounded dispatch pipeline and the built-in services into one server.
//! It is consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod server;
pub mod services;
pub mod transport;

pub use dispatch::Dispatcher;
pub use realtime::{ClientsRegistry, RealtimeCore, RealtimeCtx};
pub use server::{Server, ServerBuilder, ServerHandle};
pub use transport::{Connection, TransportKind};
