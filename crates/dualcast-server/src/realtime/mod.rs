//! Realtime runtime (egress engine).

pub mod core;

pub use core::{ClientsRegistry, RealtimeCore, RealtimeCtx};
