//! dualcast core: transport-agnostic wire codecs and the shared error type.
//!
//! This crate defines the message envelope, the static-type-driven payload
//! codec, and the error surface shared by the server and by client tooling.
//! It carries no socket or runtime dependencies so it can be reused on both
//! ends of a connection.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `DualcastError`/`Result` so production
//! processes do not crash on malformed input or bad traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{DualcastError, ErrorKind, Result};
pub use protocol::envelope::{Message, MessageBuilder};
pub use protocol::payload::{Payload, PayloadReader, PayloadWriter};
