//! Protocol modules (envelope + payload).
//!
//! Two layers share one wire format on every transport:
//! - Envelope: fixed-shape header (opcode, sender, recipient) around two
//!   opaque byte blocks.
//! - Payload: static-type-driven binary encoding of the typed value carried
//!   in the envelope's `payload` block.
//!
//! All parsers are panic-free: malformed input is reported as
//! `DualcastError::Decode` instead of panicking or indexing raw buffers.

pub mod envelope;
pub mod opcodes;
pub mod payload;
