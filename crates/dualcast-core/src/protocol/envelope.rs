//! Message envelope encoding (panic-free).
//!
//! Wire layout, little-endian:
//! - `opcode`: i32
//! - `sender_id`, `recipient_id`: 7-bit varint byte length + UTF-8
//! - `payload`, `raw_payload`: i32 byte length + bytes
//!
//! Parsing rules:
//! - Never index (`buf[0]`); always use `Buf` and `remaining()` checks.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{DualcastError, Result};
use crate::protocol::payload::{self, Payload};

/// A 7-bit varint never spans more than five bytes for a 32-bit length.
const MAX_VARINT_BYTES: usize = 5;

/// Envelope around every transmitted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Application opcode; values below `opcodes::CUSTOM_CODES` are reserved.
    pub opcode: i32,
    /// Empty until stamped by the receiving server for stream messages.
    pub sender_id: String,
    /// Routing hint; not enforced by the server.
    pub recipient_id: String,
    /// Bytes produced by the payload codec.
    pub payload: Bytes,
    /// Pre-encoded bytes that bypass the payload codec.
    pub raw_payload: Bytes,
}

impl Message {
    pub fn new(opcode: i32) -> Self {
        Self {
            opcode,
            ..Self::default()
        }
    }

    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        4 + varint_len(self.sender_id.len())
            + self.sender_id.len()
            + varint_len(self.recipient_id.len())
            + self.recipient_id.len()
            + 4
            + self.payload.len()
            + 4
            + self.raw_payload.len()
    }

    /// Serialize the envelope.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_i32_le(self.opcode);
        put_str(&mut buf, &self.sender_id);
        put_str(&mut buf, &self.recipient_id);
        put_block(&mut buf, &self.payload);
        put_block(&mut buf, &self.raw_payload);
        buf.freeze()
    }

    /// Parse an envelope; the input must contain exactly one message.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.remaining() < 4 {
            return Err(DualcastError::decode("envelope too short for opcode"));
        }
        let opcode = buf.get_i32_le();
        let sender_id = get_str(&mut buf, "sender_id")?;
        let recipient_id = get_str(&mut buf, "recipient_id")?;
        let payload = get_block(&mut buf, "payload")?;
        let raw_payload = get_block(&mut buf, "raw_payload")?;

        if buf.has_remaining() {
            return Err(DualcastError::decode(format!(
                "{} trailing bytes after envelope",
                buf.remaining()
            )));
        }

        Ok(Self {
            opcode,
            sender_id,
            recipient_id,
            payload,
            raw_payload,
        })
    }

    /// Decode the payload block as `T`.
    ///
    /// The caller must name the same type the sender encoded; the bytes carry
    /// no type information.
    pub fn data<T: Payload>(&self) -> Result<T> {
        payload::from_bytes(&self.payload)
    }

    /// Replace the payload block with the encoding of `value`.
    pub fn set_data<T: Payload>(&mut self, value: &T) {
        self.payload = payload::to_bytes(value);
    }
}

/// Fluent constructor for [`Message`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    msg: Message,
}

impl MessageBuilder {
    pub fn opcode(mut self, opcode: i32) -> Self {
        self.msg.opcode = opcode;
        self
    }

    pub fn from(mut self, sender: impl Into<String>) -> Self {
        self.msg.sender_id = sender.into();
        self
    }

    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.msg.recipient_id = recipient.into();
        self
    }

    pub fn data<T: Payload>(mut self, value: &T) -> Self {
        self.msg.set_data(value);
        self
    }

    pub fn raw(mut self, raw: impl Into<Bytes>) -> Self {
        self.msg.raw_payload = raw.into();
        self
    }

    pub fn build(self) -> Message {
        self.msg
    }
}

fn varint_len(mut n: usize) -> usize {
    let mut len = 1;
    while n >= 0x80 {
        n >>= 7;
        len += 1;
    }
    len
}

fn put_str(buf: &mut BytesMut, s: &str) {
    let mut n = s.len();
    while n >= 0x80 {
        buf.put_u8((n as u8 & 0x7F) | 0x80);
        n >>= 7;
    }
    buf.put_u8(n as u8);
    buf.put_slice(s.as_bytes());
}

fn put_block(buf: &mut BytesMut, block: &[u8]) {
    buf.put_i32_le(block.len() as i32);
    buf.put_slice(block);
}

fn get_varint(buf: &mut &[u8], field: &str) -> Result<usize> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_BYTES {
        if !buf.has_remaining() {
            return Err(DualcastError::decode(format!("{field}: truncated length prefix")));
        }
        let b = buf.get_u8();
        value |= u64::from(b & 0x7F) << (7 * i);
        if b & 0x80 == 0 {
            if value > i32::MAX as u64 {
                return Err(DualcastError::decode(format!("{field}: length overflows i32")));
            }
            return Ok(value as usize);
        }
    }
    Err(DualcastError::decode(format!("{field}: length prefix longer than 5 bytes")))
}

fn get_str(buf: &mut &[u8], field: &str) -> Result<String> {
    let len = get_varint(buf, field)?;
    if buf.remaining() < len {
        return Err(DualcastError::decode(format!(
            "{field}: declared {len} bytes, {} remaining",
            buf.remaining()
        )));
    }
    let (head, tail) = buf.split_at(len);
    let s = std::str::from_utf8(head)
        .map_err(|e| DualcastError::decode(format!("{field}: invalid utf-8: {e}")))?
        .to_owned();
    *buf = tail;
    Ok(s)
}

fn get_block(buf: &mut &[u8], field: &str) -> Result<Bytes> {
    if buf.remaining() < 4 {
        return Err(DualcastError::decode(format!("{field}: truncated length")));
    }
    let len = buf.get_i32_le();
    if len < 0 {
        return Err(DualcastError::decode(format!("{field}: negative length {len}")));
    }
    let len = len as usize;
    if buf.remaining() < len {
        return Err(DualcastError::decode(format!(
            "{field}: declared {len} bytes, {} remaining",
            buf.remaining()
        )));
    }
    Ok(buf.copy_to_bytes(len))
}
