//! Static-type-driven payload codec.
//!
//! The wire carries no type tags: the reader must name the exact type the
//! writer used. Each type declares its [`Shape`], and the shape decides which
//! framing surrounds the type's body:
//!
//! | shape       | framing written by [`write`]                 | `Option::None`      |
//! |-------------|----------------------------------------------|---------------------|
//! | `Value`     | body only                                    | `0u8`               |
//! | `Text`      | body only (the body starts with its length)  | length `-1`         |
//! | `Reference` | presence byte `1`, then body                 | presence byte `0`   |
//!
//! Value shapes wrapped in `Option` get a presence byte in front of the body.
//!
//! Nested values must always go through [`write`] / [`read`] (never call
//! `encode`/`decode` on a field directly) so the framing rules apply at every
//! level.
//!
//! Integers and floats are little-endian. Instants and durations are 100 ns
//! ticks; instants count from `0001-01-01T00:00:00Z`.

mod collections;
mod decimal;
mod object;
mod primitives;
mod reader;
mod temporal;
mod writer;

use bytes::Bytes;

use crate::error::{DualcastError, Result};

pub use decimal::Decimal128;
pub use object::FieldOrder;
pub use reader::PayloadReader;
pub use temporal::{ticks_to_utc, utc_to_ticks, TICKS_PER_SECOND};
pub use writer::PayloadWriter;

/// Framing class of a payload type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Fixed or self-contained encoding; nullable only through `Option`.
    Value,
    /// Length-prefixed text whose absence is encoded as length `-1`.
    Text,
    /// Collection, map, array or object: always preceded by a presence byte.
    Reference,
}

/// A type the payload codec can write and read.
///
/// `encode`/`decode` handle the body only; framing is applied by [`write`]
/// and [`read`]. Plain structs implement this through
/// [`payload_object!`](crate::payload_object) and fieldless enums through
/// [`payload_enum!`](crate::payload_enum).
pub trait Payload: Sized {
    const SHAPE: Shape = Shape::Value;

    fn encode(&self, w: &mut PayloadWriter);

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self>;
}

/// Write `value` with the framing its shape requires.
pub fn write<T: Payload>(value: &T, w: &mut PayloadWriter) {
    if T::SHAPE == Shape::Reference {
        w.put_presence(true);
    }
    value.encode(w);
}

/// Read a non-optional `T` written by [`write`].
pub fn read<T: Payload>(r: &mut PayloadReader<'_>) -> Result<T> {
    if T::SHAPE == Shape::Reference && !r.get_presence()? {
        return Err(DualcastError::decode(format!(
            "null {} where a value is required",
            std::any::type_name::<T>()
        )));
    }
    T::decode(r)
}

/// Encode a single value into a standalone byte block.
pub fn to_bytes<T: Payload>(value: &T) -> Bytes {
    let mut w = PayloadWriter::new();
    write(value, &mut w);
    w.into_bytes()
}

/// Decode a standalone byte block produced by [`to_bytes`].
pub fn from_bytes<T: Payload>(bytes: &[u8]) -> Result<T> {
    let mut r = PayloadReader::new(bytes);
    let value = read(&mut r)?;
    r.finish()?;
    Ok(value)
}
