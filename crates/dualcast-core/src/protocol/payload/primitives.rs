//! Fixed-width primitives, text, and `Option`.

use crate::error::{DualcastError, Result};

use super::{read, write, Payload, PayloadReader, PayloadWriter, Shape};

macro_rules! fixed_payload {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl Payload for $ty {
                fn encode(&self, w: &mut PayloadWriter) {
                    w.$put(*self);
                }

                fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
                    r.$get()
                }
            }
        )*
    };
}

fixed_payload! {
    bool => put_bool, get_bool;
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    i16 => put_i16, get_i16;
    u16 => put_u16, get_u16;
    i32 => put_i32, get_i32;
    u32 => put_u32, get_u32;
    i64 => put_i64, get_i64;
    u64 => put_u64, get_u64;
    f32 => put_f32, get_f32;
    f64 => put_f64, get_f64;
}

/// Length marking an absent string.
const NULL_TEXT_LEN: i32 = -1;

impl Payload for String {
    const SHAPE: Shape = Shape::Text;

    fn encode(&self, w: &mut PayloadWriter) {
        w.put_count(self.len());
        w.put_slice(self.as_bytes());
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let len = r.get_i32()?;
        if len == NULL_TEXT_LEN {
            return Err(DualcastError::decode("null string where a value is required"));
        }
        if len < 0 {
            return Err(DualcastError::decode(format!("negative string length {len}")));
        }
        let bytes = r.get_slice(len as usize)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| DualcastError::decode(format!("invalid utf-8: {e}")))
    }
}

impl<T: Payload> Payload for Option<T> {
    fn encode(&self, w: &mut PayloadWriter) {
        match (T::SHAPE, self) {
            (Shape::Text, None) => w.put_i32(NULL_TEXT_LEN),
            (Shape::Reference, None) => w.put_presence(false),
            (Shape::Value, None) => w.put_presence(false),
            (Shape::Value, Some(v)) => {
                w.put_presence(true);
                write(v, w);
            }
            // Text and reference shapes already carry their own presence marker.
            (_, Some(v)) => write(v, w),
        }
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        match T::SHAPE {
            Shape::Text => {
                if r.peek_i32()? == NULL_TEXT_LEN {
                    r.get_i32()?;
                    return Ok(None);
                }
                read(r).map(Some)
            }
            Shape::Reference => {
                if r.get_presence()? {
                    T::decode(r).map(Some)
                } else {
                    Ok(None)
                }
            }
            Shape::Value => {
                if r.get_presence()? {
                    read(r).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }
}
