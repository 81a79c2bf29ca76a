use std::fmt;

use crate::error::{DualcastError, Result};

use super::{Payload, PayloadReader, PayloadWriter};

const SCALE_SHIFT: u32 = 16;
const SCALE_MASK: u32 = 0x00FF_0000;
const SIGN_MASK: u32 = 0x8000_0000;
const MAX_SCALE: u32 = 28;
const MAX_MANTISSA: u128 = (1 << 96) - 1;

/// 96-bit scaled decimal: `(-1)^sign * mantissa / 10^scale`.
///
/// Travels as four i32 words `lo, mid, hi, flags`, where `flags` holds the
/// scale in bits 16..=23 and the sign in bit 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal128 {
    lo: u32,
    mid: u32,
    hi: u32,
    flags: u32,
}

impl Decimal128 {
    /// Build from a signed mantissa and a scale (number of fractional digits).
    ///
    /// Out-of-range arguments are `InvalidArgument`; `Decode` is reserved for
    /// words read off the wire (see [`Decimal128::from_words`]).
    pub fn new(mantissa: i128, scale: u32) -> Result<Self> {
        if scale > MAX_SCALE {
            return Err(DualcastError::invalid_argument(format!(
                "decimal scale {scale} exceeds {MAX_SCALE}"
            )));
        }
        let magnitude = mantissa.unsigned_abs();
        if magnitude > MAX_MANTISSA {
            return Err(DualcastError::invalid_argument("decimal mantissa exceeds 96 bits"));
        }
        let sign = if mantissa < 0 { SIGN_MASK } else { 0 };
        Ok(Self {
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: (magnitude >> 64) as u32,
            flags: sign | (scale << SCALE_SHIFT),
        })
    }

    /// Rebuild from the four wire words, validating the flags word.
    pub fn from_words(words: [i32; 4]) -> Result<Self> {
        let flags = words[3] as u32;
        if flags & !(SCALE_MASK | SIGN_MASK) != 0 {
            return Err(DualcastError::decode(format!("decimal flags {flags:#010x} has reserved bits set")));
        }
        if (flags & SCALE_MASK) >> SCALE_SHIFT > MAX_SCALE {
            return Err(DualcastError::decode("decimal scale exceeds 28"));
        }
        Ok(Self {
            lo: words[0] as u32,
            mid: words[1] as u32,
            hi: words[2] as u32,
            flags,
        })
    }

    pub fn words(&self) -> [i32; 4] {
        [self.lo as i32, self.mid as i32, self.hi as i32, self.flags as i32]
    }

    pub fn mantissa(&self) -> i128 {
        let magnitude =
            (u128::from(self.hi) << 64 | u128::from(self.mid) << 32 | u128::from(self.lo)) as i128;
        if self.is_negative() {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn scale(&self) -> u32 {
        (self.flags & SCALE_MASK) >> SCALE_SHIFT
    }

    pub fn is_negative(&self) -> bool {
        self.flags & SIGN_MASK != 0
    }
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa().unsigned_abs().to_string();
        let scale = self.scale() as usize;
        let sign = if self.is_negative() { "-" } else { "" };
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int}.{frac}")
    }
}

impl Payload for Decimal128 {
    fn encode(&self, w: &mut PayloadWriter) {
        for word in self.words() {
            w.put_i32(word);
        }
    }

    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let words = [r.get_i32()?, r.get_i32()?, r.get_i32()?, r.get_i32()?];
        Self::from_words(words)
    }
}
