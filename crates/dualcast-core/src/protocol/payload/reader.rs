use bytes::Buf;

use crate::error::{DualcastError, Result};

/// Bounds-checked cursor over a payload block.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    buf: &'a [u8],
}

macro_rules! get_fixed {
    ($name:ident, $ty:ty, $get:ident) => {
        pub fn $name(&mut self) -> Result<$ty> {
            self.need(std::mem::size_of::<$ty>(), stringify!($ty))?;
            Ok(self.buf.$get())
        }
    };
}

impl<'a> PayloadReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Fail unless every byte was consumed.
    pub fn finish(&self) -> Result<()> {
        if self.buf.has_remaining() {
            return Err(DualcastError::decode(format!(
                "{} trailing bytes after payload",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.buf.remaining() < n {
            return Err(DualcastError::decode(format!(
                "{what}: need {n} bytes, {} remaining",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub fn get_presence(&mut self) -> Result<bool> {
        self.get_bool()
    }

    /// Any non-zero byte reads as `true`.
    pub fn get_bool(&mut self) -> Result<bool> {
        self.need(1, "bool")?;
        Ok(self.buf.get_u8() != 0)
    }

    get_fixed!(get_u8, u8, get_u8);
    get_fixed!(get_i8, i8, get_i8);
    get_fixed!(get_i16, i16, get_i16_le);
    get_fixed!(get_u16, u16, get_u16_le);
    get_fixed!(get_i32, i32, get_i32_le);
    get_fixed!(get_u32, u32, get_u32_le);
    get_fixed!(get_i64, i64, get_i64_le);
    get_fixed!(get_u64, u64, get_u64_le);
    get_fixed!(get_f32, f32, get_f32_le);
    get_fixed!(get_f64, f64, get_f64_le);

    /// Look at the next i32 without consuming it.
    pub fn peek_i32(&self) -> Result<i32> {
        self.need(4, "i32")?;
        let mut peek = self.buf;
        Ok(peek.get_i32_le())
    }

    /// Read an element count and check it against the bytes left.
    ///
    /// Every element occupies at least one byte, so a count larger than the
    /// remaining input is rejected before any allocation happens.
    pub fn get_count(&mut self) -> Result<usize> {
        let n = self.get_i32()?;
        if n < 0 {
            return Err(DualcastError::decode(format!("negative count {n}")));
        }
        let n = n as usize;
        if n > self.buf.remaining() {
            return Err(DualcastError::decode(format!(
                "count {n} exceeds {} remaining bytes",
                self.buf.remaining()
            )));
        }
        Ok(n)
    }

    /// Borrow the next `n` bytes.
    pub fn get_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n, "bytes")?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }
}
