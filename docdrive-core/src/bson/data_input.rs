//! Input readers for the document wire format.

use crate::error::{DriverError, Result};
use bytes::Buf;
use std::io::Cursor;

use super::element_type::TERMINATOR;

/// Trait for reading primitive values from the document wire format.
///
/// All multi-byte values are read in little-endian byte order.
pub trait DataInput {
    /// Reads a single byte.
    fn read_u8(&mut self) -> Result<u8>;

    /// Reads a 32-bit signed integer.
    fn read_i32(&mut self) -> Result<i32>;

    /// Reads a 64-bit signed integer.
    fn read_i64(&mut self) -> Result<i64>;

    /// Reads a 64-bit floating point.
    fn read_f64(&mut self) -> Result<f64>;

    /// Reads the specified number of raw bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Reads a NUL-terminated UTF-8 string.
    fn read_cstring(&mut self) -> Result<String>;
}

/// A slice-based implementation of `DataInput`.
#[derive(Debug)]
pub struct BsonInput<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BsonInput<'a> {
    /// Creates a new `BsonInput` from the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Returns the number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Borrows the next `len` bytes without copying them.
    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure_remaining(len)?;
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        self.cursor.advance(len);
        Ok(&data[start..start + len])
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(DriverError::Serialization(format!(
                "insufficient data: need {} bytes, have {}",
                n,
                self.cursor.remaining()
            )))
        } else {
            Ok(())
        }
    }
}

impl DataInput for BsonInput<'_> {
    fn read_u8(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8())
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32_le())
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_i64_le())
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_f64_le())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure_remaining(len)?;
        let mut buf = vec![0u8; len];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }

    fn read_cstring(&mut self) -> Result<String> {
        let rest = self.cursor.chunk();
        let end = rest
            .iter()
            .position(|b| *b == TERMINATOR)
            .ok_or_else(|| DriverError::Serialization("unterminated cstring".to_string()))?;
        let value = std::str::from_utf8(&rest[..end])
            .map_err(|e| DriverError::Serialization(format!("invalid UTF-8 cstring: {}", e)))?
            .to_owned();
        self.cursor.advance(end + 1);
        Ok(value)
    }
}

/// Reads a length prefix and rejects negative or undersized values.
pub(crate) fn read_length<R: DataInput + ?Sized>(input: &mut R, minimum: i32) -> Result<usize> {
    let len = input.read_i32()?;
    if len < minimum {
        return Err(DriverError::Serialization(format!(
            "invalid length {} (minimum {})",
            len, minimum
        )));
    }
    Ok(len as usize)
}
