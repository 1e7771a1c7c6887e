//! Output buffers for the document wire format.

use crate::error::{DriverError, Result};
use bytes::{BufMut, BytesMut};

use super::element_type::TERMINATOR;

/// A field name that is known to be representable as a cstring.
///
/// Construction is the only validation point: once a `Key` exists, writing it
/// cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key<'a>(&'a str);

impl<'a> Key<'a> {
    /// Validates `name` as a key.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Encoding`] if `name` contains a NUL byte.
    pub fn new(name: &'a str) -> Result<Self> {
        if name.as_bytes().contains(&TERMINATOR) {
            return Err(DriverError::Encoding(format!(
                "key {:?} contains a NUL byte",
                name
            )));
        }
        Ok(Self(name))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

/// Trait for appending primitive values in the document wire format.
///
/// All multi-byte values are written in little-endian byte order. Writers
/// append, except for [`patch_i32`](Self::patch_i32), which fills in a length
/// slot reserved earlier.
pub trait DataOutput {
    /// Returns the number of bytes written so far.
    fn position(&self) -> usize;

    /// Overwrites the four bytes at `at` with `v`.
    fn patch_i32(&mut self, at: usize, v: i32) -> Result<()>;

    /// Writes a single byte.
    fn write_u8(&mut self, v: u8) -> Result<()>;

    /// Writes a 32-bit signed integer.
    fn write_i32(&mut self, v: i32) -> Result<()>;

    /// Writes a 64-bit signed integer.
    fn write_i64(&mut self, v: i64) -> Result<()>;

    /// Writes a 64-bit floating point.
    fn write_f64(&mut self, v: f64) -> Result<()>;

    /// Writes raw bytes without length prefix.
    fn write_bytes(&mut self, v: &[u8]) -> Result<()>;

    /// Writes a key followed by its terminator.
    fn write_cstring(&mut self, key: Key<'_>) -> Result<()> {
        self.write_bytes(key.as_str().as_bytes())?;
        self.write_u8(TERMINATOR)
    }
}

/// A buffer-based implementation of `DataOutput`.
#[derive(Debug)]
pub struct BsonOutput {
    buffer: BytesMut,
}

impl BsonOutput {
    /// Creates a new `BsonOutput` with default capacity.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Creates a new `BsonOutput` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the written bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the output and returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Consumes the output and returns the underlying buffer.
    pub fn into_inner(self) -> BytesMut {
        self.buffer
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for BsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DataOutput for BsonOutput {
    fn position(&self) -> usize {
        self.buffer.len()
    }

    fn patch_i32(&mut self, at: usize, v: i32) -> Result<()> {
        patch_slot(&mut self.buffer, at, v)
    }

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.buffer.put_u8(v);
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.buffer.put_i32_le(v);
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.buffer.put_i64_le(v);
        Ok(())
    }

    fn write_f64(&mut self, v: f64) -> Result<()> {
        self.buffer.put_f64_le(v);
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.buffer.put_slice(v);
        Ok(())
    }
}

impl DataOutput for BytesMut {
    fn position(&self) -> usize {
        self.len()
    }

    fn patch_i32(&mut self, at: usize, v: i32) -> Result<()> {
        patch_slot(self, at, v)
    }

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.put_u8(v);
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.put_i32_le(v);
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.put_i64_le(v);
        Ok(())
    }

    fn write_f64(&mut self, v: f64) -> Result<()> {
        self.put_f64_le(v);
        Ok(())
    }

    fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.put_slice(v);
        Ok(())
    }
}

fn patch_slot(buffer: &mut [u8], at: usize, v: i32) -> Result<()> {
    let slot = at
        .checked_add(4)
        .and_then(|end| buffer.get_mut(at..end))
        .ok_or_else(|| DriverError::Encoding(format!("no length slot at offset {}", at)))?;
    slot.copy_from_slice(&v.to_le_bytes());
    Ok(())
}

/// Converts a payload length to the wire's `i32` length field.
pub(crate) fn wire_length(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        DriverError::Encoding(format!("length {} exceeds the wire limit", len))
    })
}
