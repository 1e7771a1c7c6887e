//! Message header shared by every request and reply.

use bytes::{Buf, BufMut, BytesMut};
use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::{DriverError, Result};

/// Op code of a reply to a query.
pub const OP_REPLY: i32 = 1;

/// Op code of a query request.
pub const OP_QUERY: i32 = 2004;

/// Size of the fixed message header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Largest message the codec accepts.
pub const MAX_MESSAGE_SIZE: usize = 48 * 1024 * 1024;

/// Global request ID counter.
static REQUEST_ID_COUNTER: AtomicI32 = AtomicI32::new(1);

/// Generates a unique request ID.
pub fn next_request_id() -> i32 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The fixed 16-byte header preceding every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Total message length, header included.
    pub message_length: i32,
    /// Identifier of this message.
    pub request_id: i32,
    /// Identifier of the request this message answers, 0 for requests.
    pub response_to: i32,
    /// Kind of message.
    pub op_code: i32,
}

impl MessageHeader {
    /// Writes the header in little-endian order.
    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.put_i32_le(self.message_length);
        dst.put_i32_le(self.request_id);
        dst.put_i32_le(self.response_to);
        dst.put_i32_le(self.op_code);
    }

    /// Reads a header from the front of `src`.
    pub fn read_from<B: Buf>(src: &mut B) -> Result<Self> {
        if src.remaining() < HEADER_SIZE {
            return Err(DriverError::Serialization(format!(
                "insufficient data for header: need {} bytes, have {}",
                HEADER_SIZE,
                src.remaining()
            )));
        }
        Ok(Self {
            message_length: src.get_i32_le(),
            request_id: src.get_i32_le(),
            response_to: src.get_i32_le(),
            op_code: src.get_i32_le(),
        })
    }

    /// Checks that this header describes a message of `op_code` spanning `len` bytes.
    pub(crate) fn expect(&self, op_code: i32, len: usize) -> Result<()> {
        if self.op_code != op_code {
            return Err(DriverError::Protocol(format!(
                "unexpected op code {} (expected {})",
                self.op_code, op_code
            )));
        }
        if self.message_length < 0 || self.message_length as usize != len {
            return Err(DriverError::Protocol(format!(
                "message length {} does not match {} received bytes",
                self.message_length, len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_increase() {
        let first = next_request_id();
        let second = next_request_id();
        assert!(second > first);
    }

    #[test]
    fn test_header_layout() {
        let header = MessageHeader {
            message_length: 36,
            request_id: 7,
            response_to: 0,
            op_code: OP_QUERY,
        };
        let mut buf = BytesMut::new();
        header.write_to(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[0..4], &36i32.to_le_bytes());
        assert_eq!(&buf[12..16], &2004i32.to_le_bytes());

        let mut slice = &buf[..];
        assert_eq!(MessageHeader::read_from(&mut slice).unwrap(), header);
    }

    #[test]
    fn test_short_header() {
        let mut slice: &[u8] = &[0u8; 8];
        assert!(MessageHeader::read_from(&mut slice).is_err());
    }

    #[test]
    fn test_expect_mismatch() {
        let header = MessageHeader {
            message_length: 20,
            request_id: 1,
            response_to: 0,
            op_code: OP_REPLY,
        };
        assert!(header.expect(OP_REPLY, 20).is_ok());
        assert!(matches!(
            header.expect(OP_QUERY, 20),
            Err(DriverError::Protocol(_))
        ));
        assert!(header.expect(OP_REPLY, 21).is_err());
    }
}
