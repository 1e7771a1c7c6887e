//! Replies to queries.

use bytes::{Buf, BytesMut};

use super::header::{next_request_id, MessageHeader, HEADER_SIZE, OP_REPLY};
use crate::bson::{BsonInput, DataInput, DataOutput, Document, Element, FromElement};
use crate::error::{DriverError, Result};

/// Bit flags carried by a reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResponseFlags(u32);

impl ResponseFlags {
    /// The cursor named by a get-more no longer exists.
    pub const CURSOR_NOT_FOUND: Self = Self(1 << 0);
    /// The query failed; the single returned document describes the error.
    pub const QUERY_FAILURE: Self = Self(1 << 1);
    /// The shard configuration is stale.
    pub const SHARD_CONFIG_STALE: Self = Self(1 << 2);
    /// The server supports awaiting data on tailable cursors.
    pub const AWAIT_CAPABLE: Self = Self(1 << 3);

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wraps raw flag bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw flag bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ResponseFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A node's answer to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    response_to: i32,
    flags: ResponseFlags,
    cursor_id: i64,
    starting_from: i32,
    documents: Vec<Document>,
}

impl Reply {
    /// Creates a successful reply to the request `response_to`.
    pub fn new(response_to: i32, documents: Vec<Document>) -> Self {
        Self {
            response_to,
            flags: ResponseFlags::empty(),
            cursor_id: 0,
            starting_from: 0,
            documents,
        }
    }

    /// Creates a query-failure reply carrying `message` as `$err`.
    pub fn query_failure(response_to: i32, message: &str) -> Self {
        let mut error = Document::new();
        error.insert("$err", message);
        Self::new(response_to, vec![error]).with_flags(ResponseFlags::QUERY_FAILURE)
    }

    /// Sets the ID of the request this reply answers.
    pub fn with_response_to(mut self, response_to: i32) -> Self {
        self.response_to = response_to;
        self
    }

    /// Sets the response flags.
    pub fn with_flags(mut self, flags: ResponseFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the server-side cursor ID.
    pub fn with_cursor_id(mut self, cursor_id: i64) -> Self {
        self.cursor_id = cursor_id;
        self
    }

    /// Sets the position of the first returned document in the cursor.
    pub fn with_starting_from(mut self, starting_from: i32) -> Self {
        self.starting_from = starting_from;
        self
    }

    /// Returns the ID of the request this reply answers.
    pub fn response_to(&self) -> i32 {
        self.response_to
    }

    /// Returns the response flags.
    pub fn flags(&self) -> ResponseFlags {
        self.flags
    }

    /// Returns the server-side cursor ID, 0 when exhausted.
    pub fn cursor_id(&self) -> i64 {
        self.cursor_id
    }

    /// Returns the position of the first returned document in the cursor.
    pub fn starting_from(&self) -> i32 {
        self.starting_from
    }

    /// Returns the returned documents.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Returns the first returned document.
    pub fn first_document(&self) -> Option<&Document> {
        self.documents.first()
    }

    /// Consumes the reply and returns its documents.
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    /// Returns `true` if the query failed on the node.
    pub fn is_query_failure(&self) -> bool {
        self.flags.contains(ResponseFlags::QUERY_FAILURE)
    }

    /// Returns `true` if the requested cursor was not found.
    pub fn is_cursor_not_found(&self) -> bool {
        self.flags.contains(ResponseFlags::CURSOR_NOT_FOUND)
    }

    /// Encodes the reply as a complete message.
    pub fn encode(&self) -> Result<BytesMut> {
        for document in &self.documents {
            document.validate()?;
        }
        let number_returned = i32::try_from(self.documents.len()).map_err(|_| {
            DriverError::Encoding(format!("{} documents in one reply", self.documents.len()))
        })?;

        let mut body = BytesMut::with_capacity(20);
        body.write_i32(self.flags.bits() as i32)?;
        body.write_i64(self.cursor_id)?;
        body.write_i32(self.starting_from)?;
        body.write_i32(number_returned)?;
        for document in &self.documents {
            document.write_payload(&mut body)?;
        }

        let message_length = i32::try_from(HEADER_SIZE + body.len()).map_err(|_| {
            DriverError::Encoding(format!("reply of {} bytes is too large", body.len()))
        })?;
        let header = MessageHeader {
            message_length,
            request_id: next_request_id(),
            response_to: self.response_to,
            op_code: OP_REPLY,
        };

        let mut dst = BytesMut::with_capacity(HEADER_SIZE + body.len());
        header.write_to(&mut dst);
        dst.extend_from_slice(&body);
        Ok(dst)
    }

    /// Decodes a complete reply message.
    pub fn decode(src: &[u8]) -> Result<Self> {
        let mut cursor = src;
        let header = MessageHeader::read_from(&mut cursor)?;
        header.expect(OP_REPLY, src.len())?;

        let mut input = BsonInput::new(cursor.chunk());
        let flags = ResponseFlags::from_bits(input.read_i32()? as u32);
        let cursor_id = input.read_i64()?;
        let starting_from = input.read_i32()?;
        let number_returned = input.read_i32()?;
        if number_returned < 0 {
            return Err(DriverError::Protocol(format!(
                "negative document count {}",
                number_returned
            )));
        }

        let mut documents = Vec::new();
        for _ in 0..number_returned {
            documents.push(Document::read_payload(&mut input)?);
        }
        if input.remaining() != 0 {
            return Err(DriverError::Protocol(format!(
                "{} trailing bytes after {} documents",
                input.remaining(),
                number_returned
            )));
        }

        Ok(Self {
            response_to: header.response_to,
            flags,
            cursor_id,
            starting_from,
            documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_encode_decode() {
        let reply = Reply::new(42, vec![doc! { "a" => 1i32 }, doc! { "b" => "two" }])
            .with_cursor_id(99)
            .with_starting_from(3)
            .with_flags(ResponseFlags::AWAIT_CAPABLE);
        let bytes = reply.encode().unwrap();
        let decoded = Reply::decode(&bytes).unwrap();
        assert_eq!(decoded, reply);
        assert_eq!(decoded.response_to(), 42);
    }

    #[test]
    fn test_query_failure() {
        let reply = Reply::query_failure(1, "bad query");
        assert!(reply.is_query_failure());
        assert!(!reply.is_cursor_not_found());
        assert_eq!(reply.first_document().unwrap().get_str("$err"), Some("bad query"));
    }

    #[test]
    fn test_empty_reply_layout() {
        let bytes = Reply::new(5, Vec::new()).encode().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 20);
        assert_eq!(&bytes[8..12], &5i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &OP_REPLY.to_le_bytes());
    }

    #[test]
    fn test_decode_rejects_count_mismatch() {
        let mut bytes = Reply::new(1, vec![doc! {}]).encode().unwrap();
        // claim two documents while only one follows
        bytes[32..36].copy_from_slice(&2i32.to_le_bytes());
        assert!(Reply::decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let reply = Reply::new(1, Vec::new());
        let mut bytes = reply.encode().unwrap();
        bytes.extend_from_slice(&[0x00]);
        let len = bytes.len() as i32;
        bytes[0..4].copy_from_slice(&len.to_le_bytes());
        assert!(matches!(Reply::decode(&bytes), Err(DriverError::Protocol(_))));
    }

    #[test]
    fn test_with_response_to() {
        let reply = Reply::new(1, Vec::new()).with_response_to(9);
        assert_eq!(reply.response_to(), 9);
    }

    #[test]
    fn test_decode_rejects_excessive_nesting() {
        let mut document = doc! {};
        for _ in 0..crate::bson::MAX_NESTING_DEPTH {
            let inner = std::mem::take(&mut document);
            document = doc! { "n" => inner };
        }
        let bytes = Reply::new(1, vec![document]).encode().unwrap();
        let err = Reply::decode(&bytes).unwrap_err();
        assert!(matches!(err, DriverError::Serialization(ref m) if m.contains("nesting exceeds")));
    }
}
