//! Query requests and the options a read preference may adjust.

use std::ops::{BitOr, BitOrAssign};

use bytes::{Buf, BytesMut};

use super::header::{next_request_id, MessageHeader, HEADER_SIZE, OP_QUERY};
use crate::bson::{BsonInput, DataInput, DataOutput, Document, Element, FromElement, Key};
use crate::error::{DriverError, Result};

/// Collection name that routes a query to the command processor.
pub const COMMAND_COLLECTION: &str = "$cmd";

/// Bit flags carried by a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QueryFlags(u32);

impl QueryFlags {
    /// Keep the cursor open after the last result.
    pub const TAILABLE_CURSOR: Self = Self(1 << 1);
    /// Allow the query to run on a secondary.
    pub const SLAVE_OK: Self = Self(1 << 2);
    /// Never time out the server-side cursor.
    pub const NO_CURSOR_TIMEOUT: Self = Self(1 << 4);
    /// Block on a tailable cursor until data arrives.
    pub const AWAIT_DATA: Self = Self(1 << 5);
    /// Stream all results without further requests.
    pub const EXHAUST: Self = Self(1 << 6);
    /// Return partial results if some shards are down.
    pub const PARTIAL: Self = Self(1 << 7);

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

    /// Returns `true` if no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for QueryFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for QueryFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Transport-level options of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    flags: QueryFlags,
}

impl QueryOptions {
    /// Creates options with no flags set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns these options with `flags` added.
    pub fn with_flags(mut self, flags: QueryFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Returns the query flags.
    pub fn flags(&self) -> QueryFlags {
        self.flags
    }
}

/// A query against one collection.
///
/// Built once by the caller and consumed by a single read operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    request_id: i32,
    full_collection_name: String,
    options: QueryOptions,
    skip: i32,
    limit: i32,
    selector: Document,
    fields: Option<Document>,
}

impl Query {
    /// Creates a query for documents in `database.collection` matching `selector`.
    pub fn new(database: &str, collection: &str, selector: Document) -> Self {
        Self {
            request_id: next_request_id(),
            full_collection_name: format!("{}.{}", database, collection),
            options: QueryOptions::default(),
            skip: 0,
            limit: 0,
            selector,
            fields: None,
        }
    }

    /// Creates a command query against `database`.
    ///
    /// Commands answer with exactly one document, so the limit is `-1`.
    pub fn command(database: &str, command: Document) -> Self {
        Self::new(database, COMMAND_COLLECTION, command).with_limit(-1)
    }

    /// Sets the number of documents to skip.
    pub fn with_skip(mut self, skip: i32) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the number of documents to return; negative closes the cursor.
    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }

    /// Restricts the returned fields.
    pub fn with_fields(mut self, fields: Document) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Replaces the transport options.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// Returns `database.collection`.
    pub fn full_collection_name(&self) -> &str {
        &self.full_collection_name
    }

    /// Returns the database part of the namespace.
    pub fn database(&self) -> &str {
        self.namespace().0
    }

    /// Returns the collection part of the namespace.
    pub fn collection(&self) -> &str {
        self.namespace().1
    }

    fn namespace(&self) -> (&str, &str) {
        self.full_collection_name
            .split_once('.')
            .unwrap_or((self.full_collection_name.as_str(), ""))
    }

    /// Returns `true` if this query runs a command.
    pub fn is_command(&self) -> bool {
        self.collection() == COMMAND_COLLECTION
    }

    /// Returns the transport options.
    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// Returns the query flags.
    pub fn flags(&self) -> QueryFlags {
        self.options.flags()
    }

    /// Returns the number of documents to skip.
    pub fn skip(&self) -> i32 {
        self.skip
    }

    /// Returns the number of documents to return.
    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Returns the selector.
    pub fn selector(&self) -> &Document {
        &self.selector
    }

    /// Returns the field projection.
    pub fn fields(&self) -> Option<&Document> {
        self.fields.as_ref()
    }

    /// Encodes the query as a complete message.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Encoding`] if the namespace or any selector key
    /// contains a NUL byte.
    pub fn encode(&self) -> Result<BytesMut> {
        let name = Key::new(&self.full_collection_name)?;
        self.selector.validate()?;
        if let Some(fields) = &self.fields {
            fields.validate()?;
        }

        let mut body = BytesMut::with_capacity(64 + self.selector.payload_len());
        body.write_i32(self.flags().bits() as i32)?;
        body.write_cstring(name)?;
        body.write_i32(self.skip)?;
        body.write_i32(self.limit)?;
        self.selector.write_payload(&mut body)?;
        if let Some(fields) = &self.fields {
            fields.write_payload(&mut body)?;
        }

        let message_length = i32::try_from(HEADER_SIZE + body.len()).map_err(|_| {
            DriverError::Encoding(format!("query of {} bytes is too large", body.len()))
        })?;
        let header = MessageHeader {
            message_length,
            request_id: self.request_id,
            response_to: 0,
            op_code: OP_QUERY,
        };

        let mut dst = BytesMut::with_capacity(HEADER_SIZE + body.len());
        header.write_to(&mut dst);
        dst.extend_from_slice(&body);
        Ok(dst)
    }

    /// Decodes a complete query message.
    pub fn decode(src: &[u8]) -> Result<Self> {
        let mut cursor = src;
        let header = MessageHeader::read_from(&mut cursor)?;
        header.expect(OP_QUERY, src.len())?;

        let mut input = BsonInput::new(cursor.chunk());
        let flags = QueryFlags::from_bits(input.read_i32()? as u32);
        let full_collection_name = input.read_cstring()?;
        let skip = input.read_i32()?;
        let limit = input.read_i32()?;
        let selector = Document::read_payload(&mut input)?;
        let fields = if input.remaining() > 0 {
            Some(Document::read_payload(&mut input)?)
        } else {
            None
        };
        if input.remaining() != 0 {
            return Err(DriverError::Protocol(format!(
                "{} trailing bytes after query",
                input.remaining()
            )));
        }

        Ok(Self {
            request_id: header.request_id,
            full_collection_name,
            options: QueryOptions::new().with_flags(flags),
            skip,
            limit,
            selector,
            fields,
        })
    }
}
