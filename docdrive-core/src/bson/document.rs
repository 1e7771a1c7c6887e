//! Ordered documents.

use std::collections::HashSet;

use super::data_input::{read_length, BsonInput, DataInput};
use super::data_output::{wire_length, BsonOutput, DataOutput, Key};
use super::element::{element_len, read_tag, write_element, Element, FromElement};
use super::element_type::{ElementType, TERMINATOR};
use super::value::Bson;
use crate::error::{DriverError, Result};

/// Deepest nesting of documents and arrays accepted on decode.
pub const MAX_NESTING_DEPTH: usize = 100;

/// An ordered map of keys to values.
///
/// Keys keep their insertion order on the wire. Inserting an existing key
/// replaces its value in place, and decoding rejects a body that repeats a
/// key, so a document never holds the same key twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Bson)>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value for `key` if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Bson> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Bson> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns `true` if the document has a value for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the string stored under `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Bson::as_str)
    }

    /// Returns the 32-bit integer stored under `key`.
    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Bson::as_i32)
    }

    /// Returns the 64-bit integer stored under `key`.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Bson::as_i64)
    }

    /// Returns the boolean stored under `key`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Bson::as_bool)
    }

    /// Returns the embedded document stored under `key`.
    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.get(key).and_then(Bson::as_document)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bson)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over keys in wire order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Encodes the document as a standalone byte sequence.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let mut output = BsonOutput::with_capacity(self.payload_len());
        self.write_payload(&mut output)?;
        Ok(output.into_bytes())
    }

    /// Decodes a standalone document, requiring every byte to be consumed.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut input = BsonInput::new(data);
        let document = Self::read_payload(&mut input)?;
        if input.remaining() != 0 {
            return Err(DriverError::Serialization(format!(
                "{} trailing bytes after document",
                input.remaining()
            )));
        }
        Ok(document)
    }
}

impl Element for Document {
    fn element_type(&self) -> ElementType {
        ElementType::Document
    }

    fn payload_len(&self) -> usize {
        let elements: usize = self.entries.iter().map(|(k, v)| element_len(k, v)).sum();
        4 + elements + 1
    }

    fn validate(&self) -> Result<()> {
        self.check_contents()?;
        wire_length(self.payload_len()).map(|_| ())
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        let start = output.position();
        output.write_i32(0)?;
        for (key, value) in &self.entries {
            write_element(output, Key::new(key)?, value)?;
        }
        output.write_u8(TERMINATOR)?;
        output.patch_i32(start, wire_length(output.position() - start)?)
    }
}

impl Document {
    /// Checks every key and leaf value, leaving the length check to the
    /// outermost container.
    pub(crate) fn check_contents(&self) -> Result<()> {
        for (key, value) in &self.entries {
            Key::new(key)?;
            value.check_contents()?;
        }
        Ok(())
    }
}

impl FromElement for Document {
    const ELEMENT_TYPE: ElementType = ElementType::Document;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        Ok(Self {
            entries: read_document_body(input, true)?,
        })
    }
}

/// Reads a length-prefixed, terminated list of elements.
///
/// The body is copied out of `input` once. Embedded documents and arrays are
/// then decoded from borrowed sub-slices, each bounded by its declared length,
/// so a malformed child can never consume bytes of its parent. Keys must be
/// unique when `unique_keys` is set; arrays ignore theirs.
pub(crate) fn read_document_body<R: DataInput>(
    input: &mut R,
    unique_keys: bool,
) -> Result<Vec<(String, Bson)>> {
    let len = read_length(input, 5)?;
    let body = input.read_bytes(len - 4)?;
    parse_body(&body, 1, unique_keys)
}

fn parse_body(body: &[u8], depth: usize, unique_keys: bool) -> Result<Vec<(String, Bson)>> {
    if depth > MAX_NESTING_DEPTH {
        return Err(DriverError::Serialization(format!(
            "document nesting exceeds {}",
            MAX_NESTING_DEPTH
        )));
    }
    let (elements, terminator) = match body.split_last() {
        Some((last, elements)) => (elements, *last),
        None => return Err(DriverError::Serialization("empty document body".to_string())),
    };
    if terminator != TERMINATOR {
        return Err(DriverError::Serialization(
            "document is not terminated".to_string(),
        ));
    }

    let mut input = BsonInput::new(elements);
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    while input.remaining() > 0 {
        let element_type = read_tag(&mut input)?;
        let key = input.read_cstring()?;
        if unique_keys && !seen.insert(key.clone()) {
            return Err(DriverError::Serialization(format!(
                "duplicate key {:?} in document",
                key
            )));
        }
        let value = match element_type {
            ElementType::Document => Bson::Document(Document {
                entries: parse_nested(&mut input, depth, true)?,
            }),
            ElementType::Array => Bson::Array(
                parse_nested(&mut input, depth, false)?
                    .into_iter()
                    .map(|(_, value)| value)
                    .collect(),
            ),
            other => Bson::read_payload(other, &mut input)?,
        };
        entries.push((key, value));
    }
    Ok(entries)
}

fn parse_nested(
    input: &mut BsonInput<'_>,
    depth: usize,
    unique_keys: bool,
) -> Result<Vec<(String, Bson)>> {
    let len = read_length(input, 5)?;
    let body = input.read_slice(len - 4)?;
    parse_body(body, depth + 1, unique_keys)
}

impl FromIterator<(String, Bson)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Bson)>>(iter: I) -> Self {
        let mut document = Document::new();
        for (key, value) in iter {
            document.insert(key, value);
        }
        document
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = std::vec::IntoIter<(String, Bson)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Builds a [`Document`] from `key => value` pairs.
///
/// ```
/// use docdrive_core::doc;
///
/// let query = doc! { "name" => "alice", "age" => 30i32 };
/// assert_eq!(query.get_str("name"), Some("alice"));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::bson::Document::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut document = $crate::bson::Document::new();
        $(
            document.insert($key, $value);
        )+
        document
    }};
}
