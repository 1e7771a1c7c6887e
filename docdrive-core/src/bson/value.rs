//! The dynamically typed value and its supporting kinds.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use super::data_input::DataInput;
use super::data_output::{wire_length, DataOutput, Key};
use super::document::{read_document_body, Document};
use super::element::{write_element, Element, FromElement};
use super::element_type::{ElementType, TERMINATOR};
use super::ObjectId;
use crate::error::{DriverError, Result};

/// Binary data tagged with a subtype byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// Subtype byte, `0x00` for generic bytes.
    pub subtype: u8,
    /// The raw bytes.
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Generic binary subtype.
    pub const GENERIC: u8 = 0x00;
    /// UUID binary subtype.
    pub const UUID: u8 = 0x04;
    /// MD5 binary subtype.
    pub const MD5: u8 = 0x05;
    /// Start of the user-defined subtype range.
    pub const USER_DEFINED: u8 = 0x80;

    /// Creates binary data with the given subtype.
    pub fn new(subtype: u8, bytes: Vec<u8>) -> Self {
        Self { subtype, bytes }
    }
}

/// A UTC instant with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(i64);

impl DateTime {
    /// Creates a datetime from milliseconds since the Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current time.
    pub fn now() -> Self {
        let millis = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_millis() as i64,
            Err(before) => -(before.duration().as_millis() as i64),
        };
        Self(millis)
    }

    /// Returns milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.0
    }
}

/// A value of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Bson {
    /// 64-bit floating point.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Embedded document.
    Document(Document),
    /// Ordered list of values.
    Array(Vec<Bson>),
    /// Binary data.
    Binary(Binary),
    /// Object identifier.
    ObjectId(ObjectId),
    /// Boolean.
    Boolean(bool),
    /// UTC datetime.
    DateTime(DateTime),
    /// Null.
    Null,
    /// 32-bit integer.
    Int32(i32),
    /// 64-bit integer.
    Int64(i64),
}

impl Bson {
    /// Reads the payload of a kind resolved from a tag.
    pub fn read_payload<R: DataInput>(element_type: ElementType, input: &mut R) -> Result<Self> {
        Ok(match element_type {
            ElementType::Double => Bson::Double(f64::read_payload(input)?),
            ElementType::String => Bson::String(String::read_payload(input)?),
            ElementType::Document => Bson::Document(Document::read_payload(input)?),
            ElementType::Array => Bson::Array(Vec::<Bson>::read_payload(input)?),
            ElementType::Binary => Bson::Binary(Binary::read_payload(input)?),
            ElementType::ObjectId => Bson::ObjectId(ObjectId::read_payload(input)?),
            ElementType::Boolean => Bson::Boolean(bool::read_payload(input)?),
            ElementType::DateTime => Bson::DateTime(DateTime::read_payload(input)?),
            ElementType::Null => {
                <()>::read_payload(input)?;
                Bson::Null
            }
            ElementType::Int32 => Bson::Int32(i32::read_payload(input)?),
            ElementType::Int64 => Bson::Int64(i64::read_payload(input)?),
        })
    }

    pub(crate) fn check_contents(&self) -> Result<()> {
        match self {
            Bson::Document(v) => v.check_contents(),
            Bson::Array(v) => v.iter().try_for_each(Bson::check_contents),
            other => wire_length(other.payload_len()).map(|_| ()),
        }
    }

    /// Returns the string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value if this is a 32-bit integer.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value if this is a 64-bit integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value if this is a double.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the document if this is an embedded document.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the elements if this is an array.
    pub fn as_array(&self) -> Option<&[Bson]> {
        match self {
            Bson::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Returns `true` if this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Bson::Null)
    }

    /// Interprets any numeric kind as a double.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Bson::Double(v) => Some(*v),
            Bson::Int32(v) => Some(f64::from(*v)),
            Bson::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl Element for Bson {
    fn element_type(&self) -> ElementType {
        match self {
            Bson::Double(v) => v.element_type(),
            Bson::String(v) => v.element_type(),
            Bson::Document(v) => v.element_type(),
            Bson::Array(v) => v.element_type(),
            Bson::Binary(v) => v.element_type(),
            Bson::ObjectId(v) => v.element_type(),
            Bson::Boolean(v) => v.element_type(),
            Bson::DateTime(v) => v.element_type(),
            Bson::Null => ().element_type(),
            Bson::Int32(v) => v.element_type(),
            Bson::Int64(v) => v.element_type(),
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            Bson::Double(v) => v.payload_len(),
            Bson::String(v) => v.payload_len(),
            Bson::Document(v) => v.payload_len(),
            Bson::Array(v) => v.payload_len(),
            Bson::Binary(v) => v.payload_len(),
            Bson::ObjectId(v) => v.payload_len(),
            Bson::Boolean(v) => v.payload_len(),
            Bson::DateTime(v) => v.payload_len(),
            Bson::Null => ().payload_len(),
            Bson::Int32(v) => v.payload_len(),
            Bson::Int64(v) => v.payload_len(),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Bson::Document(v) => v.validate(),
            Bson::Array(v) => v.validate(),
            other => wire_length(other.payload_len()).map(|_| ()),
        }
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        match self {
            Bson::Double(v) => v.write_payload(output),
            Bson::String(v) => v.write_payload(output),
            Bson::Document(v) => v.write_payload(output),
            Bson::Array(v) => v.write_payload(output),
            Bson::Binary(v) => v.write_payload(output),
            Bson::ObjectId(v) => v.write_payload(output),
            Bson::Boolean(v) => v.write_payload(output),
            Bson::DateTime(v) => v.write_payload(output),
            Bson::Null => ().write_payload(output),
            Bson::Int32(v) => v.write_payload(output),
            Bson::Int64(v) => v.write_payload(output),
        }
    }
}

// ============================================================================
// Arrays
// ============================================================================

impl Element for [Bson] {
    fn element_type(&self) -> ElementType {
        ElementType::Array
    }

    fn payload_len(&self) -> usize {
        let elements: usize = self
            .iter()
            .enumerate()
            .map(|(index, value)| 1 + index_key_len(index) + 1 + value.payload_len())
            .sum();
        4 + elements + 1
    }

    fn validate(&self) -> Result<()> {
        self.iter().try_for_each(Bson::check_contents)?;
        wire_length(self.payload_len()).map(|_| ())
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        let start = output.position();
        output.write_i32(0)?;
        let mut key = String::new();
        for (index, value) in self.iter().enumerate() {
            key.clear();
            write!(key, "{}", index)
                .map_err(|e| DriverError::Encoding(format!("array index {}: {}", index, e)))?;
            write_element(output, Key::new(&key)?, value)?;
        }
        output.write_u8(TERMINATOR)?;
        output.patch_i32(start, wire_length(output.position() - start)?)
    }
}

/// Length of the decimal key of the element at `index`.
fn index_key_len(index: usize) -> usize {
    index.checked_ilog10().map_or(1, |digits| digits as usize + 1)
}

impl Element for Vec<Bson> {
    fn element_type(&self) -> ElementType {
        ElementType::Array
    }

    fn payload_len(&self) -> usize {
        self.as_slice().payload_len()
    }

    fn validate(&self) -> Result<()> {
        self.as_slice().validate()
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        self.as_slice().write_payload(output)
    }
}

impl FromElement for Vec<Bson> {
    const ELEMENT_TYPE: ElementType = ElementType::Array;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        let entries = read_document_body(input, false)?;
        Ok(entries.into_iter().map(|(_, value)| value).collect())
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<f64> for Bson {
    fn from(v: f64) -> Self {
        Bson::Double(v)
    }
}

impl From<i32> for Bson {
    fn from(v: i32) -> Self {
        Bson::Int32(v)
    }
}

impl From<i64> for Bson {
    fn from(v: i64) -> Self {
        Bson::Int64(v)
    }
}

impl From<bool> for Bson {
    fn from(v: bool) -> Self {
        Bson::Boolean(v)
    }
}

impl From<&str> for Bson {
    fn from(v: &str) -> Self {
        Bson::String(v.to_owned())
    }
}

impl From<String> for Bson {
    fn from(v: String) -> Self {
        Bson::String(v)
    }
}

impl From<Document> for Bson {
    fn from(v: Document) -> Self {
        Bson::Document(v)
    }
}

impl From<Vec<Bson>> for Bson {
    fn from(v: Vec<Bson>) -> Self {
        Bson::Array(v)
    }
}

impl From<Binary> for Bson {
    fn from(v: Binary) -> Self {
        Bson::Binary(v)
    }
}

impl From<ObjectId> for Bson {
    fn from(v: ObjectId) -> Self {
        Bson::ObjectId(v)
    }
}

impl From<DateTime> for Bson {
    fn from(v: DateTime) -> Self {
        Bson::DateTime(v)
    }
}

impl<T: Into<Bson>> From<Option<T>> for Bson {
    fn from(v: Option<T>) -> Self {
        v.map_or(Bson::Null, Into::into)
    }
}
