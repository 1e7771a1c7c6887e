//! Per-kind encoders and decoders, and the element-level entry points.
//!
//! Every wire kind is a Rust type implementing [`Element`] (encode) and
//! [`FromElement`] (decode). [`encode`] resolves the tag and payload writer
//! through the value's type, so adding a kind never touches existing paths.

use super::data_input::{read_length, DataInput};
use super::data_output::{wire_length, DataOutput, Key};
use super::element_type::{ElementType, FALSE, TERMINATOR, TRUE};
use super::value::{Binary, Bson, DateTime};
use super::ObjectId;
use crate::error::{DriverError, Result};

/// Trait for values that can be written as a tagged element.
pub trait Element {
    /// Returns the kind whose tag precedes this value.
    fn element_type(&self) -> ElementType;

    /// Returns the exact number of payload bytes [`write_payload`](Self::write_payload) appends.
    fn payload_len(&self) -> usize;

    /// Checks that the value can be written in full.
    ///
    /// Runs before any byte of the element is appended.
    fn validate(&self) -> Result<()> {
        wire_length(self.payload_len()).map(|_| ())
    }

    /// Appends the kind-specific payload.
    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()>;
}

/// Trait for values that can be read back from a tagged element.
pub trait FromElement: Sized {
    /// The only kind this type decodes from.
    const ELEMENT_TYPE: ElementType;

    /// Reads the kind-specific payload.
    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self>;
}

/// Appends `value` as a `tag ++ key ++ payload` element.
///
/// The key and the value are validated before the first byte is written, so
/// on error `output` is left exactly as it was.
///
/// # Errors
///
/// Returns [`DriverError::Encoding`] if `key`, or any key nested inside
/// `value`, contains a NUL byte, or if the payload exceeds the wire limit.
pub fn encode<W, V>(output: &mut W, key: &str, value: &V) -> Result<()>
where
    W: DataOutput,
    V: Element + ?Sized,
{
    let key = Key::new(key)?;
    value.validate()?;
    write_element(output, key, value)
}

/// Writes an element whose key and value were already validated.
pub(crate) fn write_element<W, V>(output: &mut W, key: Key<'_>, value: &V) -> Result<()>
where
    W: DataOutput,
    V: Element + ?Sized,
{
    output.write_u8(value.element_type().tag())?;
    output.write_cstring(key)?;
    value.write_payload(output)
}

/// Number of bytes an element with `key` and `value` occupies.
pub(crate) fn element_len<V: Element + ?Sized>(key: &str, value: &V) -> usize {
    1 + key.len() + 1 + value.payload_len()
}

/// Reads one element of a statically known kind.
///
/// # Errors
///
/// Returns [`DriverError::Serialization`] if the tag is unknown, names a
/// different kind than `T`, or the payload is malformed.
pub fn decode<R, T>(input: &mut R) -> Result<(String, T)>
where
    R: DataInput,
    T: FromElement,
{
    let element_type = read_tag(input)?;
    if element_type != T::ELEMENT_TYPE {
        return Err(DriverError::Serialization(format!(
            "expected {} element, found {}",
            T::ELEMENT_TYPE,
            element_type
        )));
    }
    let key = input.read_cstring()?;
    let value = T::read_payload(input)?;
    Ok((key, value))
}

/// Reads one element of any kind.
pub fn decode_element<R: DataInput>(input: &mut R) -> Result<(String, Bson)> {
    let element_type = read_tag(input)?;
    let key = input.read_cstring()?;
    let value = Bson::read_payload(element_type, input)?;
    Ok((key, value))
}

pub(crate) fn read_tag<R: DataInput>(input: &mut R) -> Result<ElementType> {
    let tag = input.read_u8()?;
    ElementType::from_tag(tag).ok_or_else(|| {
        DriverError::Serialization(format!("unknown element type tag {:#04x}", tag))
    })
}

impl<T: Element + ?Sized> Element for &T {
    fn element_type(&self) -> ElementType {
        (**self).element_type()
    }

    fn payload_len(&self) -> usize {
        (**self).payload_len()
    }

    fn validate(&self) -> Result<()> {
        (**self).validate()
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        (**self).write_payload(output)
    }
}

// ============================================================================
// Boolean
// ============================================================================

/// The `true` boolean encoder. Its payload is always [`TRUE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct True;

/// The `false` boolean encoder. Its payload is always [`FALSE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct False;

impl Element for True {
    fn element_type(&self) -> ElementType {
        ElementType::Boolean
    }

    fn payload_len(&self) -> usize {
        1
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_u8(TRUE)
    }
}

impl Element for False {
    fn element_type(&self) -> ElementType {
        ElementType::Boolean
    }

    fn payload_len(&self) -> usize {
        1
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_u8(FALSE)
    }
}

impl Element for bool {
    fn element_type(&self) -> ElementType {
        ElementType::Boolean
    }

    fn payload_len(&self) -> usize {
        1
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        match *self {
            true => True.write_payload(output),
            false => False.write_payload(output),
        }
    }
}

impl FromElement for bool {
    const ELEMENT_TYPE: ElementType = ElementType::Boolean;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        match input.read_u8()? {
            TRUE => Ok(true),
            FALSE => Ok(false),
            other => Err(DriverError::Serialization(format!(
                "invalid boolean byte {:#04x}",
                other
            ))),
        }
    }
}

// ============================================================================
// Numbers
// ============================================================================

impl Element for f64 {
    fn element_type(&self) -> ElementType {
        ElementType::Double
    }

    fn payload_len(&self) -> usize {
        8
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_f64(*self)
    }
}

impl FromElement for f64 {
    const ELEMENT_TYPE: ElementType = ElementType::Double;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        input.read_f64()
    }
}

impl Element for i32 {
    fn element_type(&self) -> ElementType {
        ElementType::Int32
    }

    fn payload_len(&self) -> usize {
        4
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_i32(*self)
    }
}

impl FromElement for i32 {
    const ELEMENT_TYPE: ElementType = ElementType::Int32;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        input.read_i32()
    }
}

impl Element for i64 {
    fn element_type(&self) -> ElementType {
        ElementType::Int64
    }

    fn payload_len(&self) -> usize {
        8
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_i64(*self)
    }
}

impl FromElement for i64 {
    const ELEMENT_TYPE: ElementType = ElementType::Int64;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        input.read_i64()
    }
}

// ============================================================================
// Strings
// ============================================================================

impl Element for str {
    fn element_type(&self) -> ElementType {
        ElementType::String
    }

    fn payload_len(&self) -> usize {
        4 + self.len() + 1
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_i32(wire_length(self.len() + 1)?)?;
        output.write_bytes(self.as_bytes())?;
        output.write_u8(TERMINATOR)
    }
}

impl Element for String {
    fn element_type(&self) -> ElementType {
        ElementType::String
    }

    fn payload_len(&self) -> usize {
        self.as_str().payload_len()
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        self.as_str().write_payload(output)
    }
}

impl FromElement for String {
    const ELEMENT_TYPE: ElementType = ElementType::String;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        let len = read_length(input, 1)?;
        let mut bytes = input.read_bytes(len)?;
        if bytes.pop() != Some(TERMINATOR) {
            return Err(DriverError::Serialization(
                "string is not NUL-terminated".to_string(),
            ));
        }
        String::from_utf8(bytes)
            .map_err(|e| DriverError::Serialization(format!("invalid UTF-8 string: {}", e)))
    }
}

// ============================================================================
// Binary, object id, datetime, null
// ============================================================================

impl Element for Binary {
    fn element_type(&self) -> ElementType {
        ElementType::Binary
    }

    fn payload_len(&self) -> usize {
        4 + 1 + self.bytes.len()
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_i32(wire_length(self.bytes.len())?)?;
        output.write_u8(self.subtype)?;
        output.write_bytes(&self.bytes)
    }
}

impl FromElement for Binary {
    const ELEMENT_TYPE: ElementType = ElementType::Binary;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        let len = read_length(input, 0)?;
        let subtype = input.read_u8()?;
        let bytes = input.read_bytes(len)?;
        Ok(Binary { subtype, bytes })
    }
}

impl Element for ObjectId {
    fn element_type(&self) -> ElementType {
        ElementType::ObjectId
    }

    fn payload_len(&self) -> usize {
        ObjectId::LEN
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_bytes(&self.bytes())
    }
}

impl FromElement for ObjectId {
    const ELEMENT_TYPE: ElementType = ElementType::ObjectId;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        let bytes = input.read_bytes(ObjectId::LEN)?;
        let mut raw = [0u8; ObjectId::LEN];
        raw.copy_from_slice(&bytes);
        Ok(ObjectId::from_bytes(raw))
    }
}

impl Element for DateTime {
    fn element_type(&self) -> ElementType {
        ElementType::DateTime
    }

    fn payload_len(&self) -> usize {
        8
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        output.write_i64(self.timestamp_millis())
    }
}

impl FromElement for DateTime {
    const ELEMENT_TYPE: ElementType = ElementType::DateTime;

    fn read_payload<R: DataInput>(input: &mut R) -> Result<Self> {
        input.read_i64().map(DateTime::from_millis)
    }
}

impl Element for () {
    fn element_type(&self) -> ElementType {
        ElementType::Null
    }

    fn payload_len(&self) -> usize {
        0
    }

    fn write_payload<W: DataOutput>(&self, _output: &mut W) -> Result<()> {
        Ok(())
    }
}

impl FromElement for () {
    const ELEMENT_TYPE: ElementType = ElementType::Null;

    fn read_payload<R: DataInput>(_input: &mut R) -> Result<Self> {
        Ok(())
    }
}

impl<T: Element> Element for Option<T> {
    fn element_type(&self) -> ElementType {
        match self {
            Some(value) => value.element_type(),
            None => ElementType::Null,
        }
    }

    fn payload_len(&self) -> usize {
        self.as_ref().map_or(0, |value| value.payload_len())
    }

    fn validate(&self) -> Result<()> {
        match self {
            Some(value) => value.validate(),
            None => Ok(()),
        }
    }

    fn write_payload<W: DataOutput>(&self, output: &mut W) -> Result<()> {
        match self {
            Some(value) => value.write_payload(output),
            None => Ok(()),
        }
    }
}
