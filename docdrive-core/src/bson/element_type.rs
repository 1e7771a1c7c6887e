//! Type tags identifying the kind of every encoded element.

/// Payload byte for a `true` boolean.
pub const TRUE: u8 = 0x01;

/// Payload byte for a `false` boolean.
pub const FALSE: u8 = 0x00;

/// Terminates keys, strings and documents.
pub const TERMINATOR: u8 = 0x00;

/// The kind of an encoded element, carried on the wire as a single tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    /// 64-bit IEEE-754 floating point.
    Double = 0x01,
    /// UTF-8 string.
    String = 0x02,
    /// Embedded document.
    Document = 0x03,
    /// Array, encoded as a document keyed by index.
    Array = 0x04,
    /// Binary data with a subtype.
    Binary = 0x05,
    /// 12-byte object identifier.
    ObjectId = 0x07,
    /// Boolean.
    Boolean = 0x08,
    /// UTC datetime in milliseconds since the epoch.
    DateTime = 0x09,
    /// Null value.
    Null = 0x0A,
    /// 32-bit signed integer.
    Int32 = 0x10,
    /// 64-bit signed integer.
    Int64 = 0x12,
}

impl ElementType {
    /// Every supported kind.
    pub const ALL: [ElementType; 11] = [
        Self::Double,
        Self::String,
        Self::Document,
        Self::Array,
        Self::Binary,
        Self::ObjectId,
        Self::Boolean,
        Self::DateTime,
        Self::Null,
        Self::Int32,
        Self::Int64,
    ];

    /// Resolves a tag byte read from the wire.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Double),
            0x02 => Some(Self::String),
            0x03 => Some(Self::Document),
            0x04 => Some(Self::Array),
            0x05 => Some(Self::Binary),
            0x07 => Some(Self::ObjectId),
            0x08 => Some(Self::Boolean),
            0x09 => Some(Self::DateTime),
            0x0A => Some(Self::Null),
            0x10 => Some(Self::Int32),
            0x12 => Some(Self::Int64),
            _ => None,
        }
    }

    /// Returns the tag byte written before elements of this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Double => "double",
            Self::String => "string",
            Self::Document => "document",
            Self::Array => "array",
            Self::Binary => "binary",
            Self::ObjectId => "objectId",
            Self::Boolean => "bool",
            Self::DateTime => "date",
            Self::Null => "null",
            Self::Int32 => "int",
            Self::Int64 => "long",
        };
        f.write_str(name)
    }
}
