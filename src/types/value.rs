use std::fmt;

use crate::types::SerialTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidKind {
    Blob,
    Text,
    Number,
}

/// A single decoded record column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Float(f64),
    Zero,
    One,
    Reserved(SerialTag),
    Blob(Vec<u8>),
    /// Raw text bytes; no encoding is assumed beyond what `Display` does.
    Text(Vec<u8>),
    /// The declared width ran past the end of the record.
    Invalid(InvalidKind),
    Unknown(SerialTag),
}

impl ColumnValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ColumnValue::Integer(i) => Some(*i),
            ColumnValue::Zero => Some(0),
            ColumnValue::One => Some(1),
            ColumnValue::Text(bytes) => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[u8]> {
        match self {
            ColumnValue::Text(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Whether the textual form of this value equals `literal`.
    pub fn text_eq(&self, literal: &str) -> bool {
        match self {
            ColumnValue::Text(bytes) => bytes.as_slice() == literal.as_bytes(),
            other => other.to_string() == literal,
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => Ok(()),
            ColumnValue::Integer(i) => write!(f, "{}", i),
            ColumnValue::Float(r) => write!(f, "{:?}", r),
            ColumnValue::Zero => f.write_str("0"),
            ColumnValue::One => f.write_str("1"),
            ColumnValue::Reserved(tag) => write!(f, "Reserved({})", tag),
            ColumnValue::Blob(bytes) => write!(f, "BLOB({} bytes)", bytes.len()),
            ColumnValue::Text(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            ColumnValue::Invalid(InvalidKind::Blob) => f.write_str("Invalid BLOB"),
            ColumnValue::Invalid(InvalidKind::Text) => f.write_str("Invalid String"),
            ColumnValue::Invalid(InvalidKind::Number) => f.write_str("Invalid Number"),
            ColumnValue::Unknown(_) => f.write_str("Unknown Type"),
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Integer(value)
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        ColumnValue::Float(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.as_bytes().to_vec())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(value.into_bytes())
    }
}
