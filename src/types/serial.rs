use crate::types::{
    SerialTag,
    value::{ColumnValue, InvalidKind},
};

/// Storage class of a record column, derived from its serial type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Float64,
    Zero,
    One,
    Reserved(SerialTag),
    Blob(usize),
    Text(usize),
    Unknown(SerialTag),
}

impl SerialType {
    pub fn from_tag(tag: SerialTag) -> Self {
        match tag {
            0 => SerialType::Null,
            1 => SerialType::Int8,
            2 => SerialType::Int16,
            3 => SerialType::Int24,
            4 => SerialType::Int32,
            5 => SerialType::Int48,
            6 => SerialType::Int64,
            7 => SerialType::Float64,
            8 => SerialType::Zero,
            9 => SerialType::One,
            10 | 11 => SerialType::Reserved(tag),
            t if t >= 12 && t % 2 == 0 => SerialType::Blob(((t - 12) / 2) as usize),
            t if t >= 13 => SerialType::Text(((t - 13) / 2) as usize),
            _ => SerialType::Unknown(tag),
        }
    }

    /// Number of body bytes a column of this type occupies.
    pub fn size(&self) -> usize {
        match *self {
            SerialType::Null | SerialType::Zero | SerialType::One => 0,
            SerialType::Int8 => 1,
            SerialType::Int16 => 2,
            SerialType::Int24 => 3,
            SerialType::Int32 => 4,
            SerialType::Int48 => 6,
            SerialType::Int64 | SerialType::Float64 => 8,
            SerialType::Blob(len) | SerialType::Text(len) => len,
            SerialType::Reserved(_) | SerialType::Unknown(_) => 0,
        }
    }

    /// Decode a column value from `bytes`, which starts at the column's first body byte.
    ///
    /// Never reads past `size()` bytes. A value whose declared width exceeds what is
    /// available decodes to [`ColumnValue::Invalid`].
    pub fn decode(&self, bytes: &[u8]) -> ColumnValue {
        let width = self.size();
        if bytes.len() < width {
            return ColumnValue::Invalid(match self {
                SerialType::Blob(_) => InvalidKind::Blob,
                SerialType::Text(_) => InvalidKind::Text,
                _ => InvalidKind::Number,
            });
        }
        let value = &bytes[..width];

        match *self {
            SerialType::Null => ColumnValue::Null,
            SerialType::Int8
            | SerialType::Int16
            | SerialType::Int24
            | SerialType::Int32
            | SerialType::Int48
            | SerialType::Int64 => ColumnValue::Integer(read_signed_be(value)),
            SerialType::Float64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(value);
                ColumnValue::Float(f64::from_be_bytes(raw))
            }
            SerialType::Zero => ColumnValue::Zero,
            SerialType::One => ColumnValue::One,
            SerialType::Reserved(tag) => ColumnValue::Reserved(tag),
            SerialType::Blob(_) => ColumnValue::Blob(value.to_vec()),
            SerialType::Text(_) => ColumnValue::Text(value.to_vec()),
            SerialType::Unknown(tag) => ColumnValue::Unknown(tag),
        }
    }
}

/// Width in bytes of a column with serial type `tag`.
pub fn size_of(tag: SerialTag) -> usize {
    SerialType::from_tag(tag).size()
}

/// Decode the column with serial type `tag` from `bytes`.
pub fn decode(tag: SerialTag, bytes: &[u8]) -> ColumnValue {
    SerialType::from_tag(tag).decode(bytes)
}

// Big-endian two's complement, sign-extended from the top bit of the first byte.
fn read_signed_be(bytes: &[u8]) -> i64 {
    let Some((&first, rest)) = bytes.split_first() else {
        return 0;
    };
    let mut value = first as i8 as i64;
    for &byte in rest {
        value = (value << 8) | byte as i64;
    }
    value
}
