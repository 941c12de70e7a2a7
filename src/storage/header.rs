use crate::{
    storage::SQLITE_MAGIC,
    types::{HEADER_SIZE, error::DatabaseError},
};

const MIN_PAGE_SIZE: u32 = 512;
const MAX_PAGE_SIZE: u32 = 65536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16le,
    Utf16be,
}

impl TextEncoding {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(TextEncoding::Utf8),
            2 => Some(TextEncoding::Utf16le),
            3 => Some(TextEncoding::Utf16be),
            _ => None,
        }
    }
}

/// The 100-byte database header at the start of page 1.
#[derive(Debug, Clone)]
pub struct DatabaseHeader {
    pub page_size: u32,
    pub file_format_write_version: u8,
    pub file_format_read_version: u8,
    pub reserved_space: u8,
    pub max_embedded_payload_fraction: u8,
    pub min_embedded_payload_fraction: u8,
    pub leaf_payload_fraction: u8,
    pub file_change_counter: u32,
    pub database_size_pages: u32,
    pub freelist_trunk_page: u32,
    pub freelist_pages_count: u32,
    pub schema_cookie: u32,
    pub schema_format_number: u32,
    pub default_page_cache_size: u32,
    pub largest_root_btree_page: u32,
    /// Raw encoding field; `0` is written by databases that were never given a schema.
    pub text_encoding: u32,
    pub user_version: u32,
    pub incremental_vacuum_mode: u32,
    pub application_id: u32,
    pub version_valid_for: u32,
    pub sqlite_version_number: u32,
}

impl DatabaseHeader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("Header too short: {} bytes", bytes.len()),
            });
        }

        if &bytes[..16] != SQLITE_MAGIC {
            return Err(DatabaseError::InvalidHeader {
                reason: "Invalid SQLite magic string".to_string(),
            });
        }

        // The value 1 stands for 65536, which does not fit in the 2-byte field.
        let page_size = match u16::from_be_bytes([bytes[16], bytes[17]]) {
            1 => MAX_PAGE_SIZE,
            n => n as u32,
        };
        if !page_size.is_power_of_two() || !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(DatabaseError::InvalidPageSize(page_size));
        }

        Ok(Self {
            page_size,
            file_format_write_version: bytes[18],
            file_format_read_version: bytes[19],
            reserved_space: bytes[20],
            max_embedded_payload_fraction: bytes[21],
            min_embedded_payload_fraction: bytes[22],
            leaf_payload_fraction: bytes[23],
            file_change_counter: be_u32(bytes, 24),
            database_size_pages: be_u32(bytes, 28),
            freelist_trunk_page: be_u32(bytes, 32),
            freelist_pages_count: be_u32(bytes, 36),
            schema_cookie: be_u32(bytes, 40),
            schema_format_number: be_u32(bytes, 44),
            default_page_cache_size: be_u32(bytes, 48),
            largest_root_btree_page: be_u32(bytes, 52),
            text_encoding: be_u32(bytes, 56),
            user_version: be_u32(bytes, 60),
            incremental_vacuum_mode: be_u32(bytes, 64),
            application_id: be_u32(bytes, 68),
            version_valid_for: be_u32(bytes, 92),
            sqlite_version_number: be_u32(bytes, 96),
        })
    }

    pub fn encoding(&self) -> Option<TextEncoding> {
        TextEncoding::from_u32(self.text_encoding)
    }
}

fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
