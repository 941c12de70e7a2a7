pub mod error;
pub mod page;
pub mod serial;
pub mod value;
pub mod varint;

// Common type aliases
pub type PageNumber = u32;
pub type RowId = i64;
pub type SerialTag = i64;

// Constants following the SQLite file format
pub const HEADER_SIZE: usize = 100; // Database header size, stored at the start of page 1
pub const SCHEMA_ROOT_PAGE: PageNumber = 1;
pub const LEAF_PAGE_HEADER_SIZE: usize = 8;
pub const INTERIOR_PAGE_HEADER_SIZE: usize = 12;
pub const CELL_POINTER_SIZE: usize = 2;
pub const MAX_VARINT_LEN: usize = 9;
