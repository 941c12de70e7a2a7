pub mod btree;
pub mod header;
pub mod pager;
pub mod record;
pub mod schema;

pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";
