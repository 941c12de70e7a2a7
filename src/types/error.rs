use thiserror::Error;

use crate::types::PageNumber;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid database header: {reason}")]
    InvalidHeader { reason: String },

    #[error("Invalid page size: {0}")]
    InvalidPageSize(u32),

    #[error("Page {page} is out of range (file has {page_count} pages)")]
    PageOutOfRange { page: PageNumber, page_count: u64 },

    #[error("Malformed cell at offset {offset}: {reason}")]
    MalformedCell { offset: u64, reason: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error(transparent)]
    Planner(#[from] crate::planner::error::PlannerError),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
