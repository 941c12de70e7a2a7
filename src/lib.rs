//! Read-only query engine for SQLite database files.
//!
//! The crate walks the on-disk B-tree pages of a database directly: it decodes varints
//! and record headers, resolves tables through the schema table on page 1, and answers
//! `.dbinfo`, `.tables`, `COUNT(*)` and single-table `SELECT` queries with an optional
//! equality filter.

pub mod config;
pub mod executor;
pub mod planner;
pub mod storage;
pub mod types;
pub mod utils;
