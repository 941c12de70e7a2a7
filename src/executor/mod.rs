pub mod filter;
pub mod query;

pub use query::{DbInfo, QueryExecutor, QueryOutput};
