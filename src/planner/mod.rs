pub mod columns;
pub mod command;
pub mod error;
pub mod parser;

pub use command::{Command, Condition, Projection};
pub use parser::CommandParser;
