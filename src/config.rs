//! Runtime settings for the command-line front end.

use std::path::PathBuf;

use crate::executor::query::DEFAULT_SEPARATOR;

const DEFAULT_HISTORY_FILE: &str = ".litereader_history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Database file to open.
    pub database: PathBuf,
    /// Separator placed between projected columns.
    pub separator: String,
    /// REPL history file; `None` disables history persistence.
    pub history_file: Option<PathBuf>,
    /// Log at debug level instead of the default.
    pub verbose: bool,
}

impl Config {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            separator: DEFAULT_SEPARATOR.to_string(),
            history_file: Some(PathBuf::from(DEFAULT_HISTORY_FILE)),
            verbose: false,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_history_file(mut self, history_file: Option<PathBuf>) -> Self {
        self.history_file = history_file;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "litereader=debug"
        } else {
            "warn"
        }
    }
}
