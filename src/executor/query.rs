use std::{
    fmt,
    fs::File,
    io::{Read, Seek},
    ops::ControlFlow,
};

use tracing::{debug, warn};

use crate::{
    executor::filter::RowFilter,
    planner::{Command, Condition, Projection},
    storage::{
        header::TextEncoding,
        pager::Pager,
        schema::{SchemaCatalog, TableSchema},
    },
    types::{error::DatabaseError, value::ColumnValue},
};

pub const DEFAULT_SEPARATOR: &str = "|";

/// Summary behind `.dbinfo`. Only the page size and entry count are printed; the rest is
/// logged at debug level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInfo {
    pub page_size: u32,
    /// Number of schema entries (tables, indexes, views and triggers).
    pub table_count: usize,
    pub page_count: u64,
    pub text_encoding: Option<TextEncoding>,
}

impl fmt::Display for DbInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "database page size: {}", self.page_size)?;
        write!(f, "number of tables: {}", self.table_count)
    }
}

/// Result of executing a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    DbInfo(DbInfo),
    Tables(Vec<String>),
    Count(usize),
    Rows(Vec<String>),
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutput::DbInfo(info) => write!(f, "{}", info),
            QueryOutput::Tables(tables) => write!(f, "{}", tables.join(" ")),
            QueryOutput::Count(count) => write!(f, "{}", count),
            QueryOutput::Rows(rows) => write!(f, "{}", rows.join("\n")),
        }
    }
}

/// Runs read-only queries against one open database.
pub struct QueryExecutor<R = File> {
    pager: Pager<R>,
    separator: String,
}

impl<R: Read + Seek> QueryExecutor<R> {
    pub fn new(pager: Pager<R>) -> Self {
        Self {
            pager,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Column separator used when rendering projected rows.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn pager(&self) -> &Pager<R> {
        &self.pager
    }

    pub fn execute(&mut self, command: &Command) -> Result<QueryOutput, DatabaseError> {
        debug!(%command, "Executing command");
        let output = match command {
            Command::DbInfo => QueryOutput::DbInfo(self.db_info()),
            Command::Tables => QueryOutput::Tables(self.list_tables()),
            Command::Count { table } => QueryOutput::Count(self.count_rows(table)),
            Command::Select {
                table,
                projection,
                condition,
            } => QueryOutput::Rows(self.select_columns(table, projection, condition.as_ref())?),
        };
        Ok(output)
    }

    pub fn db_info(&mut self) -> DbInfo {
        let info = DbInfo {
            page_size: self.pager.page_size(),
            table_count: SchemaCatalog::entry_count(&mut self.pager),
            page_count: self.pager.page_count(),
            text_encoding: self.pager.header().encoding(),
        };
        debug!(
            page_count = info.page_count,
            text_encoding = ?info.text_encoding,
            "Database info"
        );
        info
    }

    /// `tbl_name` of every schema entry whose `tbl_name` is text, in traversal order.
    pub fn list_tables(&mut self) -> Vec<String> {
        SchemaCatalog::entries(&mut self.pager)
            .into_iter()
            .filter_map(|entry| entry.table_name())
            .collect()
    }

    pub fn resolve_table(&mut self, table: &str) -> Option<TableSchema> {
        let schema = SchemaCatalog::resolve(&mut self.pager, table);
        if schema.is_none() {
            warn!(table, "No such table");
        }
        schema
    }

    /// Number of rows in `table`; zero when the table does not exist.
    pub fn count_rows(&mut self, table: &str) -> usize {
        match self.resolve_table(table) {
            Some(schema) => schema.btree().count_rows(&mut self.pager),
            None => 0,
        }
    }

    /// Projected rows of `table` rendered with the configured separator.
    pub fn select_columns(
        &mut self,
        table: &str,
        projection: &Projection,
        condition: Option<&Condition>,
    ) -> Result<Vec<String>, DatabaseError> {
        let rows = self.select_values(table, projection, condition)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                row.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(&self.separator)
            })
            .collect())
    }

    /// Projected rows of `table` as decoded values, in traversal order.
    ///
    /// The row-id alias column (`INTEGER PRIMARY KEY`) is replaced by the row id. Columns are
    /// decoded left to right only as far as needed, and a row is dropped as soon as its
    /// WHERE column fails to match.
    pub fn select_values(
        &mut self,
        table: &str,
        projection: &Projection,
        condition: Option<&Condition>,
    ) -> Result<Vec<Vec<ColumnValue>>, DatabaseError> {
        let Some(schema) = self.resolve_table(table) else {
            return Ok(Vec::new());
        };
        let layout = &schema.layout;

        let projected = match projection {
            Projection::All => (0..layout.len()).collect(),
            Projection::Columns(columns) => layout.resolve(&schema.name, columns)?,
        };
        let filter = match condition {
            Some(Condition { column, literal }) => {
                let index =
                    layout
                        .index_of(column)
                        .ok_or_else(|| DatabaseError::ColumnNotFound {
                            name: column.clone(),
                            table: schema.name.clone(),
                        })?;
                RowFilter::equals(index, literal.clone())
            }
            None => RowFilter::All,
        };

        let needed = projected
            .iter()
            .copied()
            .chain(filter.column_index())
            .max()
            .map_or(0, |max| max + 1);
        let row_id_alias = layout.row_id_alias();

        let mut rows = Vec::new();
        schema.btree().walk(&mut self.pager, |record| {
            let mut values = record.values();
            let mut decoded = Vec::with_capacity(needed);
            for index in 0..needed {
                // Columns added after the row was written are absent from its record.
                let mut value = values.next().unwrap_or(ColumnValue::Null);
                if row_id_alias == Some(index) {
                    value = ColumnValue::Integer(record.row_id);
                }
                if !filter.accepts(index, &value) {
                    return ControlFlow::Continue(());
                }
                decoded.push(value);
            }
            rows.push(projected.iter().map(|&i| decoded[i].clone()).collect());
            ControlFlow::Continue(())
        });

        debug!(table = %schema.name, rows = rows.len(), "Selected rows");
        Ok(rows)
    }
}
