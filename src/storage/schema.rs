use std::{
    io::{Read, Seek},
    ops::ControlFlow,
};

use tracing::debug;

use crate::{
    planner::columns::ColumnLayout,
    storage::{btree::TableBTree, pager::Pager, record::Record},
    types::{PageNumber, SCHEMA_ROOT_PAGE, value::ColumnValue},
};

/// One row of the schema table: `(type, name, tbl_name, rootpage, sql)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub entry_type: ColumnValue,
    pub name: ColumnValue,
    pub table_name: ColumnValue,
    pub root_page: ColumnValue,
    pub sql: ColumnValue,
}

impl SchemaEntry {
    /// Rows with fewer than five columns are not schema entries.
    pub fn from_record(record: &Record) -> Option<Self> {
        if record.column_count() < 5 {
            return None;
        }
        let mut values = record.values();
        Some(Self {
            entry_type: values.next()?,
            name: values.next()?,
            table_name: values.next()?,
            root_page: values.next()?,
            sql: values.next()?,
        })
    }

    pub fn is_table(&self) -> bool {
        self.entry_type.text_eq("table")
    }

    pub fn table_name(&self) -> Option<String> {
        self.table_name
            .as_text()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn root_page(&self) -> Option<PageNumber> {
        self.root_page
            .as_integer()
            .and_then(|page| PageNumber::try_from(page).ok())
    }

    pub fn sql(&self) -> String {
        self.sql.to_string()
    }
}

/// A resolved table: where its B-tree starts and how its columns are ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub root_page: PageNumber,
    pub sql: String,
    pub layout: ColumnLayout,
}

impl TableSchema {
    pub fn btree(&self) -> TableBTree {
        TableBTree::new(self.root_page)
    }
}

/// Lookups against the schema table stored in the B-tree rooted at page 1.
pub struct SchemaCatalog;

impl SchemaCatalog {
    pub fn btree() -> TableBTree {
        TableBTree::new(SCHEMA_ROOT_PAGE)
    }

    /// All schema entries in traversal order.
    pub fn entries<R: Read + Seek>(pager: &mut Pager<R>) -> Vec<SchemaEntry> {
        let mut entries = Vec::new();
        Self::btree().walk(pager, |record| {
            if let Some(entry) = SchemaEntry::from_record(&record) {
                entries.push(entry);
            }
            ControlFlow::Continue(())
        });
        entries
    }

    /// Number of schema entries, counted from leaf cells without decoding them.
    pub fn entry_count<R: Read + Seek>(pager: &mut Pager<R>) -> usize {
        Self::btree().count_rows(pager)
    }

    /// Find the first `table` entry named `table_name` (ASCII case-insensitive).
    pub fn resolve<R: Read + Seek>(pager: &mut Pager<R>, table_name: &str) -> Option<TableSchema> {
        let mut found = None;
        Self::btree().walk(pager, |record| {
            let Some(entry) = SchemaEntry::from_record(&record) else {
                return ControlFlow::Continue(());
            };
            let matches = entry.is_table()
                && entry
                    .table_name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(table_name));
            if !matches {
                return ControlFlow::Continue(());
            }

            match entry.root_page() {
                Some(root_page) => {
                    let sql = entry.sql();
                    found = Some(TableSchema {
                        name: entry.table_name().unwrap_or_default(),
                        root_page,
                        layout: ColumnLayout::parse(&sql),
                        sql,
                    });
                    ControlFlow::Break(())
                }
                None => {
                    debug!(table = table_name, "Schema entry has no usable root page");
                    ControlFlow::Continue(())
                }
            }
        });
        found
    }
}
