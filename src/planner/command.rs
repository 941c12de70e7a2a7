use std::fmt;

/// A recognized user command with its arguments already extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `.dbinfo`
    DbInfo,
    /// `.tables`
    Tables,
    /// `SELECT COUNT(*) FROM <table>`
    Count { table: String },
    /// `SELECT <cols> FROM <table> [WHERE <col> = <literal>]`
    Select {
        table: String,
        projection: Projection,
        condition: Option<Condition>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*`: every column in declaration order.
    All,
    Columns(Vec<String>),
}

/// `<column> = <literal>`, compared on the textual form of the column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: String,
    pub literal: String,
}

impl Condition {
    pub fn new(column: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            literal: literal.into(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::DbInfo => f.write_str(".dbinfo"),
            Command::Tables => f.write_str(".tables"),
            Command::Count { table } => write!(f, "SELECT COUNT(*) FROM {}", table),
            Command::Select {
                table,
                projection,
                condition,
            } => {
                let columns = match projection {
                    Projection::All => "*".to_string(),
                    Projection::Columns(columns) => columns.join(", "),
                };
                write!(f, "SELECT {} FROM {}", columns, table)?;
                if let Some(Condition { column, literal }) = condition {
                    write!(f, " WHERE {} = '{}'", column, literal.replace('\'', "''"))?;
                }
                Ok(())
            }
        }
    }
}
