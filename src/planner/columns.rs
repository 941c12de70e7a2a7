use crate::types::error::DatabaseError;

// Leading keywords of table-level constraints inside a CREATE TABLE column list.
const TABLE_CONSTRAINT_KEYWORDS: &[&str] = &["constraint", "primary", "unique", "check", "foreign"];

/// Column order of a table, taken from its CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnLayout {
    columns: Vec<String>,
    row_id_alias: Option<usize>,
}

impl ColumnLayout {
    pub fn new(columns: Vec<String>, row_id_alias: Option<usize>) -> Self {
        Self {
            columns,
            row_id_alias,
        }
    }

    /// Extract column names from `sql`.
    ///
    /// Only the text between the first `(` and the last `)` is considered. Definitions are
    /// split on commas that are not nested inside parentheses, and each column name is the
    /// first token of its definition.
    pub fn parse(sql: &str) -> Self {
        let (Some(open), Some(close)) = (sql.find('('), sql.rfind(')')) else {
            return Self::default();
        };
        if close <= open {
            return Self::default();
        }

        let mut columns = Vec::new();
        let mut row_id_alias = None;
        for definition in split_top_level(&sql[open + 1..close]) {
            let definition = definition.trim();
            let Some(first) = definition.split_whitespace().next() else {
                continue;
            };
            let lowered = first.to_ascii_lowercase();
            if TABLE_CONSTRAINT_KEYWORDS
                .iter()
                .any(|k| lowered == *k || lowered.starts_with(&format!("{k}(")))
            {
                continue;
            }

            if row_id_alias.is_none() && is_integer_primary_key(definition) {
                row_id_alias = Some(columns.len());
            }
            columns.push(column_name(definition).to_string());
        }

        Self {
            columns,
            row_id_alias,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the `INTEGER PRIMARY KEY` column, whose stored value is the row id.
    pub fn row_id_alias(&self) -> Option<usize> {
        self.row_id_alias
    }

    /// Case-insensitive column lookup.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    /// Map each requested column to its position, in request order.
    pub fn resolve(&self, table: &str, names: &[String]) -> Result<Vec<usize>, DatabaseError> {
        names
            .iter()
            .map(|name| {
                self.index_of(name).ok_or_else(|| DatabaseError::ColumnNotFound {
                    name: name.clone(),
                    table: table.to_string(),
                })
            })
            .collect()
    }
}

fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

fn is_integer_primary_key(definition: &str) -> bool {
    let (_, rest) = split_name(definition);
    let tokens: Vec<String> = rest
        .split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect();
    tokens.first().is_some_and(|t| t == "integer")
        && tokens.windows(2).any(|w| w[0] == "primary" && w[1] == "key")
}

fn column_name(definition: &str) -> &str {
    split_name(definition).0
}

// Column name with identifier quotes removed, and the text after it.
fn split_name(definition: &str) -> (&str, &str) {
    let quoted = [('"', '"'), ('`', '`'), ('[', ']'), ('\'', '\'')];
    for (open, close) in quoted {
        if let Some(rest) = definition.strip_prefix(open) {
            return match rest.find(close) {
                Some(end) => (&rest[..end], &rest[end + close.len_utf8()..]),
                None => (rest, ""),
            };
        }
    }
    match definition.find(char::is_whitespace) {
        Some(end) => (&definition[..end], &definition[end..]),
        None => (definition, ""),
    }
}
