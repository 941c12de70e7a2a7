use crate::types::value::ColumnValue;

/// Row filter built from an optional `WHERE <col> = <literal>` clause.
///
/// `All` stands in for a missing WHERE clause so callers can evaluate the filter on every
/// column without first checking whether one was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    All,
    Equals { column_index: usize, literal: String },
}

impl RowFilter {
    pub fn equals(column_index: usize, literal: impl Into<String>) -> Self {
        Self::Equals {
            column_index,
            literal: literal.into(),
        }
    }

    pub fn column_index(&self) -> Option<usize> {
        match self {
            RowFilter::All => None,
            RowFilter::Equals { column_index, .. } => Some(*column_index),
        }
    }

    /// Whether a row whose column `index` holds `value` can still match.
    ///
    /// Comparison is on the textual form of the value, so `2` matches an integer column
    /// holding 2 but not a float column holding 2.0.
    pub fn accepts(&self, index: usize, value: &ColumnValue) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Equals {
                column_index,
                literal,
            } => *column_index != index || value.text_eq(literal),
        }
    }
}
