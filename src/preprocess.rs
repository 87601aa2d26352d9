//! Table preprocessors.
//!
//! Preprocessors transform a table before it is sampled and serialized,
//! typically to shorten the resulting text (dropping id columns, truncating
//! long strings).

use std::fmt;

use crate::table::{Table, Value};

/// Transforms a table before serialization.
pub trait TablePreprocessor: Send + Sync + fmt::Debug {
    /// Returns the transformed table.
    fn process(&self, table: &Table) -> Table;
}

/// Drops a fixed set of columns. Columns the table does not have are ignored.
#[derive(Debug, Clone, Default)]
pub struct ColumnDroppingPreprocessor {
    columns_to_drop: Vec<String>,
}

impl ColumnDroppingPreprocessor {
    /// Creates a preprocessor dropping the given columns.
    pub fn new<I, S>(columns_to_drop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns_to_drop: columns_to_drop.into_iter().map(Into::into).collect(),
        }
    }
}

impl TablePreprocessor for ColumnDroppingPreprocessor {
    fn process(&self, table: &Table) -> Table {
        table.drop_columns(&self.columns_to_drop)
    }
}

/// Truncates text cells to at most `max_len` characters.
#[derive(Debug, Clone)]
pub struct StringTruncationPreprocessor {
    max_len: usize,
}

impl StringTruncationPreprocessor {
    /// Creates a preprocessor keeping the first `max_len` characters.
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl TablePreprocessor for StringTruncationPreprocessor {
    fn process(&self, table: &Table) -> Table {
        table.map_values(|value| match value {
            Value::Text(s) if s.chars().count() > self.max_len => {
                Value::Text(s.chars().take(self.max_len).collect())
            }
            other => other.clone(),
        })
    }
}
