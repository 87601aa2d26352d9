//! In-memory tabular values.
//!
//! A [`Table`] is an ordered list of rows sharing one header. Storing the
//! header once means every row carries the same column set by construction;
//! the constructors are where heterogeneous inputs (list of records, list of
//! lists with a header row) get normalized into that shape.
//!
//! # Example
//!
//! ```
//! use tableserializer::table::{Table, Value};
//!
//! let table = Table::from_json_str(r#"[{"name": "a", "score": 1}, {"name": "b", "score": null}]"#)
//!     .expect("valid table");
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.rows()[1][1], Value::Null);
//! ```

mod value;

pub use value::Value;
pub(crate) use value::ValueKey;

use std::collections::HashSet;

use serde_json::Map;

use crate::error::TableError;

/// JSON object form of a single row.
pub type Record = Map<String, serde_json::Value>;

/// Ordered rows of named scalar fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates a table from a header and rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a column name repeats or a row width differs from
    /// the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Builds a table from a list of JSON objects.
    ///
    /// The first record fixes the column order. Keys missing from later
    /// records are filled with [`Value::Null`]; keys the first record does not
    /// have are rejected.
    pub fn from_records(records: Vec<Record>) -> Result<Self, TableError> {
        let Some(first) = records.first() else {
            return Ok(Self::default());
        };
        let columns: Vec<String> = first.keys().cloned().collect();

        let mut rows = Vec::with_capacity(records.len());
        for (idx, mut record) in records.into_iter().enumerate() {
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                let cell = record.remove(column).unwrap_or(serde_json::Value::Null);
                row.push(Value::from_json(column, cell)?);
            }
            if let Some(column) = record.keys().next() {
                return Err(TableError::UnknownColumn {
                    row: idx,
                    column: column.clone(),
                });
            }
            rows.push(row);
        }

        Self::new(columns, rows)
    }

    /// Builds a table from a header row followed by data rows.
    pub fn from_nested(rows: Vec<Vec<serde_json::Value>>) -> Result<Self, TableError> {
        let mut rows = rows.into_iter();
        let Some(header) = rows.next() else {
            return Ok(Self::default());
        };

        let columns = header
            .into_iter()
            .map(|cell| match cell {
                serde_json::Value::String(name) => Ok(name),
                other => Err(TableError::UnsupportedLayout(format!(
                    "header cells must be strings, got {}",
                    other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = rows
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(idx, cell)| {
                        let column = columns.get(idx).map(String::as_str).unwrap_or("?");
                        Value::from_json(column, cell)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(columns, rows)
    }

    /// Parses a table from JSON text, either a list of objects or a list of
    /// lists whose first entry is the header.
    pub fn from_json_str(text: &str) -> Result<Self, TableError> {
        let parsed: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Array(items) = parsed else {
            return Err(TableError::UnsupportedLayout(
                "expected a JSON array of rows".to_string(),
            ));
        };

        if items.iter().all(serde_json::Value::is_object) {
            let records = items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            Self::from_records(records)
        } else if items.iter().all(serde_json::Value::is_array) {
            let rows = items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::Array(cells) => Some(cells),
                    _ => None,
                })
                .collect();
            Self::from_nested(rows)
        } else {
            Err(TableError::UnsupportedLayout(
                "rows must be all objects or all arrays".to_string(),
            ))
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, each aligned with [`Table::columns`].
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Iterates over one column's values, top to bottom.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[column])
    }

    /// Returns a new table holding the given rows in the given order.
    ///
    /// Indices must be in range.
    pub fn select(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Returns a copy without the named columns. Unknown names are ignored.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&idx| !names.iter().any(|n| n.as_ref() == self.columns[idx]))
            .collect();

        Table {
            columns: keep.iter().map(|&idx| self.columns[idx].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&idx| row[idx].clone()).collect())
                .collect(),
        }
    }

    /// Returns a copy with `f` applied to every cell.
    pub fn map_values<F>(&self, f: F) -> Table
    where
        F: Fn(&Value) -> Value,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(&f).collect())
                .collect(),
        }
    }

    /// Converts every row into an ordered JSON object.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(Value::to_json))
                    .collect()
            })
            .collect()
    }
}
