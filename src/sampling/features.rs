//! Feature extraction for cluster-based sampling.
//!
//! Turns a [`Table`] into a dense numeric matrix in three steps:
//!
//! 1. **Classification** - tag each column as identifier-like, constant,
//!    numeric or categorical
//! 2. **Reduction** - drop identifier-like and constant columns, impute
//!    missing values (mode for numeric, a sentinel category for categorical)
//! 3. **Encoding** - one-hot encode categorical columns, dropping one
//!    reference category per column

use std::collections::{BTreeMap, BTreeSet, HashSet};

use ndarray::Array2;
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::table::{Table, Value, ValueKey};

/// Category substituted for missing categorical values.
pub const MISSING_CATEGORY: &str = "<missing>";

/// Classification of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every value is distinct, so the column cannot group rows.
    Identifier,
    /// A single distinct value, so the column cannot separate rows.
    Constant,
    /// All present values are numbers or booleans.
    Numeric,
    /// Anything else; values are compared by type and content, so `1` and
    /// `"1"` are different categories.
    Categorical,
}

impl ColumnKind {
    /// Returns true if the column is kept for clustering.
    pub fn is_informative(&self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Categorical)
    }
}

/// An informative column after missing-value imputation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReducedColumn {
    Numeric { name: String, values: Vec<f64> },
    Categorical { name: String, values: Vec<Value> },
}

impl ReducedColumn {
    /// Name of the source column.
    pub fn name(&self) -> &str {
        match self {
            ReducedColumn::Numeric { name, .. } | ReducedColumn::Categorical { name, .. } => name,
        }
    }
}

/// Classifies every column of the table.
///
/// Missing values count as one distinct value, so a column that is unique
/// apart from a single gap is still identifier-like.
pub fn classify_columns(table: &Table) -> Vec<ColumnKind> {
    (0..table.columns().len())
        .map(|column| classify_column(table, column))
        .collect()
}

fn classify_column(table: &Table, column: usize) -> ColumnKind {
    let distinct: HashSet<ValueKey<'_>> = table.column_values(column).map(Value::key).collect();

    if distinct.len() == table.len() {
        ColumnKind::Identifier
    } else if distinct.len() == 1 {
        ColumnKind::Constant
    } else if table
        .column_values(column)
        .all(|value| value.is_null() || value.as_f64().is_some())
    {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Drops uninformative columns and fills in missing values.
///
/// Returns an empty vector when no column carries grouping signal.
pub fn reduce_features(table: &Table) -> Vec<ReducedColumn> {
    classify_columns(table)
        .into_iter()
        .enumerate()
        .filter_map(|(column, kind)| {
            let name = table.columns()[column].clone();
            match kind {
                ColumnKind::Identifier | ColumnKind::Constant => {
                    debug!(column = %name, ?kind, "Dropping uninformative column");
                    None
                }
                ColumnKind::Numeric => Some(ReducedColumn::Numeric {
                    values: impute_numeric(table, column),
                    name,
                }),
                ColumnKind::Categorical => Some(ReducedColumn::Categorical {
                    values: impute_categorical(table, column),
                    name,
                }),
            }
        })
        .collect()
}

/// Mode imputation. Ties go to the smallest value.
fn impute_numeric(table: &Table, column: usize) -> Vec<f64> {
    let mut counts: BTreeMap<OrderedFloat<f64>, usize> = BTreeMap::new();
    for value in table.column_values(column).filter_map(Value::as_f64) {
        *counts.entry(OrderedFloat(value)).or_insert(0) += 1;
    }

    let mut mode = 0.0;
    let mut best = 0;
    for (value, count) in counts {
        if count > best {
            best = count;
            mode = value.into_inner();
        }
    }

    table
        .column_values(column)
        .map(|value| value.as_f64().unwrap_or(mode))
        .collect()
}

fn impute_categorical(table: &Table, column: usize) -> Vec<Value> {
    table
        .column_values(column)
        .map(|value| match value {
            Value::Null => Value::from(MISSING_CATEGORY),
            other => other.clone(),
        })
        .collect()
}

/// Builds the feature matrix, one row per table row.
///
/// Numeric columns pass through. Each categorical column becomes one 0/1
/// indicator per category except the smallest one. Categories sort by kind
/// first (booleans, then numbers, then text) and then by value.
pub fn encode_features(columns: &[ReducedColumn]) -> Array2<f64> {
    let n_rows = columns
        .first()
        .map(|column| match column {
            ReducedColumn::Numeric { values, .. } => values.len(),
            ReducedColumn::Categorical { values, .. } => values.len(),
        })
        .unwrap_or(0);

    let mut features: Vec<Vec<f64>> = Vec::new();

    for column in columns {
        if let ReducedColumn::Numeric { values, .. } = column {
            features.push(values.clone());
        }
    }

    for column in columns {
        if let ReducedColumn::Categorical { name, values } = column {
            let categories: BTreeSet<ValueKey<'_>> = values.iter().map(Value::key).collect();
            debug!(
                column = %name,
                categories = categories.len(),
                "One-hot encoding categorical column"
            );
            for category in categories.into_iter().skip(1) {
                features.push(
                    values
                        .iter()
                        .map(|v| if v.key() == category { 1.0 } else { 0.0 })
                        .collect(),
                );
            }
        }
    }

    Array2::from_shape_fn((n_rows, features.len()), |(row, feature)| {
        features[feature][row]
    })
}
