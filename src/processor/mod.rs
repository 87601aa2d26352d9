//! Table-to-text rendering.
//!
//! A [`TableProcessor`] flattens a (possibly sampled) table into the string
//! that ends up in front of the embedding model. Two layouts exist: one JSON
//! object per line keyed by row index, and a markdown pipe table.

mod json;
mod markdown;

pub use json::JsonTableProcessor;
pub use markdown::MarkdownTableProcessor;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::Table;

/// Renders a table as text.
pub trait TableProcessor: Send + Sync + fmt::Debug {
    /// Serializes every row of `table`.
    fn serialize_table(&self, table: &Table) -> String;
}

/// Supported text layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Json,
    Markdown,
}

impl TableFormat {
    /// Creates the processor for this layout.
    pub fn processor(self) -> Box<dyn TableProcessor> {
        match self {
            TableFormat::Json => Box::new(JsonTableProcessor),
            TableFormat::Markdown => Box::new(MarkdownTableProcessor),
        }
    }

    /// Name used in configuration files and experiment slugs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Json => "json",
            TableFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
