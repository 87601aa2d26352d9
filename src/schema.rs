//! Schema stringification.
//!
//! Renders the shape of a table (as opposed to its contents) so it can be
//! placed alongside, or instead of, the serialized rows.

use std::fmt;

use crate::error::SerializerError;
use crate::table::{Table, Value};

/// Free-form metadata accompanying a table, e.g. its title or source.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Renders a table schema as text.
pub trait SchemaSerializer: Send + Sync + fmt::Debug {
    /// Serializes the schema of `table`.
    fn serialize_schema(
        &self,
        table: &Table,
        metadata: Option<&Metadata>,
    ) -> Result<String, SerializerError>;

    /// Prefix placed in front of the schema section.
    fn label(&self) -> &str {
        "Schema: "
    }
}

/// Joins the column names with a separator.
#[derive(Debug, Clone)]
pub struct ColumnNameSchemaSerializer {
    separator: String,
}

impl Default for ColumnNameSchemaSerializer {
    fn default() -> Self {
        Self::new("|")
    }
}

impl ColumnNameSchemaSerializer {
    /// Creates a serializer that joins names with ` <separator> `.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl SchemaSerializer for ColumnNameSchemaSerializer {
    fn serialize_schema(
        &self,
        table: &Table,
        _metadata: Option<&Metadata>,
    ) -> Result<String, SerializerError> {
        Ok(table
            .columns()
            .join(format!(" {} ", self.separator).as_str()))
    }

    fn label(&self) -> &str {
        "Column names: "
    }
}

/// Emits a `CREATE TABLE` statement.
///
/// The table name is read from a metadata field when one is configured,
/// otherwise the default name is used. Column types are inferred from the
/// values: all-integral numbers and booleans map to `INTEGER`, other numbers
/// to `REAL`, everything else to `TEXT`. A leading `"index"` column mirrors
/// the row position.
#[derive(Debug, Clone)]
pub struct SqlSchemaSerializer {
    metadata_table_name_field: Option<String>,
    default_table_name: String,
}

impl Default for SqlSchemaSerializer {
    fn default() -> Self {
        Self {
            metadata_table_name_field: None,
            default_table_name: "table".to_string(),
        }
    }
}

impl SqlSchemaSerializer {
    /// Creates a serializer using the default table name `table`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the table name from this metadata field.
    pub fn with_metadata_table_name_field(mut self, field: impl Into<String>) -> Self {
        self.metadata_table_name_field = Some(field.into());
        self
    }

    /// Sets the name used when no metadata field is configured.
    pub fn with_default_table_name(mut self, name: impl Into<String>) -> Self {
        self.default_table_name = name.into();
        self
    }

    fn table_name(&self, metadata: Option<&Metadata>) -> Result<String, SerializerError> {
        let Some(field) = &self.metadata_table_name_field else {
            return Ok(self.default_table_name.clone());
        };

        match metadata.and_then(|m| m.get(field)) {
            Some(serde_json::Value::String(name)) => Ok(name.clone()),
            Some(other) => Err(SerializerError::InvalidMetadataField {
                field: field.clone(),
                found: other.to_string(),
            }),
            None => Err(SerializerError::MissingMetadataField(field.clone())),
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(table: &Table, column: usize) -> &'static str {
    let mut present = table.column_values(column).filter(|v| !v.is_null()).peekable();
    if present.peek().is_none() {
        return "TEXT";
    }

    let mut integral = true;
    for value in present {
        match value {
            Value::Bool(_) => {}
            Value::Number(n) => integral &= n.is_finite() && n.fract() == 0.0,
            _ => return "TEXT",
        }
    }

    if integral {
        "INTEGER"
    } else {
        "REAL"
    }
}

impl SchemaSerializer for SqlSchemaSerializer {
    fn serialize_schema(
        &self,
        table: &Table,
        metadata: Option<&Metadata>,
    ) -> Result<String, SerializerError> {
        let name = self.table_name(metadata)?;

        let mut definitions = vec![format!("{} INTEGER", quote_identifier("index"))];
        for (idx, column) in table.columns().iter().enumerate() {
            definitions.push(format!(
                "{} {}",
                quote_identifier(column),
                sql_type(table, idx)
            ));
        }

        Ok(format!(
            "CREATE TABLE {} (\n{}\n)",
            quote_identifier(&name),
            definitions.join(",\n  ")
        ))
    }
}
