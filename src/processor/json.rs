use serde_json::{Map, Value as JsonValue};

use crate::table::Table;

use super::TableProcessor;

/// One JSON object per row: `{"<row index>": {"<column>": "<value>", ...}}`.
///
/// Values are rendered as strings so numbers and text read the same way to
/// the embedding model.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTableProcessor;

impl TableProcessor for JsonTableProcessor {
    fn serialize_table(&self, table: &Table) -> String {
        table
            .rows()
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let fields: Map<String, JsonValue> = table
                    .columns()
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.clone(), JsonValue::String(value.to_string())))
                    .collect();
                let mut line = Map::new();
                line.insert(index.to_string(), JsonValue::Object(fields));
                JsonValue::Object(line).to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
