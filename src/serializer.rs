//! Table serialization for embedding models.
//!
//! A [`TableSerializer`] assembles up to three sections, ordered by their
//! configured positions:
//!
//! - **Context** - `Context: ` followed by the table metadata as JSON
//! - **Schema** - the schema serializer's label followed by its output
//! - **Table** - `Table: ` followed by the rendered (optionally sampled) rows
//!
//! # Example
//!
//! ```
//! use tableserializer::sampling::SamplerConfig;
//! use tableserializer::serializer::TableSerializerBuilder;
//! use tableserializer::table::Table;
//!
//! let table = Table::from_json_str(r#"[{"city": "Oslo", "pop": 700000}]"#).expect("valid table");
//!
//! let mut serializer = TableSerializerBuilder::new()
//!     .include_schema(None)
//!     .with_markdown_table_processor(None)
//!     .with_first_row_sampler(SamplerConfig::default())
//!     .build();
//!
//! let text = serializer.serialize_table(&table, None).expect("serializable");
//! assert!(text.starts_with("Column names: city , pop\nTable: | city | pop |"));
//! ```

use tracing::debug;

use crate::error::SerializerError;
use crate::preprocess::TablePreprocessor;
use crate::processor::{JsonTableProcessor, MarkdownTableProcessor, TableProcessor};
use crate::sampling::{
    ClusterRowSampler, FirstRowSampler, RandomRowSampler, RowSampler, SamplerConfig,
};
use crate::schema::{ColumnNameSchemaSerializer, Metadata, SchemaSerializer};
use crate::table::Table;

/// Separator used by the schema serializer that `include_schema` installs.
const DEFAULT_SCHEMA_SEPARATOR: &str = ",";

/// Turns tables into text for embedding.
///
/// Holds its row sampler by value, so serializing advances the sampler's
/// random state.
#[derive(Debug)]
pub struct TableSerializer {
    include_context: bool,
    context_position: usize,
    schema_serializer: Option<Box<dyn SchemaSerializer>>,
    schema_position: usize,
    table_processor: Option<Box<dyn TableProcessor>>,
    table_position: usize,
    preprocessors: Vec<Box<dyn TablePreprocessor>>,
    row_sampler: Option<Box<dyn RowSampler>>,
}

impl TableSerializer {
    /// Serializes a table, with optional metadata for the context section.
    ///
    /// Preprocessors run first, then the row sampler (once), then the table
    /// processor. Sections that are not configured are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be rendered or the context
    /// cannot be encoded.
    pub fn serialize_table(
        &mut self,
        table: &Table,
        context: Option<&Metadata>,
    ) -> Result<String, SerializerError> {
        let mut processed = table.clone();
        for preprocessor in &self.preprocessors {
            processed = preprocessor.process(&processed);
        }

        let mut sections: Vec<(usize, String)> = Vec::with_capacity(3);

        if self.include_context {
            let context = match context {
                Some(metadata) => serde_json::to_string(metadata)?,
                None => "{}".to_string(),
            };
            sections.push((self.context_position, format!("Context: {}", context)));
        }

        if let Some(schema_serializer) = &self.schema_serializer {
            let schema = schema_serializer.serialize_schema(&processed, context)?;
            sections.push((
                self.schema_position,
                format!("{}{}", schema_serializer.label(), schema),
            ));
        }

        if let Some(table_processor) = &self.table_processor {
            let to_render = match self.row_sampler.as_mut() {
                Some(sampler) => {
                    let sampled = sampler.sample(&processed);
                    debug!(
                        rows_before = processed.len(),
                        rows_after = sampled.len(),
                        "Sampled table rows"
                    );
                    sampled
                }
                None => processed,
            };
            sections.push((
                self.table_position,
                format!("Table: {}", table_processor.serialize_table(&to_render)),
            ));
        }

        sections.sort_by_key(|(position, _)| *position);

        Ok(sections
            .into_iter()
            .map(|(_, text)| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Row sampler in use, if any.
    pub fn row_sampler(&self) -> Option<&dyn RowSampler> {
        self.row_sampler.as_deref()
    }
}

/// Builder for a [`TableSerializer`].
///
/// Section positions passed as `None` take the next free slot, in the order
/// the sections are added.
#[derive(Debug, Default)]
pub struct TableSerializerBuilder {
    include_context: bool,
    include_schema: bool,
    schema_serializer: Option<Box<dyn SchemaSerializer>>,
    table_processor: Option<Box<dyn TableProcessor>>,
    preprocessors: Vec<Box<dyn TablePreprocessor>>,
    row_sampler: Option<Box<dyn RowSampler>>,
    current_position: usize,
    context_position: usize,
    schema_position: usize,
    table_position: usize,
}

impl TableSerializerBuilder {
    /// Creates a builder with no sections.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&mut self, at: Option<usize>) -> usize {
        match at {
            Some(position) => position,
            None => {
                let position = self.current_position;
                self.current_position += 1;
                position
            }
        }
    }

    /// Adds the context section.
    pub fn include_context(mut self, at: Option<usize>) -> Self {
        self.include_context = true;
        self.context_position = self.position(at);
        self
    }

    /// Adds the schema section.
    ///
    /// Uses a [`ColumnNameSchemaSerializer`] unless another one is set with
    /// [`TableSerializerBuilder::with_schema_serializer`].
    pub fn include_schema(mut self, at: Option<usize>) -> Self {
        self.include_schema = true;
        self.schema_position = self.position(at);
        self
    }

    /// Sets the schema serializer used by the schema section.
    pub fn with_schema_serializer(mut self, serializer: impl SchemaSerializer + 'static) -> Self {
        self.schema_serializer = Some(Box::new(serializer));
        self
    }

    /// Renders the table section with [`JsonTableProcessor`].
    pub fn with_json_table_processor(self, at: Option<usize>) -> Self {
        self.with_table_processor(Box::new(JsonTableProcessor), at)
    }

    /// Renders the table section with [`MarkdownTableProcessor`].
    pub fn with_markdown_table_processor(self, at: Option<usize>) -> Self {
        self.with_table_processor(Box::new(MarkdownTableProcessor), at)
    }

    /// Renders the table section with a custom processor.
    pub fn with_table_processor(
        mut self,
        processor: Box<dyn TableProcessor>,
        at: Option<usize>,
    ) -> Self {
        self.table_processor = Some(processor);
        self.table_position = self.position(at);
        self
    }

    /// Appends a preprocessor. Preprocessors run in insertion order.
    pub fn with_preprocessor(mut self, preprocessor: impl TablePreprocessor + 'static) -> Self {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Samples rows uniformly at random.
    pub fn with_random_row_sampler(self, config: SamplerConfig) -> Self {
        self.with_row_sampler(Box::new(RandomRowSampler::new(config)))
    }

    /// Keeps the leading rows.
    pub fn with_first_row_sampler(self, config: SamplerConfig) -> Self {
        self.with_row_sampler(Box::new(FirstRowSampler::new(config)))
    }

    /// Keeps one representative row per k-means cluster.
    pub fn with_kmeans_row_sampler(self, config: SamplerConfig) -> Self {
        self.with_row_sampler(Box::new(ClusterRowSampler::new(config)))
    }

    /// Uses a custom row sampler, replacing any previous one.
    pub fn with_row_sampler(mut self, sampler: Box<dyn RowSampler>) -> Self {
        self.row_sampler = Some(sampler);
        self
    }

    /// Builds the serializer.
    pub fn build(self) -> TableSerializer {
        let schema_serializer = if self.include_schema {
            Some(self.schema_serializer.unwrap_or_else(|| {
                Box::new(ColumnNameSchemaSerializer::new(DEFAULT_SCHEMA_SEPARATOR))
            }))
        } else {
            None
        };

        TableSerializer {
            include_context: self.include_context,
            context_position: self.context_position,
            schema_serializer,
            schema_position: self.schema_position,
            table_processor: self.table_processor,
            table_position: self.table_position,
            preprocessors: self.preprocessors,
            row_sampler: self.row_sampler,
        }
    }
}
