//! Experiment configuration.
//!
//! An [`ExperimentConfig`] names the embedding model under test and describes
//! which serializer sections to produce, in which order, and how rows are
//! sampled. Configurations are usually written as YAML:
//!
//! ```yaml
//! embedding_model_name: all-MiniLM-L6-v2
//! include_context: true
//! context_position: 0
//! include_schema: false
//! table_position: 1
//! table_serializer:
//!   serialization_format: markdown
//!   row_sampling_strategy: k-means
//!   row_samples_per_table: 5
//!   seed: 42
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::processor::TableFormat;
use crate::sampling::{SamplerConfig, SamplingStrategy, DEFAULT_ROWS_TO_SAMPLE};
use crate::serializer::{TableSerializer, TableSerializerBuilder};

/// How the table section is rendered and sampled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSerializationConfig {
    /// Text layout of the table section.
    pub serialization_format: TableFormat,

    /// Row sampling strategy (None = keep every row).
    #[serde(default)]
    pub row_sampling_strategy: Option<SamplingStrategy>,

    /// Rows kept per table when sampling (None = default of 10).
    #[serde(default)]
    pub row_samples_per_table: Option<usize>,

    /// Seed for randomized sampling (None = non-deterministic).
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TableSerializationConfig {
    /// Creates a config for the given layout without sampling.
    pub fn new(serialization_format: TableFormat) -> Self {
        Self {
            serialization_format,
            row_sampling_strategy: None,
            row_samples_per_table: None,
            seed: None,
        }
    }
}

/// One embedding experiment: model plus serializer layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Name of the embedding model under test.
    pub embedding_model_name: String,

    /// Whether the context section is produced.
    pub include_context: bool,

    /// Position of the context section.
    #[serde(default)]
    pub context_position: Option<usize>,

    /// Whether the schema section is produced.
    pub include_schema: bool,

    /// Position of the schema section.
    #[serde(default)]
    pub schema_position: Option<usize>,

    /// Position of the table section.
    #[serde(default)]
    pub table_position: Option<usize>,

    /// Table section settings (None = no table section).
    #[serde(default)]
    pub table_serializer: Option<TableSerializationConfig>,
}

impl ExperimentConfig {
    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        debug!(path = %path.display(), slug = %config.slug(), "Loaded experiment config");
        Ok(config)
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Builds the serializer this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured sample size is zero.
    pub fn get_serializer(&self) -> Result<TableSerializer, ConfigError> {
        let mut builder = TableSerializerBuilder::new();

        if self.include_context {
            builder = builder.include_context(self.context_position);
        }
        if self.include_schema {
            builder = builder.include_schema(self.schema_position);
        }

        if let Some(table_serializer) = &self.table_serializer {
            builder = match table_serializer.serialization_format {
                TableFormat::Markdown => builder.with_markdown_table_processor(self.table_position),
                TableFormat::Json => builder.with_json_table_processor(self.table_position),
            };

            if let Some(strategy) = table_serializer.row_sampling_strategy {
                let rows = table_serializer
                    .row_samples_per_table
                    .unwrap_or(DEFAULT_ROWS_TO_SAMPLE);
                let config = SamplerConfig::new(rows)?.with_optional_seed(table_serializer.seed);
                builder = builder.with_row_sampler(strategy.build(config));
            }
        }

        Ok(builder.build())
    }

    /// Included section names, ordered by position.
    fn included_parts(&self) -> Vec<&'static str> {
        let mut parts: Vec<(Option<usize>, &'static str)> = [
            (self.context_position, "context", self.include_context),
            (self.schema_position, "schema", self.include_schema),
            (self.table_position, "table", self.table_serializer.is_some()),
        ]
        .into_iter()
        .filter(|(_, _, included)| *included)
        .map(|(position, name, _)| (position, name))
        .collect();
        parts.sort_by_key(|(position, _)| *position);
        parts.into_iter().map(|(_, name)| name).collect()
    }

    /// Short identifier for file names and result tables.
    ///
    /// e.g. `all_minilm_l6_v2_context_table_markdown_k-means_5_samples`.
    pub fn slug(&self) -> String {
        let mut slug = self
            .embedding_model_name
            .to_lowercase()
            .replace([' ', '.', '-'], "_");

        for part in self.included_parts() {
            slug.push('_');
            slug.push_str(part);
        }

        if let Some(table_serializer) = &self.table_serializer {
            slug.push('_');
            slug.push_str(table_serializer.serialization_format.as_str());
            if let Some(strategy) = table_serializer.row_sampling_strategy {
                slug.push('_');
                slug.push_str(strategy.as_str());
                if let Some(rows) = table_serializer.row_samples_per_table {
                    slug.push_str(&format!("_{}_samples", rows));
                }
            }
        }

        slug
    }
}

impl fmt::Display for ExperimentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Embedding model: {} | Contents: ",
            self.embedding_model_name
        )?;
        for part in self.included_parts() {
            write!(f, ">{}", part)?;
        }
        if let Some(table_serializer) = &self.table_serializer {
            write!(f, " | Format: {}", table_serializer.serialization_format)?;
            if let Some(strategy) = table_serializer.row_sampling_strategy {
                write!(f, " | Row sampling: {}", strategy)?;
                if let Some(rows) = table_serializer.row_samples_per_table {
                    write!(f, " | #Samples: {}", rows)?;
                }
            }
        }
        Ok(())
    }
}

/// Builder for an [`ExperimentConfig`] with validation.
#[derive(Debug, Clone)]
pub struct ExperimentConfigBuilder {
    config: ExperimentConfig,
    sampling_without_serializer: bool,
}

impl ExperimentConfigBuilder {
    /// Creates a builder for the given model and section flags.
    pub fn new(
        embedding_model_name: impl Into<String>,
        include_context: bool,
        include_schema: bool,
    ) -> Self {
        Self {
            config: ExperimentConfig {
                embedding_model_name: embedding_model_name.into(),
                include_context,
                context_position: None,
                include_schema,
                schema_position: None,
                table_position: None,
                table_serializer: None,
            },
            sampling_without_serializer: false,
        }
    }

    /// Sets the context section position.
    pub fn context_position(mut self, position: usize) -> Self {
        self.config.context_position = Some(position);
        self
    }

    /// Sets the schema section position.
    pub fn schema_position(mut self, position: usize) -> Self {
        self.config.schema_position = Some(position);
        self
    }

    /// Sets the table section position.
    pub fn table_position(mut self, position: usize) -> Self {
        self.config.table_position = Some(position);
        self
    }

    /// Adds a table section with the given layout, without sampling.
    pub fn table_serializer(mut self, format: TableFormat) -> Self {
        self.config.table_serializer = Some(TableSerializationConfig::new(format));
        self
    }

    fn with_table_serializer(mut self, f: impl FnOnce(&mut TableSerializationConfig)) -> Self {
        match self.config.table_serializer.as_mut() {
            Some(table_serializer) => f(table_serializer),
            None => self.sampling_without_serializer = true,
        }
        self
    }

    /// Sets the row sampling strategy. Requires a table serializer.
    pub fn row_sampling_strategy(self, strategy: SamplingStrategy) -> Self {
        self.with_table_serializer(|t| t.row_sampling_strategy = Some(strategy))
    }

    /// Sets the rows kept per table. Requires a table serializer.
    pub fn row_samples_per_table(self, rows: usize) -> Self {
        self.with_table_serializer(|t| t.row_samples_per_table = Some(rows))
    }

    /// Sets the sampling seed. Requires a table serializer.
    pub fn seed(self, seed: u64) -> Self {
        self.with_table_serializer(|t| t.seed = Some(seed))
    }

    /// Clears all row sampling settings.
    pub fn reset_row_sampler(mut self) -> Self {
        if let Some(table_serializer) = self.config.table_serializer.as_mut() {
            table_serializer.row_sampling_strategy = None;
            table_serializer.row_samples_per_table = None;
            table_serializer.seed = None;
        }
        self.sampling_without_serializer = false;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an included section has no position, or if
    /// sampling settings were given before a table serializer.
    pub fn build(&self) -> Result<ExperimentConfig, ConfigError> {
        let config = &self.config;

        if self.sampling_without_serializer {
            return Err(ConfigError::MissingTableSerializer);
        }
        if config.include_context && config.context_position.is_none() {
            return Err(missing_position("include_context", "context_position"));
        }
        if config.include_schema && config.schema_position.is_none() {
            return Err(missing_position("include_schema", "schema_position"));
        }
        if config.table_serializer.is_some() && config.table_position.is_none() {
            return Err(missing_position("table_serializer", "table_position"));
        }
        if let Some(rows) = config
            .table_serializer
            .as_ref()
            .and_then(|t| t.row_samples_per_table)
        {
            SamplerConfig::new(rows)?;
        }

        Ok(config.clone())
    }
}

fn missing_position(part: &str, field: &str) -> ConfigError {
    ConfigError::MissingPosition {
        part: part.to_string(),
        field: field.to_string(),
    }
}
