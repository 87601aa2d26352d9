//! Error types for tableserializer operations.
//!
//! Defines error types for the major subsystems:
//! - Table construction and JSON loading
//! - Row sampler configuration
//! - Serialization (schema rendering, metadata lookup)
//! - Experiment configuration loading and validation

use thiserror::Error;

/// Errors that can occur while building a table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Row {row} has {found} values but the table has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Record {row} contains unknown column '{column}'")]
    UnknownColumn { row: usize, column: String },

    #[error("Unsupported table layout: {0}")]
    UnsupportedLayout(String),

    #[error("Unsupported cell value in column '{column}': {message}")]
    UnsupportedValue { column: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when constructing a row sampler.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("Invalid sample size {0}: rows_to_sample must be a positive integer")]
    InvalidSampleSize(usize),
}

/// Errors that can occur while serializing a table to text.
#[derive(Debug, Error)]
pub enum SerializerError {
    #[error("Metadata field '{0}' is required to name the table but was not provided")]
    MissingMetadataField(String),

    #[error("Metadata field '{field}' must be a string, got {found}")]
    InvalidMetadataField { field: String, found: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading or validating an experiment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{field}' must be specified when '{part}' is included")]
    MissingPosition { part: String, field: String },

    #[error("Row sampling settings require a table serializer to be configured")]
    MissingTableSerializer,

    #[error("Invalid sampler configuration: {0}")]
    Sampler(#[from] SamplerError),

    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
