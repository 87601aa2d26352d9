//! tableserializer: Table serialization for text embedding models.
//!
//! This library flattens tables into text, optionally augmented with
//! contextual metadata and schema information, and optionally reduced to a
//! bounded number of representative rows first.

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod preprocess;
pub mod processor;
pub mod sampling;
pub mod schema;
pub mod serializer;
pub mod table;

// Re-export commonly used types
pub use config::{ExperimentConfig, ExperimentConfigBuilder, TableSerializationConfig};
pub use error::{ConfigError, SamplerError, SerializerError, TableError};
pub use sampling::{RowSampler, SamplerConfig, SamplingStrategy};
pub use serializer::{TableSerializer, TableSerializerBuilder};
pub use table::{Table, Value};
