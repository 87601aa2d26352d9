//! Command-line interface for tableserializer.
//!
//! Provides commands for sampling tables, serializing them from an
//! experiment configuration, and describing configurations.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli, Commands};
