//! Row sampling: reduce a table to a bounded number of rows.
//!
//! Serialized tables are fed to embedding models with limited context, so
//! large tables are cut down to at most `rows_to_sample` rows first. Three
//! strategies are provided:
//!
//! 1. **First** - keep the leading rows in their original order
//! 2. **Random** - seeded uniform draw without replacement
//! 3. **K-Means** - cluster the rows and keep one representative per cluster
//!
//! Every strategy returns the input unchanged when it already fits the budget.
//!
//! # Usage
//!
//! ```
//! use tableserializer::sampling::{RowSampler, SamplerConfig, SamplingStrategy};
//! use tableserializer::table::Table;
//!
//! let table = Table::from_json_str(
//!     r#"[{"k": "a", "v": 1}, {"k": "b", "v": 2}, {"k": "a", "v": 3}, {"k": "b", "v": 1}]"#,
//! )
//! .expect("valid table");
//!
//! let config = SamplerConfig::new(2).expect("positive size").with_seed(42);
//! let mut sampler = SamplingStrategy::KMeans.build(config);
//! assert_eq!(sampler.sample(&table).len(), 2);
//! ```
//!
//! # Cluster-based sampling
//!
//! The k-means strategy first drops columns that cannot separate rows
//! (identifier-like or constant), imputes missing values, one-hot encodes
//! categorical columns and then partitions the encoded rows into exactly
//! `rows_to_sample` clusters. When no informative column survives it falls
//! back to the random strategy on the original table.

pub mod cluster;
pub mod features;
pub mod kmeans;
pub mod strategies;

pub use cluster::ClusterRowSampler;
pub use features::{classify_columns, encode_features, reduce_features, ColumnKind};
pub use kmeans::{KMeans, KMeansFit};
pub use strategies::{FirstRowSampler, RandomRowSampler};

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::SamplerError;
use crate::table::Table;

/// Default number of rows kept per table.
pub const DEFAULT_ROWS_TO_SAMPLE: usize = 10;

/// Immutable sampler parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    rows_to_sample: usize,
    seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            rows_to_sample: DEFAULT_ROWS_TO_SAMPLE,
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Creates a configuration keeping at most `rows_to_sample` rows.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::InvalidSampleSize`] when `rows_to_sample` is zero.
    pub fn new(rows_to_sample: usize) -> Result<Self, SamplerError> {
        if rows_to_sample == 0 {
            return Err(SamplerError::InvalidSampleSize(rows_to_sample));
        }
        Ok(Self {
            rows_to_sample,
            seed: None,
        })
    }

    /// Sets a random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets or clears the random seed.
    pub fn with_optional_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Maximum number of rows a sampler returns.
    pub fn rows_to_sample(&self) -> usize {
        self.rows_to_sample
    }

    /// Configured seed (None = non-deterministic).
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Creates a fresh random number generator from the configured seed.
    pub(crate) fn create_rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }
}

/// Reduces a table to at most `rows_to_sample` rows.
///
/// Implementors only provide [`RowSampler::select_rows`], which is called
/// when the table is larger than the budget. The provided
/// [`RowSampler::sample`] handles the short-circuit for small tables.
///
/// Samplers may own a random generator that advances across calls, so
/// `select_rows` takes `&mut self`. Share one instance across threads only
/// behind external synchronization.
pub trait RowSampler: Send + fmt::Debug {
    /// Parameters this sampler was built with.
    fn config(&self) -> &SamplerConfig;

    /// Picks row indices for a table with more than `rows_to_sample` rows.
    /// The returned order is the output order.
    fn select_rows(&mut self, table: &Table) -> Vec<usize>;

    /// Samples the table, returning it unchanged when it already fits.
    fn sample(&mut self, table: &Table) -> Table {
        if table.len() <= self.config().rows_to_sample() {
            return table.clone();
        }
        let indices = self.select_rows(table);
        table.select(&indices)
    }
}

/// Available row sampling strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingStrategy {
    /// Leading rows in table order.
    #[serde(rename = "first")]
    First,
    /// Seeded uniform draw without replacement.
    #[serde(rename = "random")]
    Random,
    /// One representative per k-means cluster.
    #[serde(rename = "k-means")]
    KMeans,
}

impl SamplingStrategy {
    /// Builds a sampler for this strategy.
    pub fn build(self, config: SamplerConfig) -> Box<dyn RowSampler> {
        match self {
            SamplingStrategy::First => Box::new(FirstRowSampler::new(config)),
            SamplingStrategy::Random => Box::new(RandomRowSampler::new(config)),
            SamplingStrategy::KMeans => Box::new(ClusterRowSampler::new(config)),
        }
    }

    /// Name used in configuration files and experiment slugs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingStrategy::First => "first",
            SamplingStrategy::Random => "random",
            SamplingStrategy::KMeans => "k-means",
        }
    }
}

impl fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
