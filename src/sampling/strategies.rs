//! Positional and uniform row samplers.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::table::Table;

use super::{RowSampler, SamplerConfig};

/// Keeps the first `rows_to_sample` rows in table order.
#[derive(Debug, Clone)]
pub struct FirstRowSampler {
    config: SamplerConfig,
}

impl FirstRowSampler {
    /// Creates a first-rows sampler. The seed is ignored.
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }
}

impl RowSampler for FirstRowSampler {
    fn config(&self) -> &SamplerConfig {
        &self.config
    }

    fn select_rows(&mut self, table: &Table) -> Vec<usize> {
        (0..self.config.rows_to_sample().min(table.len())).collect()
    }
}

/// Draws `rows_to_sample` distinct rows uniformly at random.
///
/// The generator is seeded once at construction and advances on every call,
/// so two samplers built with the same seed produce the same sequence of
/// samples.
#[derive(Debug, Clone)]
pub struct RandomRowSampler {
    config: SamplerConfig,

    /// Owned generator, advanced by every draw.
    rng: ChaCha8Rng,
}

impl RandomRowSampler {
    /// Creates a random sampler seeded from the configuration.
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            rng: config.create_rng(),
            config,
        }
    }
}

impl RowSampler for RandomRowSampler {
    fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Indices come back in draw order, not table order.
    fn select_rows(&mut self, table: &Table) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..table.len()).collect();
        indices.shuffle(&mut self.rng);
        indices.truncate(self.config.rows_to_sample());
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use std::collections::HashSet;

    fn numbered_table(rows: usize) -> Table {
        Table::new(
            vec!["n".to_string(), "label".to_string()],
            (0..rows)
                .map(|i| vec![Value::from(i as i64), Value::from(format!("row-{}", i))])
                .collect(),
        )
        .expect("valid table")
    }

    fn config(rows: usize, seed: u64) -> SamplerConfig {
        SamplerConfig::new(rows).expect("positive").with_seed(seed)
    }

    #[test]
    fn test_first_sampler_takes_prefix() {
        let table = numbered_table(20);
        let mut sampler = FirstRowSampler::new(config(5, 0));
        let result = sampler.sample(&table);
        assert_eq!(result, table.select(&[0, 1, 2, 3, 4]));
    }

    #[test]
    fn test_first_sampler_small_table_unchanged() {
        let table = numbered_table(3);
        let mut sampler = FirstRowSampler::new(config(10, 0));
        assert_eq!(sampler.sample(&table), table);
    }

    #[test]
    fn test_random_sampler_distinct_rows() {
        let table = numbered_table(50);
        let mut sampler = RandomRowSampler::new(config(10, 42));
        let indices = sampler.select_rows(&table);
        assert_eq!(indices.len(), 10);
        let unique: HashSet<_> = indices.iter().collect();
        assert_eq!(unique.len(), 10, "All selected rows should be distinct");
        assert!(indices.iter().all(|&i| i < 50));
    }

    #[test]
    fn test_random_sampler_reproducible() {
        let table = numbered_table(50);
        let mut sampler1 = RandomRowSampler::new(config(10, 42));
        let mut sampler2 = RandomRowSampler::new(config(10, 42));
        assert_eq!(
            sampler1.sample(&table),
            sampler2.sample(&table),
            "Results should be reproducible with same seed"
        );
    }

    #[test]
    fn test_random_sampler_different_seeds_differ() {
        let table = numbered_table(200);
        let mut sampler1 = RandomRowSampler::new(config(20, 1));
        let mut sampler2 = RandomRowSampler::new(config(20, 2));
        assert_ne!(sampler1.sample(&table), sampler2.sample(&table));
    }

    #[test]
    fn test_random_sampler_state_advances() {
        let table = numbered_table(200);
        let mut sampler = RandomRowSampler::new(config(20, 9));
        let first = sampler.sample(&table);
        let second = sampler.sample(&table);
        assert_ne!(first, second);
    }

    #[test]
    fn test_random_sampler_small_table_unchanged() {
        let table = numbered_table(5);
        let mut sampler = RandomRowSampler::new(config(10, 3));
        assert_eq!(sampler.sample(&table), table);
    }
}
