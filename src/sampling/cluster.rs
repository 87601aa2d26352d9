//! Cluster-representative row sampling.
//!
//! Rows are partitioned into `rows_to_sample` k-means clusters over their
//! reduced and encoded features, then one row is drawn from each cluster.

use rand::RngExt;
use rand_chacha::ChaCha8Rng;
use std::cmp::Reverse;
use tracing::debug;

use crate::table::Table;

use super::features::{encode_features, reduce_features};
use super::kmeans::KMeans;
use super::strategies::RandomRowSampler;
use super::{RowSampler, SamplerConfig};

/// Selects one representative row per k-means cluster.
///
/// Algorithm:
/// 1. Drop identifier-like and constant columns, impute missing values
/// 2. One-hot encode the remaining categorical columns
/// 3. Partition the rows into `rows_to_sample` clusters
/// 4. Draw one row uniformly from each cluster, in cluster id order
///
/// If no informative column survives step 1, clustering carries no signal
/// and the sampler behaves exactly like a freshly built
/// [`RandomRowSampler`] with the same configuration.
#[derive(Debug, Clone)]
pub struct ClusterRowSampler {
    config: SamplerConfig,

    /// Number of k-means initialisations per call.
    n_init: usize,

    /// Generator for representative draws, advanced by every call.
    rng: ChaCha8Rng,
}

impl ClusterRowSampler {
    /// Creates a cluster sampler seeded from the configuration.
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            n_init: 1,
            rng: config.create_rng(),
            config,
        }
    }

    /// Sets how many k-means initialisations are tried per call.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }
}

impl RowSampler for ClusterRowSampler {
    fn config(&self) -> &SamplerConfig {
        &self.config
    }

    fn select_rows(&mut self, table: &Table) -> Vec<usize> {
        let n_clusters = self.config.rows_to_sample();

        let reduced = reduce_features(table);
        if reduced.is_empty() {
            debug!(
                rows = table.len(),
                "No informative columns left, falling back to random sampling"
            );
            return RandomRowSampler::new(self.config).select_rows(table);
        }

        let features = encode_features(&reduced);
        debug!(
            rows = features.nrows(),
            features = features.ncols(),
            clusters = n_clusters,
            "Clustering encoded rows"
        );

        // Partitioning is re-seeded on every call; only the representative
        // draw advances the owned generator.
        let mut kmeans_rng = self.config.create_rng();
        let fit = KMeans::new(n_clusters)
            .with_n_init(self.n_init)
            .fit(&features, &mut kmeans_rng);

        pick_representatives(&fit.labels, n_clusters, &mut self.rng)
    }
}

/// Draws one row per cluster, in ascending cluster id order.
///
/// Empty clusters contribute nothing in the first pass. The shortfall is then
/// filled from the clusters with the most rows not yet chosen (lowest id on
/// ties), so the result has `n_clusters` distinct rows whenever `labels` has
/// at least that many entries.
pub fn pick_representatives(
    labels: &[usize],
    n_clusters: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<usize> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_clusters];
    for (row, &label) in labels.iter().enumerate() {
        members[label].push(row);
    }

    let mut selected = Vec::with_capacity(n_clusters);
    for cluster in members.iter_mut().filter(|m| !m.is_empty()) {
        let pick = rng.random_range(0..cluster.len());
        selected.push(cluster.swap_remove(pick));
    }

    if selected.len() < n_clusters {
        debug!(
            populated = selected.len(),
            requested = n_clusters,
            "Empty clusters, topping up from the largest clusters"
        );
    }

    while selected.len() < n_clusters {
        let Some(largest) = members
            .iter_mut()
            .filter(|m| !m.is_empty())
            .min_by_key(|m| Reverse(m.len()))
        else {
            break;
        };
        let pick = rng.random_range(0..largest.len());
        selected.push(largest.swap_remove(pick));
    }

    selected
}
