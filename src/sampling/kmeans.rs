//! Seeded k-means partitioning.
//!
//! Lloyd's algorithm with k-means++ initialisation. Clusters that end up
//! empty during an iteration are re-seeded with the point farthest from its
//! current centroid, so every cluster is populated whenever the data has at
//! least `n_clusters` distinct points.
//!
//! Non-finite features are treated as zero, and matrices whose magnitudes
//! would overflow a squared distance are rescaled first. Scaling by a
//! constant leaves the partition unchanged.

use ndarray::{Array2, ArrayView1};
use rand::RngExt;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Default iteration cap per initialisation.
const DEFAULT_MAX_ITER: usize = 300;

/// Default relative convergence tolerance.
const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Largest feature magnitude used as-is; above it squared distances can overflow.
const MAX_UNSCALED_MAGNITUDE: f64 = 1e100;

/// Centroid-based partitioner.
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Number of clusters to produce.
    n_clusters: usize,

    /// Maximum Lloyd iterations per initialisation.
    max_iter: usize,

    /// Number of independent initialisations; the lowest inertia wins.
    n_init: usize,

    /// Convergence tolerance, relative to the mean feature variance.
    tolerance: f64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Cluster id in `0..n_clusters` for every input row.
    pub labels: Vec<usize>,

    /// Final centroids, one row per cluster.
    pub centroids: Array2<f64>,

    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,

    /// Lloyd iterations used by the winning initialisation.
    pub iterations: usize,
}

impl KMeansFit {
    /// Number of points assigned to each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.nrows()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

impl KMeans {
    /// Creates a partitioner for `n_clusters` clusters (at least one).
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters: n_clusters.max(1),
            max_iter: DEFAULT_MAX_ITER,
            n_init: 1,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Sets the number of initialisations.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Partitions the rows of `data`.
    ///
    /// All randomness comes from `rng`, so a seeded generator gives a
    /// reproducible result.
    pub fn fit(&self, data: &Array2<f64>, rng: &mut ChaCha8Rng) -> KMeansFit {
        let k = self.n_clusters;
        let data = &condition(data);

        if data.nrows() == 0 {
            return KMeansFit {
                labels: Vec::new(),
                centroids: Array2::zeros((k, data.ncols())),
                inertia: 0.0,
                iterations: 0,
            };
        }

        let tolerance = self.tolerance * mean_variance(data);

        let mut best: Option<KMeansFit> = None;
        for run in 0..self.n_init {
            let fit = self.fit_once(data, rng, tolerance);
            trace!(run, inertia = fit.inertia, iterations = fit.iterations, "k-means run finished");
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.unwrap_or_else(|| self.fit_once(data, rng, tolerance))
    }

    fn fit_once(&self, data: &Array2<f64>, rng: &mut ChaCha8Rng, tolerance: f64) -> KMeansFit {
        let k = self.n_clusters;
        let mut centroids = init_plus_plus(data, k, rng);
        let mut labels = vec![0; data.nrows()];
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            assign_labels(data, &centroids, &mut labels);
            relocate_empty_clusters(data, &mut centroids, &mut labels);

            let updated = compute_centroids(data, &labels, &centroids);
            let shift: f64 = updated
                .rows()
                .into_iter()
                .zip(centroids.rows())
                .map(|(new, old)| squared_distance(new, old))
                .sum();
            centroids = updated;

            if shift <= tolerance {
                break;
            }
        }

        // Labels must match the final centroids.
        assign_labels(data, &centroids, &mut labels);
        relocate_empty_clusters(data, &mut centroids, &mut labels);

        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| squared_distance(data.row(i), centroids.row(label)))
            .sum();

        KMeansFit {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

/// Replaces non-finite entries with zero and rescales oversized matrices
/// into `[-1, 1]`.
fn condition(data: &Array2<f64>) -> Array2<f64> {
    let mut conditioned = data.mapv(|v| if v.is_finite() { v } else { 0.0 });
    let max_abs = conditioned.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if max_abs > MAX_UNSCALED_MAGNITUDE {
        trace!(max_abs, "Rescaling features before clustering");
        conditioned.mapv_inplace(|v| v / max_abs);
    }
    conditioned
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Mean of the per-feature variances.
fn mean_variance(data: &Array2<f64>) -> f64 {
    if data.nrows() == 0 || data.ncols() == 0 {
        return 0.0;
    }
    let n = data.nrows() as f64;
    let total: f64 = data
        .columns()
        .into_iter()
        .map(|column| {
            let mean = column.sum() / n;
            column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
        })
        .sum();
    total / data.ncols() as f64
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the closest chosen centroid.
fn init_plus_plus(data: &Array2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));

    let first = rng.random_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f64> = (0..n)
        .map(|i| squared_distance(data.row(i), centroids.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total.is_finite() && total > 0.0 {
            let mut target = rng.random_range(0.0..total);
            let mut pick = closest.iter().rposition(|&d| d > 0.0).unwrap_or(0);
            for (i, &d) in closest.iter().enumerate() {
                if target < d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            // Every point already coincides with a centroid.
            // An overflowing total lands here too.
            rng.random_range(0..n)
        };

        centroids.row_mut(c).assign(&data.row(chosen));
        for (i, dist) in closest.iter_mut().enumerate() {
            *dist = dist.min(squared_distance(data.row(i), centroids.row(c)));
        }
    }

    centroids
}

/// Assigns each point to its nearest centroid, lowest id on ties.
fn assign_labels(data: &Array2<f64>, centroids: &Array2<f64>, labels: &mut [usize]) {
    for (i, label) in labels.iter_mut().enumerate() {
        let point = data.row(i);
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (c, centroid) in centroids.rows().into_iter().enumerate() {
            let dist = squared_distance(point, centroid);
            if dist < best_dist {
                best_dist = dist;
                best = c;
            }
        }
        *label = best;
    }
}

/// Moves the farthest point of a shared cluster into each empty cluster.
///
/// Points equal to their centroid are never moved, so clusters stay empty
/// when the data has fewer distinct points than clusters.
fn relocate_empty_clusters(data: &Array2<f64>, centroids: &mut Array2<f64>, labels: &mut [usize]) {
    let mut sizes = vec![0usize; centroids.nrows()];
    for &label in labels.iter() {
        sizes[label] += 1;
    }

    for cluster in 0..sizes.len() {
        if sizes[cluster] > 0 {
            continue;
        }

        let candidate = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| sizes[label] > 1)
            .map(|(i, &label)| (i, squared_distance(data.row(i), centroids.row(label))))
            .filter(|(_, dist)| *dist > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((point, _)) = candidate {
            sizes[labels[point]] -= 1;
            labels[point] = cluster;
            sizes[cluster] = 1;
            centroids.row_mut(cluster).assign(&data.row(point));
        }
    }
}

/// Mean of each cluster's points. Empty clusters keep their previous centroid.
fn compute_centroids(data: &Array2<f64>, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; previous.nrows()];

    for (i, &label) in labels.iter().enumerate() {
        let mut row = sums.row_mut(label);
        row += &data.row(i);
        counts[label] += 1;
    }

    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            sums.row_mut(c).mapv_inplace(|v| v / count as f64);
        } else {
            sums.row_mut(c).assign(&previous.row(c));
        }
    }

    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn two_blobs() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.2],
            [0.2, 0.1],
            [10.0, 10.0],
            [10.1, 9.9],
            [9.8, 10.2],
        ]
    }

    #[test]
    fn test_separates_blobs() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let fit = KMeans::new(2).fit(&two_blobs(), &mut rng);

        assert_eq!(fit.labels.len(), 6);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[1], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[4], fit.labels[5]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert_eq!(fit.cluster_sizes(), vec![3, 3]);
    }

    #[test]
    fn test_single_cluster() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let fit = KMeans::new(1).fit(&two_blobs(), &mut rng);
        assert!(fit.labels.iter().all(|&l| l == 0));
        assert!((fit.centroids[[0, 0]] - 5.033333).abs() < 1e-4);
    }

    #[test]
    fn test_k_equals_distinct_points() {
        let data = array![[0.0], [1.0], [2.0], [0.0], [1.0], [2.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let fit = KMeans::new(3).fit(&data, &mut rng);

        assert!(fit.cluster_sizes().iter().all(|&s| s == 2));
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_more_clusters_than_distinct_points() {
        let data = array![[1.0], [1.0], [5.0], [5.0], [5.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let fit = KMeans::new(4).fit(&data, &mut rng);

        assert_eq!(fit.labels.len(), 5);
        assert!(fit.labels.iter().all(|&l| l < 4));
        let populated = fit.cluster_sizes().iter().filter(|&&s| s > 0).count();
        assert_eq!(populated, 2);
    }

    #[test]
    fn test_reproducible_with_seed() {
        let data = two_blobs();
        let fit1 = KMeans::new(3)
            .with_n_init(3)
            .fit(&data, &mut ChaCha8Rng::seed_from_u64(5));
        let fit2 = KMeans::new(3)
            .with_n_init(3)
            .fit(&data, &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(fit1.labels, fit2.labels);
        assert_eq!(fit1.inertia, fit2.inertia);
    }

    #[test]
    fn test_empty_input() {
        let data = Array2::<f64>::zeros((0, 2));
        let fit = KMeans::new(3).fit(&data, &mut ChaCha8Rng::seed_from_u64(0));
        assert!(fit.labels.is_empty());
        assert_eq!(fit.centroids.dim(), (3, 2));
    }

    #[test]
    fn test_zero_width_features() {
        let data = Array2::<f64>::zeros((4, 0));
        let fit = KMeans::new(2).fit(&data, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(fit.labels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_huge_magnitudes_do_not_overflow() {
        let data = array![
            [1e300, 0.0],
            [-1e300, 1.0],
            [1e300, 0.0],
            [5.0, 1.0],
            [5.0, 0.0],
            [-1e200, 1.0],
        ];
        for seed in 0..20 {
            let fit = KMeans::new(3).fit(&data, &mut ChaCha8Rng::seed_from_u64(seed));
            assert_eq!(fit.labels.len(), 6);
            assert!(fit.labels.iter().all(|&l| l < 3));
            assert!(fit.inertia.is_finite());
            assert!(fit.centroids.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_huge_blobs_still_separate() {
        let data = two_blobs().mapv(|v| v * 1e200);
        let fit = KMeans::new(2).fit(&data, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[0], fit.labels[2]);
        assert_ne!(fit.labels[0], fit.labels[3]);
    }

    #[test]
    fn test_non_finite_features_treated_as_zero() {
        let data = array![
            [f64::NAN, 1.0],
            [f64::INFINITY, 0.0],
            [f64::NEG_INFINITY, 1.0],
            [3.0, 0.0],
        ];
        let fit = KMeans::new(2).fit(&data, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(fit.labels.iter().all(|&l| l < 2));
        assert!(fit.inertia.is_finite());
        assert!(fit.cluster_sizes().iter().all(|&s| s > 0));
    }
}
