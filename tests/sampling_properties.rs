//! Behavioural tests for the row samplers.
//!
//! These exercise the public API only: threshold behaviour shared by every
//! strategy, reproducibility under a fixed seed, the fallback from clustering
//! to random sampling, and the representative-per-cluster guarantee.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tableserializer::sampling::{
    encode_features, reduce_features, ClusterRowSampler, FirstRowSampler, KMeans,
    RandomRowSampler, RowSampler, SamplerConfig, SamplingStrategy,
};
use tableserializer::sampling::features::ReducedColumn;
use tableserializer::table::{Table, Value};

const ALL_STRATEGIES: [SamplingStrategy; 3] = [
    SamplingStrategy::First,
    SamplingStrategy::Random,
    SamplingStrategy::KMeans,
];

fn config(rows: usize, seed: u64) -> SamplerConfig {
    SamplerConfig::new(rows)
        .expect("rows_to_sample must be positive")
        .with_seed(seed)
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// 12 rows: unique id, two balanced categories, a score with one gap.
fn scored_table() -> Table {
    let scores = [
        Some(1.0),
        Some(2.0),
        Some(1.0),
        Some(3.0),
        None,
        Some(2.0),
        Some(8.0),
        Some(9.0),
        Some(8.0),
        Some(9.0),
        Some(8.0),
        Some(7.0),
    ];
    let rows = scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            let category = if i < 6 { "A" } else { "B" };
            vec![
                Value::from(i as i64 + 1),
                Value::from(category),
                Value::from(*score),
            ]
        })
        .collect();
    Table::new(columns(&["id", "category", "score"]), rows).expect("valid table")
}

/// Rows that differ only in a unique id.
fn id_only_variation(rows: usize) -> Table {
    Table::new(
        columns(&["id", "city", "year"]),
        (0..rows)
            .map(|i| vec![Value::from(i as i64), Value::from("Oslo"), Value::from(2024)])
            .collect(),
    )
    .expect("valid table")
}

fn id_set(table: &Table) -> HashSet<String> {
    table.rows().iter().map(|row| row[0].to_string()).collect()
}

#[test]
fn test_small_table_unchanged_for_every_strategy() {
    let table = scored_table().select(&[0, 1, 2, 3, 4]);
    for strategy in ALL_STRATEGIES {
        let mut sampler = strategy.build(config(10, 42));
        assert_eq!(
            sampler.sample(&table),
            table,
            "{} should return small tables unchanged",
            strategy
        );
    }
}

#[test]
fn test_table_at_threshold_unchanged() {
    let table = scored_table();
    for strategy in ALL_STRATEGIES {
        let mut sampler = strategy.build(config(table.len(), 1));
        assert_eq!(sampler.sample(&table), table);
    }
}

#[test]
fn test_first_rows_in_order() {
    let table = scored_table();
    let sampled = FirstRowSampler::new(config(4, 0)).sample(&table);
    assert_eq!(sampled, table.select(&[0, 1, 2, 3]));
}

#[test]
fn test_random_rows_distinct_and_reproducible() {
    let table = scored_table();

    let first = RandomRowSampler::new(config(5, 42)).sample(&table);
    let second = RandomRowSampler::new(config(5, 42)).sample(&table);

    assert_eq!(first.len(), 5);
    assert_eq!(id_set(&first).len(), 5);
    assert_eq!(first, second);
}

#[test]
fn test_random_seeds_differ_on_large_input() {
    let table = id_only_variation(500);
    let a = RandomRowSampler::new(config(25, 1)).sample(&table);
    let b = RandomRowSampler::new(config(25, 2)).sample(&table);
    assert_ne!(a, b);
}

#[test]
fn test_scored_table_feature_reduction() {
    let reduced = reduce_features(&scored_table());

    let names: Vec<&str> = reduced.iter().map(ReducedColumn::name).collect();
    assert_eq!(names, vec!["category", "score"], "id should be dropped");

    match &reduced[1] {
        ReducedColumn::Numeric { values, .. } => {
            // 8.0 is the most frequent score
            assert_eq!(values[4], 8.0);
        }
        other => panic!("score should stay numeric, got {:?}", other),
    }

    let features = encode_features(&reduced);
    // score plus a single indicator for category "B"
    assert_eq!(features.dim(), (12, 2));
}

#[test]
fn test_cluster_representatives_one_per_cluster() {
    let table = scored_table();
    let sampled = ClusterRowSampler::new(config(3, 42)).sample(&table);

    assert_eq!(sampled.len(), 3);
    assert_eq!(sampled.columns(), table.columns());

    // Recompute the partition the sampler uses for this seed.
    let features = encode_features(&reduce_features(&table));
    let fit = KMeans::new(3).fit(&features, &mut ChaCha8Rng::seed_from_u64(42));
    assert!(fit.cluster_sizes().iter().all(|&size| size > 0));

    for (cluster, row) in sampled.rows().iter().enumerate() {
        let original = table
            .rows()
            .iter()
            .position(|r| r == row)
            .expect("sampled row comes from the input");
        assert_eq!(fit.labels[original], cluster, "rows are ordered by cluster id");
    }
}

#[test]
fn test_cluster_sampling_deterministic() {
    let table = scored_table();
    for _ in 0..3 {
        assert_eq!(
            ClusterRowSampler::new(config(3, 42)).sample(&table),
            ClusterRowSampler::new(config(3, 42)).sample(&table)
        );
    }
}

#[test]
fn test_cluster_sampling_covers_categories() {
    // Three categories, four rows each: one representative per category.
    let rows = (0..12)
        .map(|i| {
            let category = ["red", "green", "blue"][i % 3];
            vec![Value::from(i as i64), Value::from(category)]
        })
        .collect();
    let table = Table::new(columns(&["id", "color"]), rows).expect("valid table");

    let sampled = ClusterRowSampler::new(config(3, 7)).sample(&table);
    let colors: HashSet<String> = sampled.rows().iter().map(|r| r[1].to_string()).collect();
    assert_eq!(colors.len(), 3);
}

#[test]
fn test_cluster_sampling_tops_up_when_points_repeat() {
    // Only two distinct feature vectors, four rows requested.
    let rows = (0..10)
        .map(|i| {
            let kind = if i % 2 == 0 { "even" } else { "odd" };
            vec![Value::from(i as i64), Value::from(kind)]
        })
        .collect();
    let table = Table::new(columns(&["id", "kind"]), rows).expect("valid table");

    let sampled = ClusterRowSampler::new(config(4, 3)).sample(&table);
    assert_eq!(sampled.len(), 4);
    assert_eq!(id_set(&sampled).len(), 4, "no row is picked twice");
}

#[test]
fn test_identifier_only_falls_back_to_random() {
    let table = Table::new(
        columns(&["uuid"]),
        (0..20)
            .map(|i| vec![Value::from(format!("row-{}", i))])
            .collect(),
    )
    .expect("valid table");

    let clustered = ClusterRowSampler::new(config(4, 42)).sample(&table);
    let random = RandomRowSampler::new(config(4, 42)).sample(&table);
    assert_eq!(clustered, random);
}

#[test]
fn test_constant_only_falls_back_to_random() {
    let table = Table::new(
        columns(&["a", "b"]),
        (0..9)
            .map(|_| vec![Value::from("same"), Value::Null])
            .collect(),
    )
    .expect("valid table");

    let clustered = ClusterRowSampler::new(config(3, 5)).sample(&table);
    let random = RandomRowSampler::new(config(3, 5)).sample(&table);
    assert_eq!(clustered.len(), 3);
    assert_eq!(clustered, random);
}

#[test]
fn test_eight_rows_unique_id_falls_back() {
    let table = id_only_variation(8);

    let clustered = SamplingStrategy::KMeans.build(config(3, 42)).sample(&table);
    let random = SamplingStrategy::Random.build(config(3, 42)).sample(&table);
    assert_eq!(clustered.len(), 3);
    assert_eq!(clustered, random);
}

#[test]
fn test_single_representative() {
    let table = scored_table();
    let sampled = ClusterRowSampler::new(config(1, 9)).sample(&table);
    assert_eq!(sampled.len(), 1);
}

#[test]
fn test_input_table_not_mutated() {
    let table = scored_table();
    let before = table.clone();
    for strategy in ALL_STRATEGIES {
        let _ = strategy.build(config(3, 11)).sample(&table);
    }
    assert_eq!(table, before);
}

#[test]
fn test_cluster_sampling_with_huge_magnitudes() {
    let table = Table::from_json_str(
        r#"[
            {"id": 1, "x": 1e300, "c": "a"},
            {"id": 2, "x": -1e300, "c": "b"},
            {"id": 3, "x": 1e300, "c": "a"},
            {"id": 4, "x": 5, "c": "b"},
            {"id": 5, "x": 5, "c": "a"}
        ]"#,
    )
    .expect("valid table");

    for rows in [2, 3, 4] {
        for seed in 0..10 {
            let sampled = ClusterRowSampler::new(config(rows, seed)).sample(&table);
            assert_eq!(sampled.len(), rows);
            assert_eq!(id_set(&sampled).len(), rows);
        }
    }
}

#[test]
fn test_cluster_sampling_with_alternating_extremes() {
    let rows = (0..10)
        .map(|i| {
            let x = if i % 2 == 0 { 1e200 } else { -1e200 };
            vec![Value::from(i as i64), Value::from(x)]
        })
        .collect();
    let table = Table::new(columns(&["id", "x"]), rows).expect("valid table");

    for seed in 0..10 {
        let sampled = ClusterRowSampler::new(config(4, seed)).sample(&table);
        assert_eq!(sampled.len(), 4);
        assert_eq!(id_set(&sampled).len(), 4);
    }
}

#[test]
fn test_cluster_sampling_with_nan_values() {
    let xs = [f64::NAN, 1.0, f64::NAN, 2.0, 3.0, f64::NAN, 1.0, 2.0, 3.0, 4.0];
    let rows = xs
        .iter()
        .enumerate()
        .map(|(i, &x)| vec![Value::from(i as i64), Value::from(x)])
        .collect();
    let table = Table::new(columns(&["id", "x"]), rows).expect("valid table");

    let sampled = ClusterRowSampler::new(config(3, 1)).sample(&table);
    assert_eq!(sampled.len(), 3);
    assert_eq!(id_set(&sampled).len(), 3);
}

#[test]
fn test_number_and_text_codes_are_distinct_groups() {
    // 1 and "1" look alike when printed but are separate categories.
    let rows = (0..8)
        .map(|i| {
            let code = if i % 2 == 0 { Value::from(1) } else { Value::from("1") };
            vec![Value::from(i as i64), code]
        })
        .collect();
    let table = Table::new(columns(&["id", "code"]), rows).expect("valid table");

    let features = encode_features(&reduce_features(&table));
    assert_eq!(features.dim(), (8, 1));

    let sampled = ClusterRowSampler::new(config(2, 5)).sample(&table);
    assert_eq!(sampled.len(), 2);
    let codes: HashSet<bool> = sampled
        .rows()
        .iter()
        .map(|row| matches!(row[1], Value::Text(_)))
        .collect();
    assert_eq!(codes.len(), 2, "one row from each group");
}
