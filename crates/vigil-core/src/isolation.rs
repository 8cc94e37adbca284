//! Isolation forest over sparse TF-IDF rows.
//!
//! Outliers are isolated by fewer random axis-aligned splits than inliers.
//! `score_samples` follows the common convention of returning the negated
//! anomaly score, so values lie in [-1, 0) and lower means more anomalous.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::constants::{ISOLATION_MAX_SAMPLES, ISOLATION_SEED, ISOLATION_TREES};
use crate::tfidf::SparseVector;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

/// Average path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

fn value(row: &SparseVector, feature: usize) -> f64 {
    row.binary_search_by(|(i, _)| i.cmp(&feature))
        .map(|pos| row[pos].1)
        .unwrap_or(0.0)
}

impl IsolationForest {
    /// Fit with the default tree count, sub-sample size and seed.
    pub fn fit(rows: &[SparseVector]) -> Option<Self> {
        Self::fit_with(rows, ISOLATION_TREES, ISOLATION_MAX_SAMPLES, ISOLATION_SEED)
    }

    /// Needs at least two rows; a single point cannot be isolated.
    pub fn fit_with(
        rows: &[SparseVector],
        n_trees: usize,
        max_samples: usize,
        seed: u64,
    ) -> Option<Self> {
        if rows.len() < 2 || n_trees == 0 {
            return None;
        }
        let sample_size = max_samples.clamp(2, rows.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = SmallRng::seed_from_u64(seed);

        let trees = (0..n_trees)
            .map(|_| {
                let indices =
                    rand::seq::index::sample(&mut rng, rows.len(), sample_size).into_vec();
                build(rows, indices, 0, height_limit, &mut rng)
            })
            .collect();

        Some(Self { trees, sample_size })
    }

    /// Negated anomaly score `-2^(-E[h(x)] / c(sample_size))`.
    pub fn score_sample(&self, row: &SparseVector) -> f64 {
        let c = average_path_length(self.sample_size);
        if c <= 0.0 {
            return 0.0;
        }
        let mean_depth = self
            .trees
            .iter()
            .map(|t| path_length(t, row, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        -(2f64.powf(-mean_depth / c))
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

fn build(
    rows: &[SparseVector],
    indices: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut SmallRng,
) -> Node {
    if depth >= height_limit || indices.len() <= 1 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // Per-feature (min, max, nonzero count) over the node's rows
    let mut ranges: BTreeMap<usize, (f64, f64, usize)> = BTreeMap::new();
    for &i in &indices {
        for &(feature, w) in &rows[i] {
            let entry = ranges.entry(feature).or_insert((w, w, 0));
            entry.0 = entry.0.min(w);
            entry.1 = entry.1.max(w);
            entry.2 += 1;
        }
    }
    let candidates: Vec<(usize, f64, f64)> = ranges
        .into_iter()
        .map(|(feature, (lo, hi, count))| {
            if count < indices.len() {
                (feature, lo.min(0.0), hi.max(0.0))
            } else {
                (feature, lo, hi)
            }
        })
        .filter(|(_, lo, hi)| hi > lo)
        .collect();

    if candidates.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, lo, hi) = candidates[rng.random_range(0..candidates.len())];
    let threshold = rng.random_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| value(&rows[i], feature) < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build(rows, left, depth + 1, height_limit, rng)),
        right: Box::new(build(rows, right, depth + 1, height_limit, rng)),
    }
}

fn path_length(node: &Node, row: &SparseVector, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if value(row, *feature) < *threshold {
                path_length(left, row, depth + 1)
            } else {
                path_length(right, row, depth + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> SparseVector {
        let mut row = Vec::new();
        if x != 0.0 {
            row.push((0, x));
        }
        if y != 0.0 {
            row.push((1, y));
        }
        row
    }

    fn cluster_with_outlier() -> Vec<SparseVector> {
        let mut rows: Vec<SparseVector> = (0..40)
            .map(|i| point(0.5 + (i % 5) as f64 * 0.01, 0.5 + (i % 7) as f64 * 0.01))
            .collect();
        rows.push(point(0.0, 9.0));
        rows
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(16));
    }

    #[test]
    fn test_requires_two_rows() {
        assert!(IsolationForest::fit(&[point(1.0, 1.0)]).is_none());
        assert!(IsolationForest::fit(&[]).is_none());
    }

    #[test]
    fn test_outlier_scores_lower() {
        let rows = cluster_with_outlier();
        let forest = IsolationForest::fit(&rows).unwrap();
        let inlier = forest.score_sample(&rows[0]);
        let outlier = forest.score_sample(rows.last().unwrap());
        assert!(outlier < inlier, "outlier {outlier} should be below inlier {inlier}");
    }

    #[test]
    fn test_scores_in_range() {
        let rows = cluster_with_outlier();
        let forest = IsolationForest::fit(&rows).unwrap();
        for row in &rows {
            let s = forest.score_sample(row);
            assert!((-1.0..0.0).contains(&s), "score out of range: {s}");
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let rows = cluster_with_outlier();
        let a = IsolationForest::fit(&rows).unwrap().score_sample(&rows[3]);
        let b = IsolationForest::fit(&rows).unwrap().score_sample(&rows[3]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_rows_do_not_split() {
        let rows = vec![point(1.0, 1.0); 4];
        let forest = IsolationForest::fit_with(&rows, 10, 256, 7).unwrap();
        assert_eq!(forest.tree_count(), 10);
        let s = forest.score_sample(&rows[0]);
        assert!(s.is_finite());
    }
}
