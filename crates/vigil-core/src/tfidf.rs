//! TF-IDF vector space rebuilt from scratch over a document set.
//!
//! Raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1`, rows
//! L2-normalised. Vocabulary is relative to the documents passed in, so
//! vectors from different fits are not comparable.

use std::collections::{BTreeMap, HashMap};

use crate::constants::EPSILON;
use crate::tokenizer::tokenize;

/// Sparse row: `(term index, weight)` pairs sorted by term index.
pub type SparseVector = Vec<(usize, f64)>;

pub struct VectorSpace {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    rows: Vec<SparseVector>,
}

impl VectorSpace {
    /// Fit over `documents`. Returns `None` when no document contributes a
    /// single term (empty vocabulary).
    pub fn fit(documents: &[&str]) -> Option<Self> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();

        // Sorted vocabulary keeps term indexes deterministic
        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&str> = tokens.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *df.entry(term).or_default() += 1;
            }
        }
        if df.is_empty() {
            return None;
        }

        let n = documents.len() as f64;
        let vocabulary: Vec<String> = df.keys().map(|t| t.to_string()).collect();
        let idf: Vec<f64> = df
            .values()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();
        let index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let rows = tokenized
            .iter()
            .map(|tokens| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for t in tokens {
                    *counts.entry(index[t.as_str()]).or_default() += 1.0;
                }
                let mut row: SparseVector =
                    counts.into_iter().map(|(i, c)| (i, c * idf[i])).collect();
                let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > EPSILON {
                    for (_, w) in &mut row {
                        *w /= norm;
                    }
                }
                row
            })
            .collect();

        Some(Self {
            vocabulary,
            idf,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary
            .binary_search_by(|t| t.as_str().cmp(term))
            .ok()
            .map(|i| self.idf[i])
    }

    pub fn row(&self, i: usize) -> &SparseVector {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }
}

/// Cosine similarity of two sparse rows. Zero when either row is empty.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let mut dot = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    let norm_a = a.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    let denom = norm_a * norm_b;
    if denom < EPSILON { 0.0 } else { dot / denom }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_vocabulary_is_none() {
        assert!(VectorSpace::fit(&["", "the and of", "a"]).is_none());
        assert!(VectorSpace::fit(&[]).is_none());
    }

    #[test]
    fn test_rows_are_unit_length() {
        let space = VectorSpace::fit(&["reveal source code", "source code secrets", ""]).unwrap();
        assert_eq!(space.len(), 3);
        for row in &space.rows()[..2] {
            let norm: f64 = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
        }
        assert!(space.row(2).is_empty());
    }

    #[test]
    fn test_smoothed_idf() {
        let space = VectorSpace::fit(&["alpha beta", "alpha gamma"]).unwrap();
        // alpha in both docs: ln(3/3) + 1 = 1
        assert_relative_eq!(space.idf("alpha").unwrap(), 1.0, epsilon = 1e-12);
        // beta in one doc: ln(3/2) + 1
        assert_relative_eq!(
            space.idf("beta").unwrap(),
            (1.5f64).ln() + 1.0,
            epsilon = 1e-12
        );
        assert!(space.idf("missing").is_none());
    }

    #[test]
    fn test_identical_documents_similarity_one() {
        let space = VectorSpace::fit(&["trust me completely", "trust me completely"]).unwrap();
        assert_relative_eq!(
            cosine_similarity(space.row(0), space.row(1)),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_disjoint_documents_similarity_zero() {
        let space = VectorSpace::fit(&["quantum particles", "bake bread"]).unwrap();
        assert_eq!(cosine_similarity(space.row(0), space.row(1)), 0.0);
    }

    #[test]
    fn test_vocabulary_sorted() {
        let space = VectorSpace::fit(&["zeta alpha mid"]).unwrap();
        assert_eq!(space.vocabulary(), &["alpha", "mid", "zeta"]);
        assert_eq!(space.dimensions(), 3);
    }
}
