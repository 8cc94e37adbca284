use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{WEIGHT_SUM_TOLERANCE, clamp_unit};
use crate::detector::DimensionScores;
use crate::error::{Result, VigilError};

/// Validated dimension weights: non-negative, finite, summing to 1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightTable {
    weights: BTreeMap<String, f64>,
}

impl WeightTable {
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(VigilError::config("weight table must not be empty"));
        }
        for (dimension, w) in &weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(VigilError::config(format!(
                    "weight for '{dimension}' must be a non-negative number, got {w}"
                )));
            }
        }
        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(VigilError::config(format!(
                "dimension weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(Self { weights })
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Result<Self> {
        Self::new(pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect())
    }

    pub fn get(&self, dimension: &str) -> Option<f64> {
        self.weights.get(dimension).copied()
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weighted sum of dimension scores.
    ///
    /// The score set and the table must cover exactly the same dimensions;
    /// a partial match would silently drop a dimension's contribution.
    pub fn aggregate(&self, scores: &DimensionScores) -> Result<f64> {
        if let Some(missing) = scores.keys().find(|d| !self.weights.contains_key(*d)) {
            return Err(VigilError::config(format!(
                "dimension '{missing}' has no weight"
            )));
        }
        if let Some(missing) = self.weights.keys().find(|d| !scores.contains_key(*d)) {
            return Err(VigilError::config(format!(
                "weighted dimension '{missing}' has no score"
            )));
        }

        let raw: f64 = self
            .weights
            .iter()
            .map(|(d, w)| clamp_unit(scores[d]) * w)
            .sum();
        Ok(clamp_unit(raw))
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightTable {
    type Error = VigilError;

    fn try_from(weights: BTreeMap<String, f64>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<WeightTable> for BTreeMap<String, f64> {
    fn from(table: WeightTable) -> Self {
        table.weights
    }
}
