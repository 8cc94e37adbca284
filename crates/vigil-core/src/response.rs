//! Threshold ladder mapping a final score to one of five ordered responses.
//!
//! Bands are half-open `[low, high)`, except the top band which is closed
//! at 1.0. A score sitting exactly on a cut point belongs to the higher band.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::clamp_unit;
use crate::error::{Result, VigilError};

/// Severity tier of a response, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTier {
    Baseline,
    Guarded,
    Elevated,
    Severe,
    Critical,
}

impl ResponseTier {
    pub const ALL: [ResponseTier; 5] = [
        ResponseTier::Baseline,
        ResponseTier::Guarded,
        ResponseTier::Elevated,
        ResponseTier::Severe,
        ResponseTier::Critical,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ResponseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseTier::Baseline => "baseline",
            ResponseTier::Guarded => "guarded",
            ResponseTier::Elevated => "elevated",
            ResponseTier::Severe => "severe",
            ResponseTier::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Selected response: its tier and the profile-specific label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub tier: ResponseTier,
    pub label: String,
}

/// Ladder configuration: four cut points, five labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseConfig {
    pub cut_points: Vec<f64>,
    pub labels: Vec<String>,
}

impl ResponseConfig {
    pub fn new(cut_points: [f64; 4], labels: [&str; 5]) -> Self {
        Self {
            cut_points: cut_points.to_vec(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Validated, total mapping from [0, 1] to a response.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseLadder {
    cut_points: [f64; 4],
    labels: [String; 5],
}

impl ResponseLadder {
    pub fn new(config: &ResponseConfig) -> Result<Self> {
        let cut_points: [f64; 4] = config.cut_points.as_slice().try_into().map_err(|_| {
            VigilError::config(format!(
                "response ladder needs exactly 4 cut points, got {}",
                config.cut_points.len()
            ))
        })?;
        let labels: [String; 5] = config.labels.clone().try_into().map_err(|_| {
            VigilError::config(format!(
                "response ladder needs exactly 5 labels, got {}",
                config.labels.len()
            ))
        })?;

        if cut_points.iter().any(|c| !(c.is_finite() && *c > 0.0 && *c < 1.0)) {
            return Err(VigilError::config(format!(
                "cut points must lie strictly inside (0, 1): {cut_points:?}"
            )));
        }
        if cut_points.windows(2).any(|w| w[0] >= w[1]) {
            return Err(VigilError::config(format!(
                "cut points must be strictly increasing: {cut_points:?}"
            )));
        }
        if labels.iter().any(|l| l.trim().is_empty()) {
            return Err(VigilError::config("response labels must not be empty"));
        }

        Ok(Self { cut_points, labels })
    }

    /// Band index for a score: the number of cut points at or below it.
    pub fn tier(&self, score: f64) -> ResponseTier {
        let score = clamp_unit(score);
        let band = self.cut_points.iter().filter(|c| score >= **c).count();
        ResponseTier::ALL[band]
    }

    pub fn select(&self, score: f64) -> Response {
        let tier = self.tier(score);
        Response {
            tier,
            label: self.labels[tier.index()].clone(),
        }
    }

    pub fn label(&self, tier: ResponseTier) -> &str {
        &self.labels[tier.index()]
    }

    pub fn cut_points(&self) -> &[f64; 4] {
        &self.cut_points
    }
}
