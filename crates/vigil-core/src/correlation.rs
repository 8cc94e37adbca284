//! Historical correlation: boost a raw score by its similarity to memory.
//!
//! `enhanced = min(raw * (1 + mean_similarity + anomaly), 1)`. The boost is
//! multiplicative, so text with no detector signal stays near zero however
//! closely it resembles past interactions.

use serde::{Deserialize, Serialize};

use crate::constants::clamp_unit;
use crate::isolation::IsolationForest;
use crate::tfidf::{VectorSpace, cosine_similarity};

/// Which view of an interaction is remembered and vectorised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusField {
    #[default]
    Text,
    Metadata,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Add the isolation-forest outlier term.
    #[serde(default)]
    pub anomaly: bool,
    #[serde(default)]
    pub corpus: CorpusField,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub mean_similarity: f64,
    pub anomaly_term: f64,
    pub enhanced_score: f64,
}

impl Correlation {
    fn unchanged(raw_score: f64) -> Self {
        Self {
            mean_similarity: 0.0,
            anomaly_term: 0.0,
            enhanced_score: clamp_unit(raw_score),
        }
    }
}

/// Enhance `raw_score` against the remembered `corpus`.
///
/// An empty corpus or an empty vocabulary leaves the score unchanged.
pub fn enhance(
    raw_score: f64,
    corpus: &[&str],
    current: &str,
    config: &CorrelationConfig,
) -> Correlation {
    if corpus.is_empty() {
        return Correlation::unchanged(raw_score);
    }

    let mut documents: Vec<&str> = Vec::with_capacity(corpus.len() + 1);
    documents.extend_from_slice(corpus);
    documents.push(current);

    let Some(space) = VectorSpace::fit(&documents) else {
        tracing::debug!("empty vocabulary over {} documents, no enhancement", documents.len());
        return Correlation::unchanged(raw_score);
    };

    let current_row = space.row(corpus.len());
    let total: f64 = space.rows()[..corpus.len()]
        .iter()
        .map(|row| cosine_similarity(current_row, row))
        .sum();
    let mean_similarity = clamp_unit(total / corpus.len() as f64);

    let anomaly_term = if config.anomaly {
        IsolationForest::fit(space.rows())
            .map(|forest| forest.score_sample(current_row).abs())
            .unwrap_or(0.0)
    } else {
        0.0
    };

    let enhanced_score = clamp_unit(raw_score * (1.0 + mean_similarity + anomaly_term));
    Correlation {
        mean_similarity,
        anomaly_term,
        enhanced_score,
    }
}
