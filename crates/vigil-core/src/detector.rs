//! Dimension detectors: pure functions from an interaction to a sub-score in [0, 1].
//!
//! Three shapes exist. Pattern and marker detectors count adversarial phrases
//! in the text and score zero on empty text. Metric detectors average
//! self-reported numeric fields and fall back to a neutral prior when a field
//! is missing, so an empty interaction scores 0.5 rather than 0.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::constants::{NEUTRAL_PRIOR, clamp_unit};
use crate::error::{Result, VigilError};
use crate::interaction::Interaction;

/// Per-dimension scores, keyed by dimension name.
pub type DimensionScores = BTreeMap<String, f64>;

/// Declarative detector definition as it appears in configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: DetectorKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorKind {
    /// Case-insensitive regular expressions; each distinct match adds `per_match_weight`.
    Pattern {
        patterns: Vec<String>,
        per_match_weight: f64,
    },
    /// Plain substrings searched in the lower-cased text.
    Marker {
        markers: Vec<String>,
        per_match_weight: f64,
    },
    /// Mean of numeric metadata fields, missing fields count as 0.5.
    MetricAverage {
        fields: Vec<String>,
        #[serde(default)]
        invert: bool,
    },
}

impl DetectorSpec {
    pub fn pattern(name: &str, patterns: &[&str], per_match_weight: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: DetectorKind::Pattern {
                patterns: patterns.iter().map(|s| s.to_string()).collect(),
                per_match_weight,
            },
        }
    }

    pub fn marker(name: &str, markers: &[&str], per_match_weight: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: DetectorKind::Marker {
                markers: markers.iter().map(|s| s.to_string()).collect(),
                per_match_weight,
            },
        }
    }

    pub fn metric_average(name: &str, fields: &[&str], invert: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: DetectorKind::MetricAverage {
                fields: fields.iter().map(|s| s.to_string()).collect(),
                invert,
            },
        }
    }
}

enum Matcher {
    Pattern {
        regexes: Vec<Regex>,
        per_match_weight: f64,
    },
    Marker {
        markers: Vec<String>,
        per_match_weight: f64,
    },
    MetricAverage {
        fields: Vec<String>,
        invert: bool,
    },
}

/// A compiled, immutable detector for one dimension.
pub struct Detector {
    name: String,
    matcher: Matcher,
}

impl Detector {
    /// Compile a detector definition. Invalid regexes, empty lists and
    /// out-of-range weights are configuration errors.
    pub fn compile(spec: &DetectorSpec) -> Result<Self> {
        if spec.name.trim().is_empty() {
            return Err(VigilError::config("detector name must not be empty"));
        }

        let matcher = match &spec.kind {
            DetectorKind::Pattern {
                patterns,
                per_match_weight,
            } => {
                check_list(&spec.name, "patterns", patterns)?;
                check_per_match_weight(&spec.name, *per_match_weight)?;
                let regexes = patterns
                    .iter()
                    .map(|p| {
                        RegexBuilder::new(p)
                            .case_insensitive(true)
                            .build()
                            .map_err(|e| {
                                VigilError::config(format!(
                                    "detector '{}': invalid pattern '{p}': {e}",
                                    spec.name
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Matcher::Pattern {
                    regexes,
                    per_match_weight: *per_match_weight,
                }
            }
            DetectorKind::Marker {
                markers,
                per_match_weight,
            } => {
                check_list(&spec.name, "markers", markers)?;
                check_per_match_weight(&spec.name, *per_match_weight)?;
                Matcher::Marker {
                    markers: markers.iter().map(|m| m.to_lowercase()).collect(),
                    per_match_weight: *per_match_weight,
                }
            }
            DetectorKind::MetricAverage { fields, invert } => {
                check_list(&spec.name, "fields", fields)?;
                Matcher::MetricAverage {
                    fields: fields.clone(),
                    invert: *invert,
                }
            }
        };

        Ok(Self {
            name: spec.name.clone(),
            matcher,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Score one interaction. Never fails; always in [0, 1].
    pub fn score(&self, interaction: &Interaction) -> f64 {
        match &self.matcher {
            Matcher::Pattern {
                regexes,
                per_match_weight,
            } => {
                let text = interaction.text();
                if text.is_empty() {
                    return 0.0;
                }
                let hits = regexes.iter().filter(|re| re.is_match(text)).count();
                clamp_unit(hits as f64 * per_match_weight)
            }
            Matcher::Marker {
                markers,
                per_match_weight,
            } => {
                let text = interaction.text();
                if text.is_empty() {
                    return 0.0;
                }
                let lowered = text.to_lowercase();
                let hits = markers
                    .iter()
                    .filter(|m| lowered.contains(m.as_str()))
                    .count();
                clamp_unit(hits as f64 * per_match_weight)
            }
            Matcher::MetricAverage { fields, invert } => {
                let sum: f64 = fields
                    .iter()
                    .map(|f| interaction.metric(f).unwrap_or(NEUTRAL_PRIOR))
                    .sum();
                let mean = sum / fields.len() as f64;
                if *invert {
                    clamp_unit(1.0 - mean)
                } else {
                    clamp_unit(mean)
                }
            }
        }
    }
}

/// Run every detector against the interaction.
pub fn detect_all(detectors: &[Detector], interaction: &Interaction) -> DimensionScores {
    detectors
        .iter()
        .map(|d| (d.name.clone(), d.score(interaction)))
        .collect()
}

fn check_list(name: &str, what: &str, items: &[String]) -> Result<()> {
    if items.is_empty() {
        return Err(VigilError::config(format!(
            "detector '{name}': {what} must not be empty"
        )));
    }
    if items.iter().any(|s| s.is_empty()) {
        return Err(VigilError::config(format!(
            "detector '{name}': {what} must not contain empty entries"
        )));
    }
    Ok(())
}

fn check_per_match_weight(name: &str, w: f64) -> Result<()> {
    if !(w > 0.0 && w <= 1.0) {
        return Err(VigilError::config(format!(
            "detector '{name}': per_match_weight must be in (0, 1], got {w}"
        )));
    }
    Ok(())
}
