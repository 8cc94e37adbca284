use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::aggregate::WeightTable;
use crate::constants::{HIGH_SEVERITY_THRESHOLD, NOTABLE_THRESHOLD};
use crate::correlation::CorrelationConfig;
use crate::detector::{Detector, DetectorSpec};
use crate::error::{Result, VigilError};
use crate::memory::{MemoryBounds, MemoryPolicy};
use crate::response::{ResponseConfig, ResponseLadder};

/// Which end of the score range is the worrying one.
///
/// Threat profiles care about high scores; health profiles about low ones.
/// Only the notable and high-severity comparisons flip, response bands do not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    HigherIsWorse,
    LowerIsWorse,
}

impl Polarity {
    /// Strictly past `threshold` in the worrying direction.
    pub fn exceeds(self, score: f64, threshold: f64) -> bool {
        match self {
            Polarity::HigherIsWorse => score > threshold,
            Polarity::LowerIsWorse => score < threshold,
        }
    }
}

fn default_notable() -> f64 {
    NOTABLE_THRESHOLD
}

fn default_high_severity() -> f64 {
    HIGH_SEVERITY_THRESHOLD
}

/// Full engine configuration, loaded once at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub name: String,
    pub dimension_weights: BTreeMap<String, f64>,
    pub detectors: Vec<DetectorSpec>,
    pub response: ResponseConfig,
    #[serde(default)]
    pub memory: MemoryBounds,
    #[serde(default = "default_notable")]
    pub notable_threshold: f64,
    #[serde(default = "default_high_severity")]
    pub high_severity_threshold: f64,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default)]
    pub correlation: CorrelationConfig,
}

/// Validated parts an engine is assembled from.
pub(crate) struct CompiledConfig {
    pub detectors: Vec<Detector>,
    pub weights: WeightTable,
    pub ladder: ResponseLadder,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.compile().map(|_| ())
    }

    pub(crate) fn compile(&self) -> Result<CompiledConfig> {
        if self.name.trim().is_empty() {
            return Err(VigilError::config("config name must not be empty"));
        }

        let weights = WeightTable::new(self.dimension_weights.clone())?;

        let mut names = BTreeSet::new();
        for spec in &self.detectors {
            if !names.insert(spec.name.as_str()) {
                return Err(VigilError::config(format!(
                    "duplicate detector '{}'",
                    spec.name
                )));
            }
        }
        let weighted: BTreeSet<&str> = weights.dimensions().collect();
        if names != weighted {
            let unweighted: Vec<_> = names.difference(&weighted).collect();
            let undetected: Vec<_> = weighted.difference(&names).collect();
            return Err(VigilError::config(format!(
                "detectors and weights disagree: no weight for {unweighted:?}, no detector for {undetected:?}"
            )));
        }

        let detectors = self
            .detectors
            .iter()
            .map(Detector::compile)
            .collect::<Result<Vec<_>>>()?;
        let ladder = ResponseLadder::new(&self.response)?;

        for (label, t) in [
            ("notable_threshold", self.notable_threshold),
            ("high_severity_threshold", self.high_severity_threshold),
        ] {
            if !(0.0..=1.0).contains(&t) {
                return Err(VigilError::config(format!(
                    "{label} must be in [0, 1], got {t}"
                )));
            }
        }
        if self.memory.local == 0 {
            return Err(VigilError::config("memory.local must be at least 1"));
        }
        if self.memory.shared == Some(0) {
            return Err(VigilError::config(
                "memory.shared must be at least 1 (omit it to disable shared memory)",
            ));
        }

        Ok(CompiledConfig {
            detectors,
            weights,
            ladder,
        })
    }

    pub fn memory_policy(&self) -> MemoryPolicy {
        MemoryPolicy {
            bounds: self.memory,
            notable_threshold: self.notable_threshold,
            polarity: self.polarity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::Preset;

    fn minimal() -> EngineConfig {
        EngineConfig {
            name: "test".to_string(),
            dimension_weights: [("a".to_string(), 0.6), ("b".to_string(), 0.4)]
                .into_iter()
                .collect(),
            detectors: vec![
                DetectorSpec::pattern("a", &["foo"], 0.3),
                DetectorSpec::marker("b", &["bar"], 0.2),
            ],
            response: ResponseConfig::new([0.2, 0.4, 0.6, 0.8], ["l0", "l1", "l2", "l3", "l4"]),
            memory: MemoryBounds::default(),
            notable_threshold: 0.7,
            high_severity_threshold: 0.7,
            polarity: Polarity::HigherIsWorse,
            correlation: CorrelationConfig::default(),
        }
    }

    #[test]
    fn test_minimal_is_valid() {
        minimal().validate().unwrap();
    }

    #[test]
    fn test_all_presets_valid() {
        for preset in Preset::ALL {
            preset.config().validate().unwrap();
        }
    }

    #[test]
    fn test_detector_without_weight() {
        let mut c = minimal();
        c.detectors.push(DetectorSpec::marker("c", &["baz"], 0.2));
        assert!(c.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_weight_without_detector() {
        let mut c = minimal();
        c.detectors.pop();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_duplicate_detector() {
        let mut c = minimal();
        c.detectors.push(DetectorSpec::marker("a", &["baz"], 0.2));
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_threshold_and_bound_checks() {
        let mut c = minimal();
        c.notable_threshold = 1.2;
        assert!(c.validate().is_err());

        let mut c = minimal();
        c.memory.local = 0;
        assert!(c.validate().is_err());

        let mut c = minimal();
        c.memory.shared = Some(0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_polarity() {
        assert!(Polarity::HigherIsWorse.exceeds(0.8, 0.7));
        assert!(!Polarity::HigherIsWorse.exceeds(0.7, 0.7));
        assert!(Polarity::LowerIsWorse.exceeds(0.3, 0.4));
        assert!(!Polarity::LowerIsWorse.exceeds(0.4, 0.4));
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "name": "x",
            "dimension_weights": {"a": 1.0},
            "detectors": [{"name": "a", "kind": "marker", "markers": ["m"], "per_match_weight": 0.5}],
            "response": {"cut_points": [0.2, 0.4, 0.6, 0.8], "labels": ["a","b","c","d","e"]}
        }"#;
        let c: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.memory, MemoryBounds::default());
        assert_eq!(c.notable_threshold, 0.7);
        assert_eq!(c.polarity, Polarity::HigherIsWorse);
        assert!(!c.correlation.anomaly);
        c.validate().unwrap();
    }
}
