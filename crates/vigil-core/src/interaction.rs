use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A metadata value attached to an interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view used by metric detectors. Booleans map to 1/0, text is
    /// parsed, non-finite numbers are treated as absent.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Scalar::Number(x) => *x,
            Scalar::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(x) => write!(f, "{x}"),
            Scalar::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Number(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

/// One inbound message or event to be scored.
///
/// Built by the caller, then borrowed immutably for the duration of a
/// scoring call. Metadata is kept sorted so every rendering is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: BTreeMap<String, Scalar>,
}

impl Interaction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Metric-only interaction (no message text), as health-style profiles use.
    pub fn from_metrics<K: Into<String>>(metrics: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            text: String::new(),
            metadata: metrics
                .into_iter()
                .map(|(k, v)| (k.into(), Scalar::Number(v)))
                .collect(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> &BTreeMap<String, Scalar> {
        &self.metadata
    }

    /// Numeric value of a metadata field, if present and numeric.
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Scalar::as_f64)
    }

    /// Canonical `key value` rendering of the metadata, sorted by key.
    pub fn metadata_text(&self) -> String {
        self.metadata
            .iter()
            .map(|(k, v)| format!("{k} {v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
