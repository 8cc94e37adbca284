//! Best-effort audit trail of every scored interaction.

use serde::{Deserialize, Serialize};

use crate::config::Polarity;
use crate::detector::DimensionScores;
use crate::engine::ScoreResult;
use crate::error::Result;
use crate::time::now_iso8601;

/// Log-shaped view of a score result, one per line in durable sinks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub dimension_scores: DimensionScores,
    pub enhanced_score: f64,
    pub response_label: String,
}

impl AuditRecord {
    pub fn from_result(result: &ScoreResult) -> Self {
        Self {
            timestamp: now_iso8601(),
            dimension_scores: result.dimension_scores.clone(),
            enhanced_score: result.aggregate_score,
            response_label: result.response.label.clone(),
        }
    }
}

/// Append-only destination for audit records.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<()>;
}

pub struct AuditLogger {
    sink: Option<Box<dyn AuditSink>>,
    high_severity_threshold: f64,
    polarity: Polarity,
}

impl AuditLogger {
    pub fn new(high_severity_threshold: f64, polarity: Polarity) -> Self {
        Self {
            sink: None,
            high_severity_threshold,
            polarity,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn is_high_severity(&self, score: f64) -> bool {
        self.polarity.exceeds(score, self.high_severity_threshold)
    }

    /// Write the record and raise an alert when severe. Sink failures are
    /// logged and swallowed.
    pub fn record(&self, result: &ScoreResult) {
        if let Some(sink) = &self.sink {
            let record = AuditRecord::from_result(result);
            if let Err(e) = sink.append(&record) {
                tracing::warn!("audit write failed, continuing: {e}");
            }
        }

        if self.is_high_severity(result.aggregate_score) {
            tracing::warn!(
                score = result.aggregate_score,
                label = %result.response.label,
                "high-severity interaction detected"
            );
        }
    }
}
