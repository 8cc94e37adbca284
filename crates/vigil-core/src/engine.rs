//! The scoring engine: detectors, aggregation, correlation against memory,
//! response selection and the audit side effect, in that order.

use serde::{Deserialize, Serialize};

use crate::aggregate::WeightTable;
use crate::audit::{AuditLogger, AuditSink};
use crate::config::EngineConfig;
use crate::correlation::{CorpusField, enhance};
use crate::detector::{Detector, DimensionScores, detect_all};
use crate::error::{Result, VigilError};
use crate::interaction::Interaction;
use crate::memory::{MemoryEntry, MemoryStore, SharedMemory};
use crate::response::{Response, ResponseLadder, ResponseTier};

/// Outcome of scoring one interaction.
///
/// `aggregate_score` is the final score after historical enhancement;
/// `raw_score` is the plain weighted sum it was derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub dimension_scores: DimensionScores,
    pub raw_score: f64,
    pub aggregate_score: f64,
    pub mean_similarity: f64,
    pub anomaly_term: f64,
    pub response: Response,
}

impl ScoreResult {
    pub fn label(&self) -> &str {
        &self.response.label
    }

    pub fn tier(&self) -> ResponseTier {
        self.response.tier
    }
}

/// One parametrised engine; behaviour comes entirely from its [`EngineConfig`].
pub struct ScoringEngine {
    config: EngineConfig,
    detectors: Vec<Detector>,
    weights: WeightTable,
    ladder: ResponseLadder,
    memory: SharedMemory,
    audit: AuditLogger,
}

impl ScoringEngine {
    /// Build an engine that owns `memory`. Fails fast on invalid configuration.
    pub fn new(config: EngineConfig, memory: MemoryStore) -> Result<Self> {
        Self::with_shared_memory(config, memory.into_shared())
    }

    /// Build an engine over a memory handle that other engines may also hold.
    pub fn with_shared_memory(config: EngineConfig, memory: SharedMemory) -> Result<Self> {
        let compiled = config.compile()?;
        let audit = AuditLogger::new(config.high_severity_threshold, config.polarity);
        tracing::debug!(
            profile = %config.name,
            dimensions = compiled.weights.len(),
            "scoring engine ready"
        );
        Ok(Self {
            detectors: compiled.detectors,
            weights: compiled.weights,
            ladder: compiled.ladder,
            config,
            memory,
            audit,
        })
    }

    /// Engine with volatile memory shaped by the config's bounds.
    pub fn in_memory(config: EngineConfig) -> Result<Self> {
        let store = MemoryStore::in_memory(config.memory_policy());
        Self::new(config, store)
    }

    pub fn with_audit_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = AuditLogger::new(self.config.high_severity_threshold, self.config.polarity)
            .with_sink(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    pub fn ladder(&self) -> &ResponseLadder {
        &self.ladder
    }

    /// Per-dimension scores only. Pure: no memory access, no side effects.
    pub fn detect(&self, interaction: &Interaction) -> DimensionScores {
        detect_all(&self.detectors, interaction)
    }

    /// Score one interaction and remember it.
    ///
    /// The memory lock is held from reading the corpus until the new entry
    /// is appended. A failed append is returned as a persistence error and
    /// leaves memory unchanged; nothing is audited in that case.
    pub fn score(&self, interaction: &Interaction) -> Result<ScoreResult> {
        let dimension_scores = self.detect(interaction);
        let raw_score = self.weights.aggregate(&dimension_scores)?;
        let remembered = self.remembered_text(interaction);

        let correlation = {
            let mut memory = self
                .memory
                .lock()
                .map_err(|_| VigilError::persistence("memory lock poisoned"))?;
            let corpus = memory.all_texts();
            let correlation = enhance(raw_score, &corpus, &remembered, &self.config.correlation);
            memory.append(MemoryEntry::new(remembered, correlation.enhanced_score))?;
            correlation
        };

        let response = self.ladder.select(correlation.enhanced_score);
        tracing::debug!(
            profile = %self.config.name,
            raw = raw_score,
            similarity = correlation.mean_similarity,
            anomaly = correlation.anomaly_term,
            score = correlation.enhanced_score,
            label = %response.label,
            "interaction scored"
        );

        let result = ScoreResult {
            dimension_scores,
            raw_score,
            aggregate_score: correlation.enhanced_score,
            mean_similarity: correlation.mean_similarity,
            anomaly_term: correlation.anomaly_term,
            response,
        };
        self.audit.record(&result);
        Ok(result)
    }

    fn remembered_text(&self, interaction: &Interaction) -> String {
        match self.config.correlation.corpus {
            CorpusField::Text => interaction.text().to_string(),
            CorpusField::Metadata if interaction.metadata().is_empty() => {
                interaction.text().to_string()
            }
            CorpusField::Metadata => interaction.metadata_text(),
        }
    }
}
