//! Vigil interaction scoring engine.
//!
//! Scores short interactions along weighted dimensions, boosts the result by
//! its TF-IDF similarity to remembered interactions (optionally plus an
//! isolation-forest outlier term), and maps the final score onto a five-band
//! response ladder. Every variant is the same engine with different
//! configuration; see [`presets`].
//!
//! Zero I/O: durable memory and audit trails plug in through
//! [`MemoryBackend`] and [`AuditSink`].

pub mod aggregate;
pub mod audit;
pub mod config;
pub mod constants;
pub mod correlation;
pub mod detector;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod isolation;
pub mod memory;
pub mod presets;
pub mod response;
pub mod tfidf;
pub mod time;
pub mod tokenizer;

pub use aggregate::WeightTable;
pub use audit::{AuditLogger, AuditRecord, AuditSink};
pub use config::{EngineConfig, Polarity};
pub use constants::{
    HIGH_SEVERITY_THRESHOLD, LOCAL_MEMORY_BOUND, NEUTRAL_PRIOR, NOTABLE_THRESHOLD,
    SHARED_MEMORY_BOUND,
};
pub use correlation::{CorpusField, Correlation, CorrelationConfig, enhance};
pub use detector::{Detector, DetectorKind, DetectorSpec, DimensionScores, detect_all};
pub use engine::{ScoreResult, ScoringEngine};
pub use error::{Result, VigilError};
pub use interaction::{Interaction, Scalar};
pub use isolation::IsolationForest;
pub use memory::{
    InMemoryBackend, MemoryBackend, MemoryBounds, MemoryEntry, MemoryPolicy, MemoryStore,
    SharedMemory,
};
pub use presets::Preset;
pub use response::{Response, ResponseConfig, ResponseLadder, ResponseTier};
pub use tfidf::{VectorSpace, cosine_similarity};
pub use tokenizer::tokenize;
