//! Plain-text rendering for terminal output.

use std::fmt::Write;

use vigil_core::{EngineConfig, MemoryEntry, MemoryStore, ScoreResult};

const PREVIEW_CHARS: usize = 60;

pub fn render_result(result: &ScoreResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "score:      {:.3}", result.aggregate_score);
    let _ = writeln!(out, "raw:        {:.3}", result.raw_score);
    let _ = writeln!(out, "similarity: {:.3}", result.mean_similarity);
    let _ = writeln!(out, "anomaly:    {:.3}", result.anomaly_term);
    let _ = writeln!(out, "tier:       {}", result.response.tier);
    let _ = writeln!(out, "response:   {}", result.response.label);
    let _ = writeln!(out, "dimensions:");
    for (dimension, score) in &result.dimension_scores {
        let _ = writeln!(out, "  {dimension:<32} {score:.3}");
    }
    out
}

pub fn render_batch_line(line: usize, result: &ScoreResult) -> String {
    format!(
        "{line}\t{:.3}\t{}",
        result.aggregate_score, result.response.label
    )
}

pub fn render_stats(config: &EngineConfig, profile: &str, memory: &MemoryStore) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "profile:    {profile}");
    let _ = writeln!(out, "config:     {}", config.name);
    let _ = writeln!(
        out,
        "local:      {}/{}",
        memory.local_len(),
        config.memory.local
    );
    match config.memory.shared {
        Some(bound) if memory.has_shared() => {
            let _ = writeln!(out, "shared:     {}/{bound}", memory.shared_len());
        }
        _ => {
            let _ = writeln!(out, "shared:     disabled");
        }
    }
    let mean = mean_score(memory.local_entries());
    match mean {
        Some(m) => {
            let _ = writeln!(out, "mean score: {m:.3}");
        }
        None => {
            let _ = writeln!(out, "mean score: -");
        }
    }
    out
}

pub fn render_entry(entry: &MemoryEntry) -> String {
    format!(
        "{}  {:.3}  {}",
        entry.timestamp,
        entry.score,
        preview(&entry.text)
    )
}

fn mean_score<'a>(entries: impl Iterator<Item = &'a MemoryEntry>) -> Option<f64> {
    let (sum, n) = entries.fold((0.0, 0usize), |(s, n), e| (s + e.score, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn preview(text: &str) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    }
}
