use serde::{Deserialize, Serialize};

use vigil_core::MemoryEntry;
use vigil_core::time::now_iso8601;

use crate::error::{Result, StoreError};

pub const EXPORT_VERSION: u32 = 1;

/// Portable snapshot of one profile's memory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryExport {
    pub version: u32,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub exported_at: String,
    #[serde(default)]
    pub local: Vec<MemoryEntry>,
    #[serde(default)]
    pub shared: Vec<MemoryEntry>,
}

impl MemoryExport {
    pub fn new(profile: &str, local: Vec<MemoryEntry>, shared: Vec<MemoryEntry>) -> Self {
        Self {
            version: EXPORT_VERSION,
            profile: profile.to_string(),
            exported_at: now_iso8601(),
            local,
            shared,
        }
    }
}

pub fn export_json(snapshot: &MemoryExport) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn import_json(json: &str) -> Result<MemoryExport> {
    let snapshot: MemoryExport = serde_json::from_str(json)?;
    if snapshot.version != EXPORT_VERSION {
        return Err(StoreError::InvalidData(format!(
            "unsupported export version {} (expected {EXPORT_VERSION})",
            snapshot.version
        )));
    }
    if let Some(bad) = snapshot
        .local
        .iter()
        .chain(&snapshot.shared)
        .find(|e| !(0.0..=1.0).contains(&e.score))
    {
        return Err(StoreError::InvalidData(format!(
            "entry {} has score {} outside [0, 1]",
            bad.id, bad.score
        )));
    }
    Ok(snapshot)
}
