use std::fs;
use std::path::{Path, PathBuf};

use vigil_core::{MemoryBackend, MemoryEntry, VigilError};

use crate::error::Result;

/// Memory log kept as a single JSON array file.
///
/// A missing file is an empty log. Saves go through a sibling temp file and a
/// rename so a crash never leaves a half-written array behind.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Vec<MemoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    pub fn write(&self, entries: &[MemoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl MemoryBackend for JsonFileBackend {
    fn load(&self) -> vigil_core::Result<Vec<MemoryEntry>> {
        self.read().map_err(VigilError::from)
    }

    fn save(&self, entries: &[MemoryEntry]) -> vigil_core::Result<()> {
        self.write(entries).map_err(VigilError::from)
    }
}
