use std::path::{Path, PathBuf};
use std::{env, fs};

use vigil_core::{MemoryBackend, MemoryPolicy, MemoryStore};

use crate::audit_log::JsonlAuditLog;
use crate::error::{Result, StoreError};
use crate::export::MemoryExport;
use crate::store::Store;

/// Default base directory for all vigil storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".vigil")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Sanitize a profile name for use as a filename.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Per-profile local memory plus the shared store of notable cases for the
/// scoring system the profile runs under.
///
/// Profiles only see each other's notable cases when they run the same
/// system (config name). Each system's shared log keeps its own bound.
///
/// Layout:
/// ```text
/// ~/.vigil/
/// ├── shared/
/// │   ├── <system>.db
/// │   └── ...
/// ├── profiles/
/// │   ├── <profile>.db
/// │   └── ...
/// └── audit/
///     └── <profile>.jsonl
/// ```
pub struct ProfileStore {
    local: Store,
    shared: Store,
    profile: String,
    system: String,
    audit_path: Option<PathBuf>,
}

impl ProfileStore {
    /// Open the profile store and the shared store of `system`, creating
    /// directories as needed. `base_dir` overrides the default location
    /// (for testing).
    pub fn open(profile: &str, system: &str, base_dir: Option<&Path>) -> Result<Self> {
        let profile = resolve_name("profile", profile)?;
        let system = resolve_name("system", system)?;
        let base = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
        let profiles_dir = base.join("profiles");
        let shared_dir = base.join("shared");
        for dir in [&profiles_dir, &shared_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                StoreError::InvalidData(format!("failed to create {}: {e}", dir.display()))
            })?;
        }

        let local = Store::open(&profiles_dir.join(format!("{profile}.db")))?;
        let shared = Store::open(&shared_dir.join(format!("{system}.db")))?;
        local.set_metadata("profile", &profile)?;
        local.set_metadata("system", &system)?;
        shared.set_metadata("system", &system)?;
        tracing::info!(
            "opened profile '{profile}' (system '{system}') under {}",
            base.display()
        );

        Ok(Self {
            local,
            shared,
            audit_path: Some(base.join("audit").join(format!("{profile}.jsonl"))),
            profile,
            system,
        })
    }

    /// In-memory stores and no audit file (for testing).
    pub fn open_in_memory(profile: &str, system: &str) -> Result<Self> {
        Ok(Self {
            local: Store::open_in_memory()?,
            shared: Store::open_in_memory()?,
            profile: resolve_name("profile", profile)?,
            system: resolve_name("system", system)?,
            audit_path: None,
        })
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Sanitized name of the system whose shared store is open.
    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn local_store(&self) -> &Store {
        &self.local
    }

    pub fn shared_store(&self) -> &Store {
        &self.shared
    }

    pub fn audit_path(&self) -> Option<&Path> {
        self.audit_path.as_deref()
    }

    /// JSON-lines audit log for this profile; `None` for in-memory profiles.
    pub fn audit_log(&self) -> Option<JsonlAuditLog> {
        self.audit_path.as_ref().map(JsonlAuditLog::new)
    }

    pub fn export(&self) -> Result<MemoryExport> {
        Ok(MemoryExport::new(
            &self.profile,
            self.local.load_entries()?,
            self.shared.load_entries()?,
        ))
    }

    /// Replace this profile's local log, and the shared log when the
    /// snapshot carries shared entries.
    pub fn import(&self, snapshot: &MemoryExport) -> Result<()> {
        self.local.replace_entries(&snapshot.local)?;
        if !snapshot.shared.is_empty() {
            self.shared.replace_entries(&snapshot.shared)?;
        }
        tracing::info!(
            "imported {} local and {} shared entries into '{}'",
            snapshot.local.len(),
            snapshot.shared.len(),
            self.profile
        );
        Ok(())
    }

    /// Hand both stores to a memory store as its durable backends.
    pub fn into_memory_store(self, policy: MemoryPolicy) -> MemoryStore {
        let shared: Option<Box<dyn MemoryBackend>> = Some(Box::new(self.shared));
        MemoryStore::open(Box::new(self.local), shared, policy)
    }
}

fn resolve_name(kind: &str, name: &str) -> Result<String> {
    let sanitized = sanitize_name(name);
    if sanitized.is_empty() {
        return Err(StoreError::Config(format!("{kind} name must not be empty")));
    }
    Ok(sanitized)
}
