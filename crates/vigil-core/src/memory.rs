//! Bounded, durable history of scored interactions.
//!
//! Two FIFO logs: a local log that sees every entry and an optional shared log
//! that only retains notable ones. Both are write-through: an append is only
//! reflected in memory once every affected backend has accepted the new
//! contents. Loads are forgiving and treat unreadable storage as empty.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Polarity;
use crate::constants::{LOCAL_MEMORY_BOUND, NOTABLE_THRESHOLD, SHARED_MEMORY_BOUND, clamp_unit};
use crate::error::{Result, VigilError};
use crate::time::now_iso8601;

/// One remembered interaction and its final score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: Uuid,
    pub timestamp: String,
    pub text: String,
    pub score: f64,
}

impl MemoryEntry {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: now_iso8601(),
            text: text.into(),
            score: clamp_unit(score),
        }
    }
}

/// Durable storage for one memory log.
///
/// `save` receives the complete log contents and replaces whatever was
/// stored before.
pub trait MemoryBackend: Send {
    fn load(&self) -> Result<Vec<MemoryEntry>>;
    fn save(&self, entries: &[MemoryEntry]) -> Result<()>;
}

/// Volatile backend for tests and throwaway engines.
#[derive(Default)]
pub struct InMemoryBackend {
    entries: Mutex<Vec<MemoryEntry>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<MemoryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl MemoryBackend for InMemoryBackend {
    fn load(&self) -> Result<Vec<MemoryEntry>> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .map_err(|_| VigilError::persistence("in-memory backend lock poisoned"))
    }

    fn save(&self, entries: &[MemoryEntry]) -> Result<()> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| VigilError::persistence("in-memory backend lock poisoned"))?;
        *guard = entries.to_vec();
        Ok(())
    }
}

/// Size bounds for the two logs. `shared: None` disables the shared log.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryBounds {
    #[serde(default = "default_local_bound")]
    pub local: usize,
    #[serde(default)]
    pub shared: Option<usize>,
}

fn default_local_bound() -> usize {
    LOCAL_MEMORY_BOUND
}

impl Default for MemoryBounds {
    fn default() -> Self {
        Self {
            local: LOCAL_MEMORY_BOUND,
            shared: None,
        }
    }
}

impl MemoryBounds {
    pub fn with_shared() -> Self {
        Self {
            local: LOCAL_MEMORY_BOUND,
            shared: Some(SHARED_MEMORY_BOUND),
        }
    }
}

/// Everything the store needs to decide what to keep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryPolicy {
    pub bounds: MemoryBounds,
    pub notable_threshold: f64,
    pub polarity: Polarity,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            bounds: MemoryBounds::default(),
            notable_threshold: NOTABLE_THRESHOLD,
            polarity: Polarity::HigherIsWorse,
        }
    }
}

impl MemoryPolicy {
    pub fn is_notable(&self, score: f64) -> bool {
        self.polarity.exceeds(score, self.notable_threshold)
    }
}

/// A single FIFO log bound to its backend.
struct BoundedLog {
    entries: VecDeque<MemoryEntry>,
    capacity: usize,
    backend: Box<dyn MemoryBackend>,
}

impl BoundedLog {
    fn load(backend: Box<dyn MemoryBackend>, capacity: usize, label: &str) -> Self {
        let mut entries: VecDeque<MemoryEntry> = match backend.load() {
            Ok(entries) => entries.into(),
            Err(e) => {
                tracing::warn!("{label} memory unreadable, starting empty: {e}");
                VecDeque::new()
            }
        };
        while entries.len() > capacity {
            entries.pop_front();
        }
        tracing::debug!("{label} memory loaded: {} entries", entries.len());
        Self {
            entries,
            capacity,
            backend,
        }
    }

    /// Contents after appending `entry`, evicting from the front.
    fn with_appended(&self, entry: MemoryEntry) -> VecDeque<MemoryEntry> {
        let mut next = self.entries.clone();
        next.push_back(entry);
        while next.len() > self.capacity {
            next.pop_front();
        }
        next
    }

    /// Resync with whatever the backend now holds; `fallback` is what the
    /// last successful write stored.
    fn reload(&mut self, fallback: VecDeque<MemoryEntry>) {
        let mut entries = match self.backend.load() {
            Ok(entries) => entries.into(),
            Err(_) => fallback,
        };
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        self.entries = entries;
    }

    fn persist(&self, entries: &VecDeque<MemoryEntry>) -> Result<()> {
        let (front, back) = entries.as_slices();
        if back.is_empty() {
            self.backend.save(front)
        } else {
            let contiguous: Vec<MemoryEntry> = entries.iter().cloned().collect();
            self.backend.save(&contiguous)
        }
    }
}

/// Local plus optional shared memory, with write-through appends.
pub struct MemoryStore {
    local: BoundedLog,
    shared: Option<BoundedLog>,
    policy: MemoryPolicy,
}

/// Handle through which engines share one memory store.
pub type SharedMemory = Arc<Mutex<MemoryStore>>;

impl MemoryStore {
    /// Load both logs. A shared backend is ignored when the policy disables
    /// the shared log.
    pub fn open(
        local: Box<dyn MemoryBackend>,
        shared: Option<Box<dyn MemoryBackend>>,
        policy: MemoryPolicy,
    ) -> Self {
        let local = BoundedLog::load(local, policy.bounds.local, "local");
        let shared = match (shared, policy.bounds.shared) {
            (Some(backend), Some(capacity)) => Some(BoundedLog::load(backend, capacity, "shared")),
            _ => None,
        };
        Self {
            local,
            shared,
            policy,
        }
    }

    /// Volatile store, optionally with a volatile shared log.
    pub fn in_memory(policy: MemoryPolicy) -> Self {
        let shared: Option<Box<dyn MemoryBackend>> = policy
            .bounds
            .shared
            .map(|_| Box::new(InMemoryBackend::new()) as Box<dyn MemoryBackend>);
        Self::open(Box::new(InMemoryBackend::new()), shared, policy)
    }

    pub fn into_shared(self) -> SharedMemory {
        Arc::new(Mutex::new(self))
    }

    pub fn policy(&self) -> &MemoryPolicy {
        &self.policy
    }

    /// Append to the local log and, when notable, to the shared log.
    ///
    /// Both backends are written before the in-memory view changes. If the
    /// shared write fails after the local one succeeded, the previous local
    /// contents are written back and the error is returned. When that
    /// rollback fails too, the local log is reloaded from its backend so the
    /// in-memory view matches storage, and the error says so.
    pub fn append(&mut self, entry: MemoryEntry) -> Result<()> {
        let notable = self.shared.is_some() && self.policy.is_notable(entry.score);

        let next_shared = match &self.shared {
            Some(shared) if notable => Some(shared.with_appended(entry.clone())),
            _ => None,
        };
        let next_local = self.local.with_appended(entry);

        self.local.persist(&next_local)?;

        if let (Some(shared), Some(next)) = (&self.shared, &next_shared)
            && let Err(e) = shared.persist(next)
        {
            let Err(rollback) = self.local.persist(&self.local.entries) else {
                return Err(e);
            };
            self.local.reload(next_local);
            tracing::warn!("local memory out of sync with shared memory: {rollback}");
            return Err(VigilError::persistence(format!(
                "shared write failed ({e}) and local rollback failed ({rollback}); \
                 local memory keeps the entry that shared memory is missing"
            )));
        }

        self.local.entries = next_local;
        if let (Some(shared), Some(next)) = (&mut self.shared, next_shared) {
            shared.entries = next;
        }
        Ok(())
    }

    /// Similarity corpus: shared texts then local texts, each in insertion order.
    pub fn all_texts(&self) -> Vec<&str> {
        self.shared_entries()
            .chain(self.local_entries())
            .map(|e| e.text.as_str())
            .collect()
    }

    pub fn local_entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.local.entries.iter()
    }

    pub fn shared_entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.shared.iter().flat_map(|s| s.entries.iter())
    }

    pub fn local_len(&self) -> usize {
        self.local.entries.len()
    }

    pub fn shared_len(&self) -> usize {
        self.shared.as_ref().map_or(0, |s| s.entries.len())
    }

    pub fn has_shared(&self) -> bool {
        self.shared.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.local_len() == 0 && self.shared_len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Backend whose writes can be made to fail on demand.
    #[derive(Clone, Default)]
    struct FlakyBackend {
        inner: Arc<InMemoryBackend>,
        fail: Arc<AtomicBool>,
    }

    impl MemoryBackend for FlakyBackend {
        fn load(&self) -> Result<Vec<MemoryEntry>> {
            self.inner.load()
        }

        fn save(&self, entries: &[MemoryEntry]) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(VigilError::persistence("disk full"));
            }
            self.inner.save(entries)
        }
    }

    /// Backend that accepts a fixed number of writes, then fails.
    #[derive(Clone)]
    struct LimitedBackend {
        inner: Arc<InMemoryBackend>,
        writes_left: Arc<AtomicUsize>,
    }

    impl LimitedBackend {
        fn new(writes: usize) -> Self {
            Self {
                inner: Arc::new(InMemoryBackend::new()),
                writes_left: Arc::new(AtomicUsize::new(writes)),
            }
        }
    }

    impl MemoryBackend for LimitedBackend {
        fn load(&self) -> Result<Vec<MemoryEntry>> {
            self.inner.load()
        }

        fn save(&self, entries: &[MemoryEntry]) -> Result<()> {
            let left = self.writes_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(VigilError::persistence("read-only filesystem"));
            }
            self.writes_left.store(left - 1, Ordering::SeqCst);
            self.inner.save(entries)
        }
    }

    struct BrokenLoad;

    impl MemoryBackend for BrokenLoad {
        fn load(&self) -> Result<Vec<MemoryEntry>> {
            Err(VigilError::persistence("corrupt"))
        }

        fn save(&self, _entries: &[MemoryEntry]) -> Result<()> {
            Ok(())
        }
    }

    fn policy(local: usize, shared: Option<usize>) -> MemoryPolicy {
        MemoryPolicy {
            bounds: MemoryBounds { local, shared },
            notable_threshold: 0.7,
            polarity: Polarity::HigherIsWorse,
        }
    }

    #[test]
    fn test_local_fifo_bound() {
        let mut store = MemoryStore::in_memory(policy(3, None));
        for i in 0..5 {
            store.append(MemoryEntry::new(format!("t{i}"), 0.1)).unwrap();
        }
        assert_eq!(store.local_len(), 3);
        assert_eq!(store.all_texts(), vec!["t2", "t3", "t4"]);
    }

    #[test]
    fn test_eviction_ignores_score() {
        let mut store = MemoryStore::in_memory(policy(2, Some(10)));
        store.append(MemoryEntry::new("severe", 0.95)).unwrap();
        store.append(MemoryEntry::new("mild-1", 0.1)).unwrap();
        store.append(MemoryEntry::new("mild-2", 0.1)).unwrap();

        let local: Vec<_> = store.local_entries().map(|e| e.text.as_str()).collect();
        assert_eq!(local, vec!["mild-1", "mild-2"]);
        // Shared memory still remembers the severe case
        let shared: Vec<_> = store.shared_entries().map(|e| e.text.as_str()).collect();
        assert_eq!(shared, vec!["severe"]);
    }

    #[test]
    fn test_shared_selectivity() {
        let mut store = MemoryStore::in_memory(policy(10, Some(10)));
        store.append(MemoryEntry::new("at threshold", 0.7)).unwrap();
        store.append(MemoryEntry::new("below", 0.2)).unwrap();
        assert_eq!(store.shared_len(), 0);
        store.append(MemoryEntry::new("above", 0.71)).unwrap();
        assert_eq!(store.shared_len(), 1);
    }

    #[test]
    fn test_lower_is_worse_polarity() {
        let mut p = policy(10, Some(10));
        p.polarity = Polarity::LowerIsWorse;
        p.notable_threshold = 0.4;
        let mut store = MemoryStore::in_memory(p);
        store.append(MemoryEntry::new("healthy", 0.9)).unwrap();
        store.append(MemoryEntry::new("struggling", 0.1)).unwrap();
        let shared: Vec<_> = store.shared_entries().map(|e| e.text.as_str()).collect();
        assert_eq!(shared, vec!["struggling"]);
    }

    #[test]
    fn test_all_texts_shared_first() {
        let mut store = MemoryStore::in_memory(policy(10, Some(10)));
        store.append(MemoryEntry::new("a", 0.1)).unwrap();
        store.append(MemoryEntry::new("b", 0.9)).unwrap();
        assert_eq!(store.all_texts(), vec!["b", "a", "b"]);
    }

    #[test]
    fn test_write_through_persists() {
        let backend = FlakyBackend::default();
        let mut store = MemoryStore::open(Box::new(backend.clone()), None, policy(5, None));
        store.append(MemoryEntry::new("x", 0.3)).unwrap();
        assert_eq!(backend.inner.load().unwrap().len(), 1);

        let reopened = MemoryStore::open(Box::new(backend), None, policy(5, None));
        assert_eq!(reopened.all_texts(), vec!["x"]);
    }

    #[test]
    fn test_failed_local_write_leaves_state_untouched() {
        let backend = FlakyBackend::default();
        let mut store = MemoryStore::open(Box::new(backend.clone()), None, policy(5, None));
        store.append(MemoryEntry::new("kept", 0.3)).unwrap();

        backend.fail.store(true, Ordering::SeqCst);
        let err = store.append(MemoryEntry::new("lost", 0.3)).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.all_texts(), vec!["kept"]);
    }

    #[test]
    fn test_failed_shared_write_rolls_back_local() {
        let local = FlakyBackend::default();
        let shared = FlakyBackend::default();
        let mut store = MemoryStore::open(
            Box::new(local.clone()),
            Some(Box::new(shared.clone())),
            policy(5, Some(5)),
        );
        store.append(MemoryEntry::new("first", 0.1)).unwrap();

        shared.fail.store(true, Ordering::SeqCst);
        assert!(store.append(MemoryEntry::new("notable", 0.9)).is_err());

        assert_eq!(store.local_len(), 1);
        assert_eq!(store.shared_len(), 0);
        let persisted: Vec<_> = local
            .inner
            .load()
            .unwrap()
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(persisted, vec!["first"]);
    }

    #[test]
    fn test_failed_rollback_resyncs_local_with_storage() {
        // The notable append's local write succeeds, the rollback does not
        let local = LimitedBackend::new(1);
        let shared = FlakyBackend::default();
        shared.fail.store(true, Ordering::SeqCst);
        let mut store = MemoryStore::open(
            Box::new(local.clone()),
            Some(Box::new(shared)),
            policy(5, Some(5)),
        );

        let err = store.append(MemoryEntry::new("notable", 0.9)).unwrap_err();
        assert!(err.is_persistence());
        assert!(err.to_string().contains("local rollback failed"));

        let persisted: Vec<_> = local
            .inner
            .load()
            .unwrap()
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(persisted, vec!["notable"]);
        assert_eq!(store.all_texts(), vec!["notable"]);
        assert_eq!(store.shared_len(), 0);
    }

    #[test]
    fn test_corrupt_load_degrades_to_empty() {
        let store = MemoryStore::open(
            Box::new(BrokenLoad),
            Some(Box::new(BrokenLoad)),
            policy(5, Some(5)),
        );
        assert!(store.is_empty());
        assert!(store.has_shared());
    }

    #[test]
    fn test_oversized_load_is_trimmed_to_most_recent() {
        let entries: Vec<_> = (0..8)
            .map(|i| MemoryEntry::new(format!("e{i}"), 0.1))
            .collect();
        let store = MemoryStore::open(
            Box::new(InMemoryBackend::with_entries(entries)),
            None,
            policy(3, None),
        );
        assert_eq!(store.all_texts(), vec!["e5", "e6", "e7"]);
    }

    #[test]
    fn test_shared_backend_ignored_when_disabled() {
        let store = MemoryStore::open(
            Box::new(InMemoryBackend::new()),
            Some(Box::new(InMemoryBackend::new())),
            policy(3, None),
        );
        assert!(!store.has_shared());
    }

    #[test]
    fn test_entry_score_clamped() {
        assert_eq!(MemoryEntry::new("x", 3.0).score, 1.0);
        assert_eq!(MemoryEntry::new("x", -1.0).score, 0.0);
    }
}
