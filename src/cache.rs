//! Persistent verdict cache for checkers backed by expensive services.
//!
//! One [`ResultCache`] belongs to exactly one checker instance. It maps the
//! exact normalized sentence text to the [`CheckVerdict`] computed for it,
//! is loaded once when the checker is built and written once at shutdown.
//!
//! Entries are never evicted. The file is a flat JSON object
//! `{ "<sentence>": <verdict>, ... }` with keys in sorted order, so an
//! unchanged cache produces an identical file on every flush.
//!
//! [`ResultCache::get_or_compute`] lets one caller per sentence compute a
//! missing verdict while concurrent callers for the same sentence wait and
//! then read the stored result. Failed verdicts are never stored.
//!
//! I/O problems never surface as errors: a missing or corrupt file starts
//! an empty cache, and a failed write only loses this run's additions.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::CheckVerdict;

type Gate = Arc<tokio::sync::Mutex<()>>;

pub struct ResultCache {
    path: Option<PathBuf>,
    state: Mutex<CacheState>,
    gates: Mutex<HashMap<String, Gate>>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CheckVerdict>,
    dirty: bool,
}

impl ResultCache {
    /// Load the cache stored at `path`.
    pub fn load(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, CheckVerdict>>(&content) {
                Ok(entries) => {
                    tracing::debug!(path = %path.display(), entries = entries.len(), "loaded cache");
                    entries
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "ignoring corrupt cache file: {}", e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "could not read cache file: {}", e);
                HashMap::new()
            }
        };

        Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(CacheState {
                entries,
                dirty: false,
            }),
            gates: Mutex::default(),
        }
    }

    /// A cache that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(CacheState::default()),
            gates: Mutex::default(),
        }
    }

    pub fn get(&self, sentence: &str) -> Option<CheckVerdict> {
        self.lock().entries.get(sentence).cloned()
    }

    pub fn set(&self, sentence: String, verdict: CheckVerdict) {
        let mut state = self.lock();
        state.entries.insert(sentence, verdict);
        state.dirty = true;
    }

    /// The stored verdict for `sentence`, or the one `compute` produces.
    ///
    /// Only one `compute` runs per sentence at a time; later callers wait
    /// for it and reuse the stored verdict. A verdict carrying an `error`
    /// annotation is returned but not stored, so the next caller retries.
    pub async fn get_or_compute<F, Fut>(&self, sentence: &str, compute: F) -> CheckVerdict
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CheckVerdict>,
    {
        if let Some(hit) = self.get(sentence) {
            return hit;
        }

        let gate = self.gate(sentence);
        let verdict = {
            let _turn = gate.lock().await;
            match self.get(sentence) {
                Some(hit) => hit,
                None => {
                    let verdict = compute().await;
                    if verdict.error().is_none() {
                        self.set(sentence.to_string(), verdict.clone());
                    }
                    verdict
                }
            }
        };
        self.release_gate(sentence, gate);
        verdict
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the cache to disk if anything changed since the last flush.
    pub fn flush(&self) {
        let Some(path) = &self.path else {
            return;
        };

        let json = {
            let state = self.lock();
            if !state.dirty {
                return;
            }
            let sorted: BTreeMap<&String, &CheckVerdict> = state.entries.iter().collect();
            match serde_json::to_string_pretty(&sorted) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!("could not serialize cache: {}", e);
                    return;
                }
            }
        };

        if let Err(e) = write_file(path, &json) {
            tracing::warn!(path = %path.display(), "could not write cache file: {}", e);
            return;
        }
        self.lock().dirty = false;
        tracing::debug!(path = %path.display(), "flushed cache");
    }

    // Every critical section is a single map operation, so a poisoned
    // lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn gates(&self) -> MutexGuard<'_, HashMap<String, Gate>> {
        self.gates.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn gate(&self, sentence: &str) -> Gate {
        self.gates().entry(sentence.to_string()).or_default().clone()
    }

    /// Drop the caller's handle and forget the gate once nobody else holds it.
    fn release_gate(&self, sentence: &str, gate: Gate) {
        let mut gates = self.gates();
        drop(gate);
        if gates
            .get(sentence)
            .is_some_and(|g| Arc::strong_count(g) == 1)
        {
            gates.remove(sentence);
        }
    }
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)
}
