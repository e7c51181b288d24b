//! Persistent favorites ledger.
//!
//! A small set of entity ids, kept in insertion order and persisted as a
//! whole-set JSON array on every mutation. The backing store is a single
//! key in an external key-value layer; here that is one file, overwritten
//! atomically. Missing or corrupt persisted data loads as an empty set,
//! and a persistence failure never aborts a toggle: the in-memory set
//! stays authoritative for the session.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// The external key-value layer the ledger persists to.
pub trait FavoritesStore {
    /// Read the persisted payload, if any. Unreadable data is reported as
    /// absent; the ledger treats both the same way.
    fn load(&self) -> Option<String>;

    /// Overwrite the persisted payload with a new whole-set snapshot.
    fn save(&self, payload: &str) -> io::Result<()>;
}

/// File-backed store: one JSON file, replaced atomically via a temp file
/// and rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FavoritesStore for FileStore {
    fn load(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }

    fn save(&self, payload: &str) -> io::Result<()> {
        // Suffix the full file name; replacing the extension would give
        // "a.json" and "a.txt" the same temp path.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, payload)?;
        std::fs::rename(&tmp, &self.path)
    }
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    payload: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoritesStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.payload.lock().ok()?.clone()
    }

    fn save(&self, payload: &str) -> io::Result<()> {
        match self.payload.lock() {
            Ok(mut slot) => {
                *slot = Some(payload.to_string());
                Ok(())
            }
            Err(_) => Err(io::Error::other("store poisoned")),
        }
    }
}

/// The favorites set, loaded once at startup and persisted whole on every
/// toggle.
pub struct FavoritesLedger {
    ids: Vec<u32>,
    store: Box<dyn FavoritesStore>,
    last_persist_error: Option<String>,
}

impl FavoritesLedger {
    /// Open a ledger over a store, loading whatever it holds. Missing or
    /// corrupt data is an empty set, never an error.
    pub fn open(store: impl FavoritesStore + 'static) -> Self {
        let ids = match store.load() {
            Some(payload) => match serde_json::from_str::<Vec<u32>>(&payload) {
                Ok(raw) => {
                    // Deduplicate while keeping insertion order.
                    let mut ids = Vec::with_capacity(raw.len());
                    for id in raw {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                    ids
                }
                Err(e) => {
                    warn!(error = %e, "corrupt favorites payload, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Self {
            ids,
            store: Box::new(store),
            last_persist_error: None,
        }
    }

    /// Flip membership for an id and persist the updated set. Returns the
    /// new membership state. A persistence failure is logged and recorded
    /// but never aborts the toggle.
    pub fn toggle(&mut self, id: u32) -> bool {
        let now_favorite = match self.ids.iter().position(|&existing| existing == id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(id);
                true
            }
        };

        self.persist();
        now_favorite
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// All favorite ids, in insertion order.
    pub fn all(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The most recent persistence failure, if the last write failed.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    fn persist(&mut self) {
        let payload = match serde_json::to_string(&self.ids) {
            Ok(payload) => payload,
            Err(e) => {
                self.last_persist_error = Some(e.to_string());
                return;
            }
        };

        match self.store.save(&payload) {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                warn!(error = %e, "favorites persistence failed, in-memory set retained");
                self.last_persist_error = Some(e.to_string());
            }
        }
    }
}
