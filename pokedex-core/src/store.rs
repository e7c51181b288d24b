//! In-memory entity store.
//!
//! The store holds the fully-resolved catalog as a single immutable
//! snapshot. It is populated by the load path and read-only afterward; a
//! refresh replaces the whole snapshot in one swap, so readers never
//! observe a half-replaced catalog.

use pokeapi::Entity;
use std::sync::Arc;

/// Holds the resolved catalog and hands out immutable snapshots.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    snapshot: Arc<[Entity]>,
}

impl EntityStore {
    /// Create an empty store (pre-load state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the held snapshot with a new catalog.
    pub fn replace_all(&mut self, entities: Vec<Entity>) {
        self.snapshot = entities.into();
    }

    /// The current immutable snapshot. Cheap to clone and share; existing
    /// snapshots are unaffected by a later `replace_all`.
    pub fn snapshot(&self) -> Arc<[Entity]> {
        Arc::clone(&self.snapshot)
    }

    /// Borrow the current snapshot's entities.
    pub fn entities(&self) -> &[Entity] {
        &self.snapshot
    }

    /// Look up an entity by id in the current snapshot.
    pub fn get(&self, id: u32) -> Option<&Entity> {
        self.snapshot.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}
