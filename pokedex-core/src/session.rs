//! Session - the explicit application state over the pipeline.
//!
//! A `Session` ties the entity store, the current filter criteria, the
//! favorites ledger, and the current selection together as plain passed-in
//! state, so consumers (and tests) never depend on ambient globals. All
//! reads go through the store's immutable snapshot; all network I/O goes
//! through a `CatalogSource` handed in per call.

use crate::catalog::{load_catalog, CatalogSource};
use crate::detail::{resolve, DetailView};
use crate::favorites::FavoritesLedger;
use crate::filter::{apply, FilterCriteria};
use crate::store::EntityStore;
use pokeapi::Entity;
use rand::Rng;
use thiserror::Error;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Catalog load failed: {0}")]
    Load(#[from] pokeapi::Error),

    #[error("No entity with id {0} in the catalog")]
    UnknownEntity(u32),

    #[error("Selection superseded by a newer one")]
    StaleSelection,
}

/// Whether the catalog has been loaded.
///
/// A failed load is a distinct state, never presented as an empty catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
    /// The last load attempt failed; the store kept its prior snapshot.
    Failed(String),
}

/// Application state for one catalog-browsing session.
pub struct Session {
    store: EntityStore,
    criteria: FilterCriteria,
    favorites: FavoritesLedger,
    load_state: LoadState,
    selection_seq: u64,
    detail: Option<DetailView>,
}

impl Session {
    /// Create a session around an already-opened favorites ledger.
    pub fn new(favorites: FavoritesLedger) -> Self {
        Self {
            store: EntityStore::new(),
            criteria: FilterCriteria::new(),
            favorites,
            load_state: LoadState::NotLoaded,
            selection_seq: 0,
            detail: None,
        }
    }

    /// Bulk-load the catalog into the store. On failure the store keeps
    /// its prior snapshot and the session records the failed state.
    pub async fn load_catalog<S>(
        &mut self,
        source: &S,
        page_size: usize,
    ) -> Result<usize, SessionError>
    where
        S: CatalogSource + Sync,
    {
        match load_catalog(source, page_size).await {
            Ok(entities) => {
                let count = entities.len();
                self.store.replace_all(entities);
                self.load_state = LoadState::Loaded;
                Ok(count)
            }
            Err(e) => {
                self.load_state = LoadState::Failed(e.to_string());
                Err(SessionError::Load(e))
            }
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Replace the filter criteria. The filtered view is re-derived on
    /// every read, so no invalidation is needed.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    /// The current filtered view of the catalog, in snapshot order.
    pub fn filtered(&self) -> Vec<&Entity> {
        apply(self.store.entities(), &self.criteria)
    }

    /// Select an entity and resolve its detail view.
    pub async fn select<S>(&mut self, source: &S, id: u32) -> Result<&DetailView, SessionError>
    where
        S: CatalogSource + Sync,
    {
        let entity = self
            .store
            .get(id)
            .cloned()
            .ok_or(SessionError::UnknownEntity(id))?;

        let ticket = self.begin_selection();
        let view = resolve(source, &entity).await;

        if !self.complete_selection(ticket, view) {
            return Err(SessionError::StaleSelection);
        }
        self.detail.as_ref().ok_or(SessionError::StaleSelection)
    }

    /// Start a selection and get its ticket.
    ///
    /// Drivers that resolve details outside `select` (overlapping requests
    /// from a UI) use the ticket pair: only the resolution holding the most
    /// recent ticket is accepted, so a slow stale resolve can never
    /// overwrite a newer selection.
    pub fn begin_selection(&mut self) -> u64 {
        self.selection_seq += 1;
        self.selection_seq
    }

    /// Install a resolved detail view if its ticket is still current.
    /// Returns whether the view was accepted.
    pub fn complete_selection(&mut self, ticket: u64, view: DetailView) -> bool {
        if ticket != self.selection_seq {
            return false;
        }
        self.detail = Some(view);
        true
    }

    pub fn current_detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.detail = None;
    }

    /// Toggle an id in the favorites ledger; returns the new membership.
    pub fn toggle_favorite(&mut self, id: u32) -> bool {
        self.favorites.toggle(id)
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.favorites.contains(id)
    }

    pub fn favorites(&self) -> &FavoritesLedger {
        &self.favorites
    }

    /// Favorite entities present in the current catalog, in ledger order.
    /// Stale ids with no catalog counterpart are silently skipped.
    pub fn favorite_entities(&self) -> Vec<&Entity> {
        self.favorites
            .all()
            .iter()
            .filter_map(|&id| self.store.get(id))
            .collect()
    }

    /// A uniformly random entity from the current filtered view.
    pub fn random_pick(&self) -> Option<&Entity> {
        let matches = self.filtered();
        if matches.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..matches.len());
        Some(matches[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::MemoryStore;
    use crate::testing::{sample_catalog, MockCatalog};

    fn fresh_session() -> Session {
        Session::new(FavoritesLedger::open(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_load_populates_store() {
        let source = MockCatalog::new(sample_catalog());
        let mut session = fresh_session();

        let count = session
            .load_catalog(&source, 10)
            .await
            .expect("load should succeed");

        assert_eq!(count, 3);
        assert_eq!(session.load_state(), &LoadState::Loaded);
        assert_eq!(session.filtered().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_store_untouched() {
        let source = MockCatalog::new(sample_catalog()).fail_entity(2);
        let mut session = fresh_session();

        let result = session.load_catalog(&source, 10).await;

        assert!(result.is_err());
        assert!(matches!(session.load_state(), LoadState::Failed(_)));
        // First load failed, so the store is still empty, not partial.
        assert!(session.store().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let good = MockCatalog::new(sample_catalog());
        let bad = MockCatalog::new(sample_catalog()).fail_index();
        let mut session = fresh_session();

        session
            .load_catalog(&good, 10)
            .await
            .expect("load should succeed");
        let _ = session.load_catalog(&bad, 10).await;

        assert!(matches!(session.load_state(), LoadState::Failed(_)));
        assert_eq!(session.store().len(), 3);
    }

    #[tokio::test]
    async fn test_filtered_view_follows_criteria() {
        let source = MockCatalog::new(sample_catalog());
        let mut session = fresh_session();
        session
            .load_catalog(&source, 10)
            .await
            .expect("load should succeed");

        session.set_criteria(FilterCriteria::new().with_category("fire"));
        let names: Vec<&str> = session.filtered().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bruno"]);
    }

    #[tokio::test]
    async fn test_select_resolves_detail() {
        let source = MockCatalog::new(sample_catalog());
        let mut session = fresh_session();
        session
            .load_catalog(&source, 10)
            .await
            .expect("load should succeed");

        let view = session.select(&source, 1).await.expect("select");
        assert_eq!(view.entity.name, "alpha");
        assert!(view.descriptor.is_ready());
        assert!(session.current_detail().is_some());

        session.clear_selection();
        assert!(session.current_detail().is_none());
    }

    #[tokio::test]
    async fn test_select_unknown_id_fails() {
        let source = MockCatalog::new(sample_catalog());
        let mut session = fresh_session();
        session
            .load_catalog(&source, 10)
            .await
            .expect("load should succeed");

        assert!(matches!(
            session.select(&source, 99).await,
            Err(SessionError::UnknownEntity(99))
        ));
    }

    #[tokio::test]
    async fn test_stale_resolution_is_rejected() {
        let source = MockCatalog::new(sample_catalog());
        let mut session = fresh_session();
        session
            .load_catalog(&source, 10)
            .await
            .expect("load should succeed");

        let slow = session.begin_selection();
        let fast = session.begin_selection();

        let slow_entity = session.store().get(1).cloned().expect("entity 1");
        let fast_entity = session.store().get(2).cloned().expect("entity 2");
        let slow_view = resolve(&source, &slow_entity).await;
        let fast_view = resolve(&source, &fast_entity).await;

        // The newer selection lands first; the older one must not clobber it.
        assert!(session.complete_selection(fast, fast_view));
        assert!(!session.complete_selection(slow, slow_view));

        let current = session.current_detail().expect("detail");
        assert_eq!(current.entity.id, 2);
    }

    #[tokio::test]
    async fn test_favorites_join_skips_stale_ids() {
        let source = MockCatalog::new(sample_catalog());
        let mut session = fresh_session();
        session
            .load_catalog(&source, 10)
            .await
            .expect("load should succeed");

        session.toggle_favorite(3);
        session.toggle_favorite(999); // not in the catalog

        assert!(session.is_favorite(999));
        let names: Vec<&str> = session
            .favorite_entities()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["gamma"]);
    }

    #[tokio::test]
    async fn test_random_pick_honors_filter() {
        let source = MockCatalog::new(sample_catalog());
        let mut session = fresh_session();
        session
            .load_catalog(&source, 10)
            .await
            .expect("load should succeed");

        session.set_criteria(FilterCriteria::new().with_category("water"));
        for _ in 0..10 {
            let pick = session.random_pick().expect("non-empty view");
            assert_eq!(pick.name, "gamma");
        }

        session.set_criteria(FilterCriteria::new().with_text("no-such-entity"));
        assert!(session.random_pick().is_none());
    }
}
