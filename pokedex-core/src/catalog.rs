//! Catalog source seam and bulk loading.
//!
//! `CatalogSource` abstracts the remote API so the pipeline can be driven
//! by the real client or by a scripted mock in tests. `load_catalog` is the
//! all-or-nothing bulk load: one index page, then every entity record
//! fetched concurrently and joined.

use async_trait::async_trait;
use futures::future::try_join_all;
use pokeapi::{Dex, Entity, EntityDescriptor, EntitySummary, Error, EvolutionNode};
use tracing::info;

/// A source of catalog records.
///
/// Implemented by `pokeapi::Dex` for the real API and by
/// `testing::MockCatalog` for deterministic tests.
#[async_trait]
pub trait CatalogSource {
    /// Fetch one index page of up to `page_size` summaries.
    async fn index(&self, page_size: usize) -> Result<Vec<EntitySummary>, Error>;

    /// Resolve a summary into a full entity record.
    async fn entity(&self, summary: &EntitySummary) -> Result<Entity, Error>;

    /// Fetch the descriptor record behind a locator.
    async fn descriptor(&self, locator: &str) -> Result<EntityDescriptor, Error>;

    /// Fetch an evolution chain tree behind a locator.
    async fn evolution_chain(&self, locator: &str) -> Result<EvolutionNode, Error>;
}

#[async_trait]
impl CatalogSource for Dex {
    async fn index(&self, page_size: usize) -> Result<Vec<EntitySummary>, Error> {
        Dex::index(self, page_size).await
    }

    async fn entity(&self, summary: &EntitySummary) -> Result<Entity, Error> {
        Dex::entity(self, summary).await
    }

    async fn descriptor(&self, locator: &str) -> Result<EntityDescriptor, Error> {
        Dex::descriptor(self, locator).await
    }

    async fn evolution_chain(&self, locator: &str) -> Result<EvolutionNode, Error> {
        Dex::evolution_chain(self, locator).await
    }
}

/// Bulk-load the catalog: fetch one index page, then resolve every summary
/// concurrently.
///
/// Completion order is unordered but the result preserves index order. The
/// load is all-or-nothing: a single failed per-entity fetch fails the whole
/// call, so callers are never handed a silently incomplete catalog.
pub async fn load_catalog<S>(source: &S, page_size: usize) -> Result<Vec<Entity>, Error>
where
    S: CatalogSource + Sync,
{
    let summaries = source.index(page_size).await?;
    info!(summaries = summaries.len(), "resolving catalog index");

    let entities = try_join_all(summaries.iter().map(|summary| source.entity(summary))).await?;

    info!(entities = entities.len(), "catalog loaded");
    Ok(entities)
}
