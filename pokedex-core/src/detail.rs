//! Lazy detail resolution for a selected entity.
//!
//! A detail view is assembled from two dependent fetches: the descriptor
//! record, then the evolution chain it points at. Both arms soft-fail
//! independently: resolution never blocks display of the entity itself,
//! which is already known at call time.

use crate::catalog::CatalogSource;
use pokeapi::{Entity, EntityDescriptor, Error, EvolutionNode};
use tracing::warn;

/// Language tag used to pick the displayed description.
const TARGET_LANGUAGE: &str = "en";

/// Outcome of one lazily-fetched arm of a detail view.
///
/// Keeping the failure explicit lets a consumer distinguish "no description
/// available" from "network down".
#[derive(Debug)]
pub enum Fetched<T> {
    /// The record was fetched and decoded.
    Ready(T),
    /// The fetch failed; the rest of the view is unaffected.
    Failed(Error),
    /// The fetch was never attempted because its prerequisite failed.
    Skipped,
}

impl<T> Fetched<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Fetched::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Fetched::Ready(_))
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Fetched::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// The assembled detail view for one entity.
#[derive(Debug)]
pub struct DetailView {
    pub entity: Entity,
    pub descriptor: Fetched<EntityDescriptor>,
    pub evolution: Fetched<EvolutionNode>,
    /// The target-language description, if the descriptor carries one.
    /// `None` both when no entry matches and when the descriptor itself
    /// failed; check `descriptor` to tell the two apart.
    pub description: Option<String>,
}

/// Resolve the detail view for an entity.
///
/// The descriptor is fetched first; the evolution chain locator comes out
/// of it, so the chain fetch is sequential and is skipped entirely when the
/// descriptor fetch fails. Neither failure aborts resolution.
pub async fn resolve<S>(source: &S, entity: &Entity) -> DetailView
where
    S: CatalogSource + Sync,
{
    let descriptor = match source.descriptor(&entity.descriptor_ref).await {
        Ok(descriptor) => Fetched::Ready(descriptor),
        Err(e) => {
            warn!(entity = entity.id, error = %e, "descriptor fetch failed");
            Fetched::Failed(e)
        }
    };

    let evolution = match descriptor.get() {
        Some(descriptor) => match source.evolution_chain(&descriptor.evolution_graph_ref).await {
            Ok(root) => Fetched::Ready(root),
            Err(e) => {
                warn!(entity = entity.id, error = %e, "evolution chain fetch failed");
                Fetched::Failed(e)
            }
        },
        None => Fetched::Skipped,
    };

    let description = descriptor.get().and_then(select_description);

    DetailView {
        entity: entity.clone(),
        descriptor,
        evolution,
        description,
    }
}

/// Pick the first description in the target language, cleaned of the
/// form-feed characters the upstream flavor text embeds. A descriptor with
/// no matching entry yields `None`, never an error.
fn select_description(descriptor: &EntityDescriptor) -> Option<String> {
    descriptor
        .descriptions
        .iter()
        .find(|entry| entry.language == TARGET_LANGUAGE)
        .map(|entry| entry.text.replace('\u{0c}', " "))
}

/// One stage of a flattened evolution line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionStage {
    pub name: String,
    /// Parsed from the stage's locator; `None` if the locator carries no
    /// trailing numeric segment.
    pub id: Option<u32>,
}

/// Flatten an evolution tree into its main line.
///
/// Walks depth-first but recurses into only the first child at each node,
/// so a species that branches into several evolutions surfaces only its
/// first branch. This is a known limitation kept for parity with the
/// reference behavior; consumers wanting the full tree can walk
/// `DetailView::evolution` themselves.
pub fn flatten(root: &EvolutionNode) -> Vec<EvolutionStage> {
    let mut stages = Vec::new();
    let mut current = Some(root);

    while let Some(node) = current {
        stages.push(EvolutionStage {
            name: node.name.clone(),
            id: node.id(),
        });
        current = node.children.first();
    }

    stages
}
