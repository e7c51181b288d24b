//! Testing utilities for the catalog pipeline.
//!
//! This module provides tools for integration testing:
//! - `MockCatalog` for deterministic pipeline tests without network I/O
//! - Sample entity, descriptor, and chain constructors
//!
//! Scripted failures cover every arm of the pipeline: the index fetch, a
//! single per-entity fetch, descriptor fetches, and chain fetches.

use crate::catalog::CatalogSource;
use async_trait::async_trait;
use pokeapi::{
    entity_id_from_url, Entity, EntityDescriptor, EntitySummary, Error, EvolutionNode, FlavorText,
    Metric,
};
use std::collections::HashMap;

/// A scripted catalog: entities plus the descriptor and chain records
/// reachable from them, keyed by locator.
pub struct CatalogSeed {
    pub entities: Vec<Entity>,
    pub descriptors: HashMap<String, EntityDescriptor>,
    pub chains: HashMap<String, EvolutionNode>,
}

/// A mock catalog source backed by scripted records.
///
/// Use this for deterministic tests without network access. Failure
/// injection is opt-in per arm via the builder methods.
pub struct MockCatalog {
    entities: Vec<Entity>,
    descriptors: HashMap<String, EntityDescriptor>,
    chains: HashMap<String, EvolutionNode>,
    fail_index: bool,
    failing_entity: Option<u32>,
    fail_descriptors: bool,
    fail_evolution: bool,
}

impl MockCatalog {
    /// Create a mock source over a seed.
    pub fn new(seed: CatalogSeed) -> Self {
        Self {
            entities: seed.entities,
            descriptors: seed.descriptors,
            chains: seed.chains,
            fail_index: false,
            failing_entity: None,
            fail_descriptors: false,
            fail_evolution: false,
        }
    }

    /// Make the index fetch fail.
    pub fn fail_index(mut self) -> Self {
        self.fail_index = true;
        self
    }

    /// Make the per-entity fetch for one id fail.
    pub fn fail_entity(mut self, id: u32) -> Self {
        self.failing_entity = Some(id);
        self
    }

    /// Make every descriptor fetch fail.
    pub fn fail_descriptors(mut self) -> Self {
        self.fail_descriptors = true;
        self
    }

    /// Make every evolution chain fetch fail.
    pub fn fail_evolution(mut self) -> Self {
        self.fail_evolution = true;
        self
    }

    /// The scripted entities, in index order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn index(&self, page_size: usize) -> Result<Vec<EntitySummary>, Error> {
        if self.fail_index {
            return Err(Error::Network("scripted index failure".to_string()));
        }
        Ok(self
            .entities
            .iter()
            .take(page_size)
            .map(|e| EntitySummary {
                name: e.name.clone(),
                url: format!("mock://entity/{}/", e.id),
            })
            .collect())
    }

    async fn entity(&self, summary: &EntitySummary) -> Result<Entity, Error> {
        let id = entity_id_from_url(&summary.url).ok_or_else(|| Error::NotFound {
            url: summary.url.clone(),
        })?;
        if self.failing_entity == Some(id) {
            return Err(Error::Network(format!("scripted failure for entity {id}")));
        }
        self.entities
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                url: summary.url.clone(),
            })
    }

    async fn descriptor(&self, locator: &str) -> Result<EntityDescriptor, Error> {
        if self.fail_descriptors {
            return Err(Error::Network("scripted descriptor failure".to_string()));
        }
        self.descriptors
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                url: locator.to_string(),
            })
    }

    async fn evolution_chain(&self, locator: &str) -> Result<EvolutionNode, Error> {
        if self.fail_evolution {
            return Err(Error::Network("scripted chain failure".to_string()));
        }
        self.chains
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                url: locator.to_string(),
            })
    }
}

/// Build a sample entity with the given id, name, and category tags.
pub fn sample_entity(id: u32, name: &str, categories: &[&str]) -> Entity {
    Entity {
        id,
        name: name.to_string(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        traits: vec!["overgrow".to_string()],
        metrics: vec![
            Metric {
                name: "hp".to_string(),
                value: 45,
            },
            Metric {
                name: "attack".to_string(),
                value: 49,
            },
        ],
        height_units: 7,
        weight_units: 69,
        descriptor_ref: format!("mock://species/{id}/"),
    }
}

/// Build a descriptor from (text, language) pairs and a chain locator.
pub fn sample_descriptor(descriptions: &[(&str, &str)], chain_ref: &str) -> EntityDescriptor {
    EntityDescriptor {
        descriptions: descriptions
            .iter()
            .map(|(text, language)| FlavorText {
                text: text.to_string(),
                language: language.to_string(),
            })
            .collect(),
        evolution_graph_ref: chain_ref.to_string(),
        habitat: Some("grassland".to_string()),
        generation: "generation-i".to_string(),
    }
}

/// Build an evolution node with scripted children.
pub fn chain_node(id: u32, name: &str, children: Vec<EvolutionNode>) -> EvolutionNode {
    EvolutionNode {
        name: name.to_string(),
        locator: format!("mock://species/{id}/"),
        children,
    }
}

/// The three-entity sample catalog used across the test suite:
/// alpha (1, grass), bruno (2, fire), gamma (3, water), each with an
/// English description and a single-stage evolution chain.
pub fn sample_catalog() -> CatalogSeed {
    let entities = sample_catalog_entities();

    let mut descriptors = HashMap::new();
    let mut chains = HashMap::new();
    let flavors = [
        (1u32, "A quiet seedling."),
        (2, "Runs hot to the touch."),
        (3, "Never far from water."),
    ];
    for (entity, (id, flavor)) in entities.iter().zip(flavors) {
        let chain_ref = format!("mock://chain/{id}/");
        descriptors.insert(
            entity.descriptor_ref.clone(),
            sample_descriptor(&[(flavor, "en")], &chain_ref),
        );
        chains.insert(chain_ref, chain_node(id, &entity.name, vec![]));
    }

    CatalogSeed {
        entities,
        descriptors,
        chains,
    }
}

/// Just the entities of [`sample_catalog`], for synchronous tests.
pub fn sample_catalog_entities() -> Vec<Entity> {
    vec![
        sample_entity(1, "alpha", &["grass", "poison"]),
        sample_entity(2, "bruno", &["fire"]),
        sample_entity(3, "gamma", &["water"]),
    ]
}
