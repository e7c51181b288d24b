//! Minimal PokeAPI REST client.
//!
//! This crate provides a focused client for the PokeAPI catalog surface:
//! - The paginated index of entity summaries
//! - Full entity records (types, abilities, base stats)
//! - Per-species descriptor records (flavor text, habitat, generation)
//! - Evolution chain trees
//!
//! The client owns the wire types and decodes them into the flat domain
//! types the rest of the workspace consumes. It holds no state beyond the
//! underlying HTTP client.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const API_BASE: &str = "https://pokeapi.co/api/v2";
const SPRITE_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("No record at {url}")]
    NotFound { url: String },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// PokeAPI client.
#[derive(Clone)]
pub struct Dex {
    client: reqwest::Client,
    base_url: String,
    retries: u32,
    timeout: std::time::Duration,
}

impl Default for Dex {
    fn default() -> Self {
        Self::new()
    }
}

impl Dex {
    /// Create a new client against the public API.
    pub fn new() -> Self {
        let timeout = std::time::Duration::from_secs(30);
        Self {
            client: Self::build_client(timeout),
            base_url: API_BASE.to_string(),
            retries: 1,
            timeout,
        }
    }

    fn build_client(timeout: std::time::Duration) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client")
    }

    /// Create a client honoring the POKEDEX_API_BASE environment variable.
    pub fn from_env() -> Self {
        match std::env::var("POKEDEX_API_BASE") {
            Ok(base) => Self::new().with_base_url(base),
            Err(_) => Self::new(),
        }
    }

    /// Override the API base URL (mostly for tests and mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        self.base_url = base;
        self
    }

    /// Set how many times a transport failure is retried before failing.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self.client = Self::build_client(timeout);
        self
    }

    /// Fetch one index page of up to `page_size` entity summaries.
    pub async fn index(&self, page_size: usize) -> Result<Vec<EntitySummary>, Error> {
        let url = format!("{}/pokemon?limit={page_size}", self.base_url);
        let page: ApiIndexPage = self.get_json(&url).await?;
        Ok(page
            .results
            .into_iter()
            .map(|entry| EntitySummary {
                name: entry.name,
                url: entry.url,
            })
            .collect())
    }

    /// Resolve an index summary into a full entity record.
    pub async fn entity(&self, summary: &EntitySummary) -> Result<Entity, Error> {
        let raw: ApiEntity = self.get_json(&summary.url).await?;
        Ok(raw.into())
    }

    /// Fetch the descriptor record behind an entity's `descriptor_ref`.
    pub async fn descriptor(&self, locator: &str) -> Result<EntityDescriptor, Error> {
        let raw: ApiSpecies = self.get_json(locator).await?;
        Ok(raw.into())
    }

    /// Fetch an evolution chain tree. The payload nests the root under a
    /// `chain` key.
    pub async fn evolution_chain(&self, locator: &str) -> Result<EvolutionNode, Error> {
        let raw: ApiChain = self.get_json(locator).await?;
        Ok(raw.chain.into())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let mut attempt = 0;
        let body = loop {
            debug!(url, attempt, "fetching");
            match self.fetch_body(url).await {
                Ok(body) => break body,
                Err(Failure::Transport(message)) if attempt < self.retries => {
                    warn!(url, error = %message, "transport failure, retrying");
                    attempt += 1;
                }
                Err(Failure::Transport(message)) => return Err(Error::Network(message)),
                Err(Failure::Fatal(e)) => return Err(e),
            }
        };

        serde_json::from_str(&body).map_err(|e| Error::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// One request/response attempt. Transport failures anywhere in the
    /// attempt (connect, send, or body read) are retryable; HTTP status
    /// errors are not.
    async fn fetch_body(&self, url: &str) -> Result<String, Failure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Failure::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Failure::Fatal(Error::NotFound {
                url: url.to_string(),
            }));
        }
        if !status.is_success() {
            return Err(Failure::Fatal(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }));
        }

        response
            .text()
            .await
            .map_err(|e| Failure::Transport(e.to_string()))
    }
}

/// Per-attempt failure split for the retry loop.
enum Failure {
    Transport(String),
    Fatal(Error),
}

/// Extract the entity id from the trailing numeric path segment of a
/// locator, with or without a trailing slash.
///
/// `https://pokeapi.co/api/v2/pokemon-species/25/` yields `Some(25)`.
pub fn entity_id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

/// URL of the sprite image for an entity id on the static asset host.
pub fn sprite_url(id: u32) -> String {
    format!("{SPRITE_BASE}/{id}.png")
}

// ============================================================================
// Domain types
// ============================================================================

/// A minimal index entry pointing at a full entity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    pub name: String,
    pub url: String,
}

/// A fully-resolved catalog entity. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Externally-assigned id, unique across the catalog.
    pub id: u32,
    pub name: String,
    /// Category tags (types), in API order, unique within the entity.
    pub categories: Vec<String>,
    /// Trait names (abilities), in API order.
    pub traits: Vec<String>,
    /// Named base metrics, in API order. Values are bounded to 0..=255.
    pub metrics: Vec<Metric>,
    pub height_units: u32,
    pub weight_units: u32,
    /// Locator of the descriptor record for the detail resolver.
    pub descriptor_ref: String,
}

impl Entity {
    /// Look up a metric value by name.
    pub fn metric(&self, name: &str) -> Option<u8> {
        self.metrics
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value)
    }

    /// Whether the entity carries the given category tag.
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// A single named base metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub name: String,
    pub value: u8,
}

/// Secondary per-entity record fetched lazily for the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Flavor text entries, in API order.
    pub descriptions: Vec<FlavorText>,
    /// Locator of the evolution chain tree.
    pub evolution_graph_ref: String,
    pub habitat: Option<String>,
    pub generation: String,
}

/// One flavor text entry with its language tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorText {
    pub text: String,
    pub language: String,
}

/// A node in an evolution tree. The root has no parent; a node with no
/// children is a terminal stage. Built once from the wire payload and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionNode {
    pub name: String,
    /// Locator of the species record; its trailing segment carries the id.
    pub locator: String,
    pub children: Vec<EvolutionNode>,
}

impl EvolutionNode {
    /// Entity id parsed from this node's locator.
    pub fn id(&self) -> Option<u32> {
        entity_id_from_url(&self.locator)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiIndexPage {
    results: Vec<ApiIndexEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiIndexEntry {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiEntity {
    id: u32,
    name: String,
    types: Vec<ApiTypeSlot>,
    abilities: Vec<ApiAbilitySlot>,
    stats: Vec<ApiStatSlot>,
    height: u32,
    weight: u32,
    species: ApiRef,
}

#[derive(Debug, Deserialize)]
struct ApiTypeSlot {
    #[serde(rename = "type")]
    kind: ApiNamed,
}

#[derive(Debug, Deserialize)]
struct ApiAbilitySlot {
    ability: ApiNamed,
}

#[derive(Debug, Deserialize)]
struct ApiStatSlot {
    // Base stats are bounded to a byte upstream; a larger value is a
    // schema mismatch and fails the decode.
    base_stat: u8,
    stat: ApiNamed,
}

#[derive(Debug, Deserialize)]
struct ApiNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiNamedRef {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    url: String,
}

impl From<ApiEntity> for Entity {
    fn from(raw: ApiEntity) -> Self {
        Entity {
            id: raw.id,
            name: raw.name,
            categories: raw.types.into_iter().map(|t| t.kind.name).collect(),
            traits: raw.abilities.into_iter().map(|a| a.ability.name).collect(),
            metrics: raw
                .stats
                .into_iter()
                .map(|s| Metric {
                    name: s.stat.name,
                    value: s.base_stat,
                })
                .collect(),
            height_units: raw.height,
            weight_units: raw.weight,
            descriptor_ref: raw.species.url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSpecies {
    flavor_text_entries: Vec<ApiFlavor>,
    evolution_chain: ApiRef,
    habitat: Option<ApiNamed>,
    generation: ApiNamed,
}

#[derive(Debug, Deserialize)]
struct ApiFlavor {
    flavor_text: String,
    language: ApiNamed,
}

impl From<ApiSpecies> for EntityDescriptor {
    fn from(raw: ApiSpecies) -> Self {
        EntityDescriptor {
            descriptions: raw
                .flavor_text_entries
                .into_iter()
                .map(|f| FlavorText {
                    text: f.flavor_text,
                    language: f.language.name,
                })
                .collect(),
            evolution_graph_ref: raw.evolution_chain.url,
            habitat: raw.habitat.map(|h| h.name),
            generation: raw.generation.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiChain {
    chain: ApiChainLink,
}

#[derive(Debug, Deserialize)]
struct ApiChainLink {
    species: ApiNamedRef,
    evolves_to: Vec<ApiChainLink>,
}

impl From<ApiChainLink> for EvolutionNode {
    fn from(raw: ApiChainLink) -> Self {
        EvolutionNode {
            name: raw.species.name,
            locator: raw.species.url,
            children: raw.evolves_to.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_base_url_trimmed() {
        let client = Dex::new().with_base_url("http://localhost:9000/api/");
        assert_eq!(client.base_url, "http://localhost:9000/api");
    }

    #[test]
    fn test_client_retries() {
        let client = Dex::new().with_retries(3);
        assert_eq!(client.retries, 3);
    }

    #[test]
    fn test_client_timeout() {
        let client = Dex::new().with_timeout(std::time::Duration::from_secs(5));
        assert_eq!(client.timeout, std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retry_covers_truncated_body_read() {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");

        let server = std::thread::spawn(move || {
            let mut buf = [0u8; 1024];

            // First attempt: headers promise more body than is sent, then
            // the connection drops mid-read.
            let (mut stream, _) = listener.accept().expect("accept");
            let _ = stream.read(&mut buf);
            stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 64\r\n\r\n{\"resu")
                .expect("write");
            drop(stream);

            // Second attempt: the full index page.
            let (mut stream, _) = listener.accept().expect("accept");
            let _ = stream.read(&mut buf);
            let body = r#"{"results": []}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write");
        });

        let client = Dex::new()
            .with_base_url(format!("http://{addr}"))
            .with_retries(1);

        let summaries = client.index(5).await.expect("second attempt should succeed");
        assert!(summaries.is_empty());
        server.join().expect("server thread");
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            stream
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                )
                .expect("write");
            // No further connection is served; a retry would be refused
            // and surface as a network error instead of the status below.
        });

        let client = Dex::new()
            .with_base_url(format!("http://{addr}"))
            .with_retries(2);

        let result = client.index(5).await;
        assert!(matches!(result, Err(Error::Status { status: 500, .. })));
        server.join().expect("server thread");
    }

    #[test]
    fn test_entity_id_from_url() {
        assert_eq!(
            entity_id_from_url("https://pokeapi.co/api/v2/pokemon-species/25/"),
            Some(25)
        );
        assert_eq!(
            entity_id_from_url("https://pokeapi.co/api/v2/pokemon-species/25"),
            Some(25)
        );
        assert_eq!(entity_id_from_url("https://pokeapi.co/api/v2/pokemon/"), None);
        assert_eq!(entity_id_from_url(""), None);
    }

    #[test]
    fn test_sprite_url() {
        assert!(sprite_url(7).ends_with("/7.png"));
    }

    #[test]
    fn test_decode_entity() {
        let raw: ApiEntity = serde_json::from_str(
            r#"{
                "id": 4,
                "name": "charmander",
                "types": [{"slot": 1, "type": {"name": "fire", "url": "u"}}],
                "abilities": [{"ability": {"name": "blaze", "url": "u"}}],
                "stats": [
                    {"base_stat": 39, "stat": {"name": "hp", "url": "u"}},
                    {"base_stat": 52, "stat": {"name": "attack", "url": "u"}}
                ],
                "height": 6,
                "weight": 85,
                "species": {"name": "charmander", "url": "https://x/api/v2/pokemon-species/4/"}
            }"#,
        )
        .expect("decode should succeed");

        let entity: Entity = raw.into();
        assert_eq!(entity.id, 4);
        assert_eq!(entity.categories, vec!["fire"]);
        assert_eq!(entity.traits, vec!["blaze"]);
        assert_eq!(entity.metric("hp"), Some(39));
        assert_eq!(entity.metric("speed"), None);
        assert!(entity.has_category("fire"));
        assert!(!entity.has_category("water"));
        assert_eq!(entity_id_from_url(&entity.descriptor_ref), Some(4));
    }

    #[test]
    fn test_decode_entity_rejects_oversized_stat() {
        let result: Result<ApiEntity, _> = serde_json::from_str(
            r#"{
                "id": 1,
                "name": "x",
                "types": [],
                "abilities": [],
                "stats": [{"base_stat": 300, "stat": {"name": "hp"}}],
                "height": 1,
                "weight": 1,
                "species": {"url": "u"}
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_descriptor() {
        let raw: ApiSpecies = serde_json::from_str(
            r#"{
                "flavor_text_entries": [
                    {"flavor_text": "Une flamme...", "language": {"name": "fr"}},
                    {"flavor_text": "A flame burns...", "language": {"name": "en"}}
                ],
                "evolution_chain": {"url": "https://x/api/v2/evolution-chain/2/"},
                "habitat": {"name": "mountain"},
                "generation": {"name": "generation-i"}
            }"#,
        )
        .expect("decode should succeed");

        let descriptor: EntityDescriptor = raw.into();
        assert_eq!(descriptor.descriptions.len(), 2);
        assert_eq!(descriptor.descriptions[1].language, "en");
        assert_eq!(descriptor.habitat.as_deref(), Some("mountain"));
        assert_eq!(descriptor.generation, "generation-i");
    }

    #[test]
    fn test_decode_descriptor_null_habitat() {
        let raw: ApiSpecies = serde_json::from_str(
            r#"{
                "flavor_text_entries": [],
                "evolution_chain": {"url": "u"},
                "habitat": null,
                "generation": {"name": "generation-ix"}
            }"#,
        )
        .expect("decode should succeed");

        let descriptor: EntityDescriptor = raw.into();
        assert!(descriptor.habitat.is_none());
        assert!(descriptor.descriptions.is_empty());
    }

    #[test]
    fn test_decode_evolution_chain() {
        let raw: ApiChain = serde_json::from_str(
            r#"{
                "chain": {
                    "species": {"name": "charmander", "url": "https://x/api/v2/pokemon-species/4/"},
                    "evolves_to": [{
                        "species": {"name": "charmeleon", "url": "https://x/api/v2/pokemon-species/5/"},
                        "evolves_to": [{
                            "species": {"name": "charizard", "url": "https://x/api/v2/pokemon-species/6/"},
                            "evolves_to": []
                        }]
                    }]
                }
            }"#,
        )
        .expect("decode should succeed");

        let root: EvolutionNode = raw.chain.into();
        assert_eq!(root.name, "charmander");
        assert_eq!(root.id(), Some(4));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "charmeleon");
        assert_eq!(root.children[0].children[0].id(), Some(6));
        assert!(root.children[0].children[0].children.is_empty());
    }
}
