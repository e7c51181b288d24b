//! Catalog aggregation pipeline.
//!
//! This crate provides:
//! - All-or-nothing bulk loading of a remote catalog
//! - An immutable-snapshot entity store
//! - Pure, composable filtering over the snapshot
//! - Lazy per-selection detail resolution with soft-failure semantics
//! - A durable favorites ledger
//!
//! # Quick Start
//!
//! ```ignore
//! use pokedex_core::{FavoritesLedger, FileStore, FilterCriteria, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = pokeapi::Dex::new();
//!     let favorites = FavoritesLedger::open(FileStore::new("favorites.json"));
//!     let mut session = Session::new(favorites);
//!
//!     session.load_catalog(&source, 151).await?;
//!     session.set_criteria(FilterCriteria::new().with_text("char"));
//!
//!     for entity in session.filtered() {
//!         println!("#{} {}", entity.id, entity.name);
//!     }
//!
//!     let view = session.select(&source, 4).await?;
//!     println!("{}", view.description.as_deref().unwrap_or("(no description)"));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod detail;
pub mod favorites;
pub mod filter;
pub mod session;
pub mod store;
pub mod testing;

// Primary public API
pub use catalog::{load_catalog, CatalogSource};
pub use detail::{flatten, resolve, DetailView, EvolutionStage, Fetched};
pub use favorites::{FavoritesLedger, FavoritesStore, FileStore, MemoryStore};
pub use filter::{apply, generation_range, FilterCriteria};
pub use session::{LoadState, Session, SessionError};
pub use store::EntityStore;
