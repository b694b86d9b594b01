//! # rollbook-store
//!
//! Catalog storage for rollbook.
//!
//! This crate provides:
//! - [`CatalogStore`]: the immutable system catalog plus a copy-on-write
//!   user overlay, with change notifications over an [`EventBus`]
//! - Overlay backends: atomic JSON file and in-memory
//! - [`CatalogMutator`]: creation of custom positions, techniques, tags and
//!   progress records
//! - Versioned migration of persisted sparring rounds
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rollbook_store::{CatalogMutator, CatalogStore, JsonFileBackend};
//!
//! let store = Arc::new(CatalogStore::open(system, Arc::new(JsonFileBackend::new(path)), EventBus::default()));
//! let mutator = CatalogMutator::new(store.clone());
//! let index = store.index();
//! mutator.create_position(&index, "Octopus Guard", Some("half-guard"), None)?;
//! ```

pub mod backend;
pub mod migration;
pub mod mutator;
pub mod repository;

pub use rollbook_core::{EventBus, OverlayBackend};

pub use backend::{JsonFileBackend, MemoryBackend};
pub use migration::{migrate_sparring_round, MigrationError};
pub use mutator::CatalogMutator;
pub use repository::{load_system_catalog, CatalogStore};
