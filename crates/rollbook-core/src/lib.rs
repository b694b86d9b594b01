//! # rollbook-core
//!
//! Core types, traits, and abstractions for the rollbook catalog.
//!
//! This crate provides the foundational data structures (positions,
//! techniques, overlay documents, extraction payloads) and trait definitions
//! that the taxonomy, search, store and reconciliation crates depend on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod extraction;
pub mod ids;
pub mod logging;
pub mod models;
pub mod slug;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{CatalogConfig, ConfigError, MatchingConfig, RollbookConfig};
pub use error::{Error, Result};
pub use events::{CatalogEvent, EventBus, EventEnvelope};
pub use extraction::*;
pub use ids::{custom_id, is_custom_id, new_run_id};
pub use models::*;
pub use slug::{normalize_text, slugify};
pub use traits::*;
