//! # rollbook-search
//!
//! Fuzzy entity matching for rollbook.
//!
//! This crate provides:
//! - Edit-distance primitives (optimal string alignment, substring alignment)
//! - A weighted multi-field [`FuzzyIndex`] implementing [`Matcher`]
//! - [`EntityMatchers`]: position and technique matchers over a taxonomy
//!   snapshot, with position context used to disambiguate technique names
//!
//! ## Example
//!
//! ```ignore
//! use rollbook_search::EntityMatchers;
//! use rollbook_core::MatchingConfig;
//!
//! let matchers = EntityMatchers::build(&index, &MatchingConfig::default());
//! let position = matchers.match_position("clsed gaurd");
//! let armbar = matchers.match_technique("armbar", position.as_ref().map(|m| m.entity_id.as_str()));
//! ```

pub mod entity;
pub mod fuzzy;
pub mod matcher;

pub use rollbook_core::{Candidate, EntityMatch, Matcher, MatchingConfig};

pub use entity::EntityMatchers;
pub use fuzzy::{field_distance, osa_distance, substring_distance};
pub use matcher::FuzzyIndex;
