//! # rollbook-taxonomy
//!
//! In-memory hierarchical index over a merged catalog snapshot.
//!
//! This crate provides:
//! - Tree adjacency with name-ordered children and perspective-split roots
//! - Breadcrumb, full-path and ancestor resolution with bounded upward walks
//! - Depth-first pre-order traversal for flattened browsing
//! - Technique lookups by owning position, by destination, and with
//!   inheritance down the specialization hierarchy
//! - Diagnostics for dangling references, cycles and inconsistent paths
//!
//! ## Example
//!
//! ```ignore
//! use rollbook_taxonomy::TaxonomyIndex;
//!
//! let index = TaxonomyIndex::from_parts(&system_catalog, &overlay);
//! for position in index.pre_order() {
//!     println!("{}", index.full_path(&position.id)?);
//! }
//! ```

pub mod diagnostics;
pub mod index;

pub use diagnostics::TaxonomyIssue;
pub use index::{RootsByPerspective, TaxonomyIndex};
