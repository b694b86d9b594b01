//! Identifier generation.
//!
//! Two kinds of ids are minted here:
//!
//! - **Run ids** (UUIDv7) label every item of a reconciliation result so a
//!   caller can key UI state without relying on array position.
//! - **Custom ids** (`custom-<slug>-<suffix>`) name user-created catalog
//!   entries. The random suffix removes the need for a global uniqueness
//!   check, and the prefix keeps them out of the system id namespace.

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::defaults::{CUSTOM_ID_PREFIX, CUSTOM_ID_SUFFIX_LEN};

/// Generate a new time-ordered run-scoped id.
#[inline]
pub fn new_run_id() -> Uuid {
    Uuid::now_v7()
}

/// Build a custom catalog id from a slug.
///
/// # Example
///
/// ```
/// use rollbook_core::custom_id;
///
/// let id = custom_id("octopus-guard");
/// assert!(id.starts_with("custom-octopus-guard-"));
/// ```
pub fn custom_id(slug: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CUSTOM_ID_SUFFIX_LEN)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}{}-{}", CUSTOM_ID_PREFIX, slug, suffix)
}

/// Whether an id belongs to the custom namespace.
pub fn is_custom_id(id: &str) -> bool {
    id.starts_with(CUSTOM_ID_PREFIX)
}
