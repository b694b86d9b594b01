//! Centralized default constants for rollbook.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// MATCHING
// =============================================================================

/// Maximum accepted candidate distance (0 = identical, 1 = unrelated).
///
/// A candidate whose distance exceeds this value is rejected outright;
/// callers see `None`, never a low-confidence guess.
pub const MATCH_THRESHOLD: f32 = 0.5;

/// Weight of a position's display name.
pub const POSITION_NAME_WEIGHT: f32 = 1.0;

/// Weight of a position's slug.
pub const POSITION_SLUG_WEIGHT: f32 = 0.8;

/// Weight of a position's breadcrumb text ("Guard Closed Guard").
pub const POSITION_PATH_WEIGHT: f32 = 0.7;

/// Weight of a technique's display name.
pub const TECHNIQUE_NAME_WEIGHT: f32 = 1.0;

/// Weight of each technique alias.
pub const TECHNIQUE_ALIAS_WEIGHT: f32 = 0.9;

/// Weight of the owning position's breadcrumb text.
pub const TECHNIQUE_PATH_WEIGHT: f32 = 0.4;

/// Penalty applied when the query only covers part of a longer field
/// (scaled by the uncovered fraction).
pub const PARTIAL_COVERAGE_PENALTY: f32 = 0.3;

/// Minimum length (chars) of the shorter side for substring alignment to
/// count, whether the query sits inside a field or a field inside the query.
/// Below it only whole-string distance applies.
pub const MIN_PARTIAL_MATCH_LEN: usize = 4;

/// Distances closer than this are considered tied during ranking.
pub const SCORE_EPSILON: f32 = 1e-6;

// =============================================================================
// TAXONOMY
// =============================================================================

/// Separator used when rendering a breadcrumb as a single string.
pub const PATH_SEPARATOR: &str = " > ";

// =============================================================================
// CATALOG MUTATION
// =============================================================================

/// Prefix that namespaces user-created ids away from system ids.
pub const CUSTOM_ID_PREFIX: &str = "custom-";

/// Length of the random suffix appended to custom ids.
pub const CUSTOM_ID_SUFFIX_LEN: usize = 6;

// =============================================================================
// STORE
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 64;

/// Current sparring-round record schema version.
pub const SPARRING_ROUND_SCHEMA_VERSION: u32 = 2;

/// Default overlay document file name (inside the config directory).
pub const OVERLAY_FILE_NAME: &str = "overlay.json";

/// Default config directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "rollbook";

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "rollbook.toml";
