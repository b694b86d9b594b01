//! Catalog data model: positions, techniques and the user overlay.
//!
//! Positions form a forest through `parent_id`; techniques hang off exactly
//! one owning position. The working catalog is always the system catalog
//! followed by the overlay, concatenated (see [`Catalog::merged`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::SPARRING_ROUND_SCHEMA_VERSION;

fn default_true() -> bool {
    true
}

// =============================================================================
// ENUMS
// =============================================================================

/// Coarse classification of a position relative to the practitioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    Top,
    Bottom,
    #[default]
    Neutral,
}

impl std::fmt::Display for Perspective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Bottom => write!(f, "bottom"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for Perspective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "neutral" => Ok(Self::Neutral),
            _ => Err(format!("Invalid perspective: {}", s)),
        }
    }
}

/// Technique category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechniqueCategory {
    Submission,
    Sweep,
    Pass,
    Escape,
    Takedown,
    Transition,
    Control,
    Defense,
}

impl TechniqueCategory {
    /// All categories, in declaration order.
    pub const ALL: [TechniqueCategory; 8] = [
        Self::Submission,
        Self::Sweep,
        Self::Pass,
        Self::Escape,
        Self::Takedown,
        Self::Transition,
        Self::Control,
        Self::Defense,
    ];
}

impl std::fmt::Display for TechniqueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submission => write!(f, "submission"),
            Self::Sweep => write!(f, "sweep"),
            Self::Pass => write!(f, "pass"),
            Self::Escape => write!(f, "escape"),
            Self::Takedown => write!(f, "takedown"),
            Self::Transition => write!(f, "transition"),
            Self::Control => write!(f, "control"),
            Self::Defense => write!(f, "defense"),
        }
    }
}

impl std::str::FromStr for TechniqueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "submission" => Ok(Self::Submission),
            "sweep" => Ok(Self::Sweep),
            "pass" => Ok(Self::Pass),
            "escape" => Ok(Self::Escape),
            "takedown" => Ok(Self::Takedown),
            "transition" => Ok(Self::Transition),
            "control" => Ok(Self::Control),
            "defense" => Ok(Self::Defense),
            _ => Err(format!("Invalid technique category: {}", s)),
        }
    }
}

/// Mechanism of a submission. Only meaningful for
/// [`TechniqueCategory::Submission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    Choke,
    JointLock,
    Compression,
}

impl std::fmt::Display for SubmissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Choke => write!(f, "choke"),
            Self::JointLock => write!(f, "joint_lock"),
            Self::Compression => write!(f, "compression"),
        }
    }
}

impl std::str::FromStr for SubmissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "choke" => Ok(Self::Choke),
            "joint_lock" => Ok(Self::JointLock),
            "compression" => Ok(Self::Compression),
            _ => Err(format!("Invalid submission type: {}", s)),
        }
    }
}

/// Learning progress on a technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    Learning,
    Drilling,
    Applying,
    Proficient,
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Learning => write!(f, "learning"),
            Self::Drilling => write!(f, "drilling"),
            Self::Applying => write!(f, "applying"),
            Self::Proficient => write!(f, "proficient"),
        }
    }
}

impl std::str::FromStr for ProgressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "learning" => Ok(Self::Learning),
            "drilling" => Ok(Self::Drilling),
            "applying" => Ok(Self::Applying),
            "proficient" => Ok(Self::Proficient),
            _ => Err(format!("Invalid progress status: {}", s)),
        }
    }
}

// =============================================================================
// CATALOG ENTITIES
// =============================================================================

/// A node in the position forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Unique id. Custom entries start with `custom-`.
    pub id: String,
    /// Display name ("Closed Guard").
    pub name: String,
    /// Normalized name ("closed-guard").
    pub slug: String,
    /// Parent position id; `None` for roots.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Slugs from root to self, inclusive.
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub perspective: Perspective,
    /// Applies when training in the gi.
    #[serde(default = "default_true")]
    pub gi: bool,
    /// Applies when training without the gi.
    #[serde(default = "default_true")]
    pub nogi: bool,
    #[serde(default)]
    pub is_custom: bool,
}

impl Position {
    /// Whether this position has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A named action attached to exactly one owning position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technique {
    pub id: String,
    pub name: String,
    pub category: TechniqueCategory,
    /// Owning position id (required).
    pub position_from_id: String,
    /// Destination position id, when the technique ends somewhere else.
    #[serde(default)]
    pub position_to_id: Option<String>,
    #[serde(default)]
    pub submission_type: Option<SubmissionType>,
    #[serde(default = "default_true")]
    pub gi: bool,
    #[serde(default = "default_true")]
    pub nogi: bool,
    /// Alternate names, in preference order.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub key_details: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

/// A user-defined label for sessions and notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
}

/// Progress on a single technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub technique_id: String,
    #[serde(default)]
    pub status: ProgressStatus,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// CATALOG SNAPSHOTS
// =============================================================================

/// A set of positions and techniques (the fixed system catalog, or a merged
/// working catalog).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub techniques: Vec<Technique>,
}

impl Catalog {
    /// Build the working catalog: system records followed by overlay records.
    ///
    /// Overlay entries never replace system entries; custom ids are
    /// namespaced so collisions do not occur.
    pub fn merged(system: &Catalog, overlay: &OverlayDocument) -> Catalog {
        let mut positions = Vec::with_capacity(system.positions.len() + overlay.positions.len());
        positions.extend(system.positions.iter().cloned());
        positions.extend(overlay.positions.iter().cloned());

        let mut techniques =
            Vec::with_capacity(system.techniques.len() + overlay.techniques.len());
        techniques.extend(system.techniques.iter().cloned());
        techniques.extend(overlay.techniques.iter().cloned());

        Catalog {
            positions,
            techniques,
        }
    }

    /// Parse a catalog from its JSON form.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The user-extensible overlay, persisted as a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayDocument {
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub techniques: Vec<Technique>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
}

impl OverlayDocument {
    /// True when the overlay holds no records of any kind.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
            && self.techniques.is_empty()
            && self.tags.is_empty()
            && self.progress.is_empty()
    }
}

// =============================================================================
// PERSISTED SPARRING ROUNDS
// =============================================================================

/// A sparring round as persisted by session storage, in the current schema.
///
/// Older shapes are upgraded by the store's migration function before they
/// reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparringRoundRecord {
    pub schema_version: u32,
    #[serde(default)]
    pub partner_name: String,
    #[serde(default)]
    pub partner_belt: String,
    #[serde(default)]
    pub submissions_for: Vec<String>,
    #[serde(default)]
    pub submissions_against: Vec<String>,
    #[serde(default)]
    pub dominant_positions: Vec<String>,
    #[serde(default)]
    pub stuck_positions: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl Default for SparringRoundRecord {
    fn default() -> Self {
        Self {
            schema_version: SPARRING_ROUND_SCHEMA_VERSION,
            partner_name: String::new(),
            partner_belt: String::new(),
            submissions_for: Vec::new(),
            submissions_against: Vec::new(),
            dominant_positions: Vec::new(),
            stuck_positions: Vec::new(),
            notes: String::new(),
        }
    }
}
