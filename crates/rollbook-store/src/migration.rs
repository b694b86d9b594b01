//! Versioned upgrade of persisted sparring-round records.
//!
//! Records carry a `schemaVersion`; records written before versioning have
//! none and are treated as version 1.
//!
//! | Version | Shape |
//! |---------|-------|
//! | 1 | `{partner, belt, submissions[], taps[], notes}` |
//! | 2 | [`SparringRoundRecord`] (camelCase, adds dominant/stuck positions) |

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use rollbook_core::defaults::SPARRING_ROUND_SCHEMA_VERSION;
use rollbook_core::SparringRoundRecord;
use rollbook_core::logging::{COMPONENT, SUBSYSTEM};

/// Sparring-round migration errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Unsupported sparring round schema version: {0}")]
    UnsupportedVersion(u64),

    #[error("Invalid sparring round record: {0}")]
    InvalidShape(String),
}

impl From<MigrationError> for rollbook_core::Error {
    fn from(e: MigrationError) -> Self {
        rollbook_core::Error::Migration(e.to_string())
    }
}

/// Accept a list of strings, skipping nulls and non-string items.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct SparringRoundV1 {
    #[serde(default, deserialize_with = "lenient_string")]
    partner: String,
    #[serde(default, deserialize_with = "lenient_string")]
    belt: String,
    #[serde(default, deserialize_with = "lenient_strings")]
    submissions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    taps: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    notes: String,
}

impl From<SparringRoundV1> for SparringRoundRecord {
    fn from(v1: SparringRoundV1) -> Self {
        Self {
            schema_version: SPARRING_ROUND_SCHEMA_VERSION,
            partner_name: v1.partner,
            partner_belt: v1.belt,
            submissions_for: v1.submissions,
            submissions_against: v1.taps,
            dominant_positions: Vec::new(),
            stuck_positions: Vec::new(),
            notes: v1.notes,
        }
    }
}

/// Upgrade a persisted sparring round of any known version to the current
/// schema.
pub fn migrate_sparring_round(raw: Value) -> Result<SparringRoundRecord, MigrationError> {
    if !raw.is_object() {
        return Err(MigrationError::InvalidShape(
            "expected a JSON object".to_string(),
        ));
    }

    let version = match raw.get("schemaVersion") {
        None | Some(Value::Null) => 1,
        Some(v) => v.as_u64().ok_or_else(|| {
            MigrationError::InvalidShape(format!("schemaVersion is not an integer: {}", v))
        })?,
    };

    let record = match version {
        1 => serde_json::from_value::<SparringRoundV1>(raw)
            .map(SparringRoundRecord::from)
            .map_err(|e| MigrationError::InvalidShape(e.to_string()))?,
        2 => serde_json::from_value::<SparringRoundRecord>(raw)
            .map_err(|e| MigrationError::InvalidShape(e.to_string()))?,
        other => return Err(MigrationError::UnsupportedVersion(other)),
    };

    debug!(
        { SUBSYSTEM } = "store",
        { COMPONENT } = "migration",
        from_version = version,
        to_version = SPARRING_ROUND_SCHEMA_VERSION,
        "Sparring round migrated"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unversioned_record_upgrades_from_v1() {
        let record = migrate_sparring_round(json!({
            "partner": "Sam",
            "belt": "blue",
            "submissions": ["Armbar", null, 3, "Kimura"],
            "taps": ["Triangle"],
            "notes": "good pace"
        }))
        .unwrap();

        assert_eq!(record.schema_version, 2);
        assert_eq!(record.partner_name, "Sam");
        assert_eq!(record.partner_belt, "blue");
        assert_eq!(record.submissions_for, vec!["Armbar", "Kimura"]);
        assert_eq!(record.submissions_against, vec!["Triangle"]);
        assert!(record.dominant_positions.is_empty());
        assert_eq!(record.notes, "good pace");
    }

    #[test]
    fn test_v1_with_nulls_and_missing_fields() {
        let record = migrate_sparring_round(json!({"schemaVersion": 1, "partner": null})).unwrap();
        assert_eq!(record, SparringRoundRecord::default());
    }

    #[test]
    fn test_v2_passes_through() {
        let record = migrate_sparring_round(json!({
            "schemaVersion": 2,
            "partnerName": "Alex",
            "partnerBelt": "purple",
            "submissionsFor": [],
            "submissionsAgainst": ["Bow and Arrow Choke"],
            "dominantPositions": ["Mount"],
            "stuckPositions": ["Half Guard"],
            "notes": ""
        }))
        .unwrap();
        assert_eq!(record.partner_name, "Alex");
        assert_eq!(record.stuck_positions, vec!["Half Guard"]);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let err = migrate_sparring_round(json!({"schemaVersion": 9})).unwrap_err();
        assert!(matches!(err, MigrationError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            migrate_sparring_round(json!(["Sam"])),
            Err(MigrationError::InvalidShape(_))
        ));
        assert!(matches!(
            migrate_sparring_round(json!({"schemaVersion": "two"})),
            Err(MigrationError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_converts_to_core_error() {
        let err: rollbook_core::Error = MigrationError::UnsupportedVersion(7).into();
        assert!(err.to_string().contains("version: 7"));
    }
}
