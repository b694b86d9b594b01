//! Extraction payload (input) and matched extraction (output) types.
//!
//! The payload is produced by an external free-text/LLM extraction step and
//! is untrusted: every leaf is a plain string or list of strings, and absent
//! or `null` fields decode to empty values instead of failing. The matched
//! extraction mirrors the payload, pairing every name with its best catalog
//! match (or `None`) and giving every list item a run-scoped id.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::slug::normalize_text;

/// Decode `null` as the type's default value.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a list of strings, dropping `null` entries and treating a `null`
/// list as empty.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<Option<String>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().flatten().collect())
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// Structured output of the extraction step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionPayload {
    #[serde(default, deserialize_with = "nullable")]
    pub session: ExtractedSession,
    #[serde(default, deserialize_with = "nullable")]
    pub sparring_rounds: Vec<ExtractedSparringRound>,
}

impl ExtractionPayload {
    /// Parse a payload from JSON. Missing fields default to empty values.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSession {
    #[serde(default, deserialize_with = "nullable")]
    pub date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub gi_or_nogi: String,
    #[serde(default, deserialize_with = "nullable")]
    pub session_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub techniques: Vec<TechniqueMention>,
    #[serde(default, deserialize_with = "nullable")]
    pub position_notes: Vec<PositionNote>,
}

/// A technique worked on during the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueMention {
    #[serde(default, deserialize_with = "nullable")]
    pub position_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub technique_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: String,
    #[serde(default, deserialize_with = "string_list")]
    pub key_details: Vec<String>,
}

/// Notes about a position, without a specific technique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionNote {
    #[serde(default, deserialize_with = "nullable")]
    pub position_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: String,
    #[serde(default, deserialize_with = "string_list")]
    pub key_details: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSparringRound {
    #[serde(default, deserialize_with = "nullable")]
    pub partner_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub partner_belt: String,
    #[serde(default, deserialize_with = "string_list")]
    pub submissions_for: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub submissions_against: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub dominant_positions: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub stuck_positions: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: String,
}

// =============================================================================
// MATCHED EXTRACTION
// =============================================================================

/// Gi / no-gi classification of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiMode {
    Gi,
    Nogi,
    Both,
}

impl std::fmt::Display for GiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gi => write!(f, "gi"),
            Self::Nogi => write!(f, "nogi"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// A resolved catalog reference with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMatch {
    pub entity_id: String,
    pub entity_name: String,
    /// `1 - distance`, in (0, 1]; higher is better.
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedExtraction {
    pub session: MatchedSession,
    pub sparring_rounds: Vec<MatchedSparringRound>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedSession {
    pub date: String,
    /// Normalized gi / no-gi value; `None` when the text was not recognized.
    pub gi_or_nogi: Option<GiMode>,
    pub session_type: String,
    pub techniques: Vec<MatchedTechniqueMention>,
    pub position_notes: Vec<MatchedPositionNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedTechniqueMention {
    pub id: Uuid,
    pub position_name: String,
    pub position_match: Option<EntityMatch>,
    pub technique_name: String,
    pub technique_match: Option<EntityMatch>,
    pub notes: String,
    pub key_details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPositionNote {
    pub id: Uuid,
    pub position_name: String,
    pub position_match: Option<EntityMatch>,
    pub notes: String,
    pub key_details: Vec<String>,
}

/// A single name from a list field, with its match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedName {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "match")]
    pub entity_match: Option<EntityMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedSparringRound {
    pub id: Uuid,
    pub partner_name: String,
    pub partner_belt: String,
    pub submissions_for: Vec<MatchedName>,
    pub submissions_against: Vec<MatchedName>,
    pub dominant_positions: Vec<MatchedName>,
    pub stuck_positions: Vec<MatchedName>,
    pub notes: String,
}

/// A technique name that failed to match, with the position it was
/// mentioned under (when that position did resolve).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedTechnique {
    pub name: String,
    pub position_id: Option<String>,
}

/// Names in a matched extraction that have no catalog match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedNames {
    pub positions: Vec<String>,
    pub techniques: Vec<UnmatchedTechnique>,
}

impl UnmatchedNames {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.techniques.is_empty()
    }

    fn push_position(&mut self, name: &str) {
        let key = normalize_text(name);
        if key.is_empty() || self.positions.iter().any(|p| normalize_text(p) == key) {
            return;
        }
        self.positions.push(name.trim().to_string());
    }

    fn push_technique(&mut self, name: &str, position_id: Option<&str>) {
        let key = normalize_text(name);
        if key.is_empty()
            || self.techniques.iter().any(|t| {
                normalize_text(&t.name) == key && t.position_id.as_deref() == position_id
            })
        {
            return;
        }
        self.techniques.push(UnmatchedTechnique {
            name: name.trim().to_string(),
            position_id: position_id.map(str::to_string),
        });
    }
}

impl MatchedExtraction {
    /// Collect every non-blank name without a match, deduplicated, in
    /// payload order. Callers use this to decide which catalog entries to
    /// create.
    pub fn unmatched(&self) -> UnmatchedNames {
        let mut out = UnmatchedNames::default();

        for item in &self.session.techniques {
            if item.position_match.is_none() {
                out.push_position(&item.position_name);
            }
            if item.technique_match.is_none() {
                let position_id = item.position_match.as_ref().map(|m| m.entity_id.as_str());
                out.push_technique(&item.technique_name, position_id);
            }
        }
        for note in &self.session.position_notes {
            if note.position_match.is_none() {
                out.push_position(&note.position_name);
            }
        }
        for round in &self.sparring_rounds {
            for sub in round.submissions_for.iter().chain(&round.submissions_against) {
                if sub.entity_match.is_none() {
                    out.push_technique(&sub.name, None);
                }
            }
            for pos in round.dominant_positions.iter().chain(&round.stuck_positions) {
                if pos.entity_match.is_none() {
                    out.push_position(&pos.name);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_absent_fields_default() {
        let payload = ExtractionPayload::from_json("{}").unwrap();
        assert_eq!(payload, ExtractionPayload::default());
    }

    #[test]
    fn test_payload_null_fields_default() {
        let json = r#"{
            "session": {
                "date": null,
                "giOrNogi": "Gi",
                "techniques": [{"positionName": "mount", "techniqueName": null, "keyDetails": null}],
                "positionNotes": null
            },
            "sparringRounds": [{"partnerName": "Sam", "submissionsFor": ["armbar", null]}]
        }"#;
        let payload = ExtractionPayload::from_json(json).unwrap();
        assert_eq!(payload.session.date, "");
        assert_eq!(payload.session.gi_or_nogi, "Gi");
        assert_eq!(payload.session.techniques[0].technique_name, "");
        assert!(payload.session.techniques[0].key_details.is_empty());
        assert!(payload.session.position_notes.is_empty());
        assert_eq!(payload.sparring_rounds[0].submissions_for, vec!["armbar"]);
        assert!(payload.sparring_rounds[0].stuck_positions.is_empty());
    }

    #[test]
    fn test_payload_rejects_wrong_types() {
        let json = r#"{"session": {"techniques": "armbar"}}"#;
        assert!(ExtractionPayload::from_json(json).is_err());
    }

    #[test]
    fn test_matched_name_serializes_match_key() {
        let name = MatchedName {
            id: Uuid::nil(),
            name: "armbar".into(),
            entity_match: Some(EntityMatch {
                entity_id: "armbar-cg".into(),
                entity_name: "Armbar".into(),
                score: 0.9,
            }),
        };
        let json = serde_json::to_value(&name).unwrap();
        assert_eq!(json["match"]["entityId"], "armbar-cg");
        assert_eq!(json["match"]["entityName"], "Armbar");
    }

    #[test]
    fn test_unmatched_dedupes_and_skips_blank() {
        let none_round = |name: &str| MatchedName {
            id: Uuid::nil(),
            name: name.into(),
            entity_match: None,
        };
        let extraction = MatchedExtraction {
            session: MatchedSession {
                date: String::new(),
                gi_or_nogi: None,
                session_type: String::new(),
                techniques: vec![MatchedTechniqueMention {
                    id: Uuid::nil(),
                    position_name: "Octopus Guard".into(),
                    position_match: None,
                    technique_name: "  ".into(),
                    technique_match: None,
                    notes: String::new(),
                    key_details: vec![],
                }],
                position_notes: vec![MatchedPositionNote {
                    id: Uuid::nil(),
                    position_name: "octopus  guard".into(),
                    position_match: None,
                    notes: String::new(),
                    key_details: vec![],
                }],
            },
            sparring_rounds: vec![MatchedSparringRound {
                id: Uuid::nil(),
                partner_name: String::new(),
                partner_belt: String::new(),
                submissions_for: vec![none_round("Gogoplata"), none_round("gogoplata")],
                submissions_against: vec![],
                dominant_positions: vec![],
                stuck_positions: vec![none_round("Octopus Guard")],
                notes: String::new(),
            }],
        };

        let unmatched = extraction.unmatched();
        assert_eq!(unmatched.positions, vec!["Octopus Guard"]);
        assert_eq!(unmatched.techniques.len(), 1);
        assert_eq!(unmatched.techniques[0].name, "Gogoplata");
        assert!(unmatched.techniques[0].position_id.is_none());
    }
}
