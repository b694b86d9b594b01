//! Reconciliation of an extraction payload against the catalog.
//!
//! Reconciliation is read-only: it never touches the payload, the index or
//! the store. Every list item in the result gets a fresh run-scoped id.

use std::time::Instant;

use tracing::{debug, info};

use rollbook_core::{
    new_run_id, ExtractedSparringRound, ExtractionPayload, MatchedExtraction, MatchedName,
    MatchedPositionNote, MatchedSession, MatchedSparringRound, MatchedTechniqueMention,
    MatchingConfig, PositionNote, TechniqueMention,
};
use rollbook_core::logging::{DURATION_MS, OPERATION, POSITION_ID, RUN_ID, SUBSYSTEM, TECHNIQUE_ID};
use rollbook_search::EntityMatchers;
use rollbook_taxonomy::TaxonomyIndex;

use crate::gi::normalize_gi_mode;

/// Resolves extracted names into catalog matches.
#[derive(Debug)]
pub struct Reconciler {
    matchers: EntityMatchers,
}

impl Reconciler {
    /// Build matchers over `index` with the given matching settings.
    pub fn new(index: &TaxonomyIndex, config: &MatchingConfig) -> Self {
        Self {
            matchers: EntityMatchers::build(index, config),
        }
    }

    /// Reconcile with matchers the caller has already built.
    pub fn from_matchers(matchers: EntityMatchers) -> Self {
        Self { matchers }
    }

    pub fn matchers(&self) -> &EntityMatchers {
        &self.matchers
    }

    /// Pair every name in `payload` with its best catalog match.
    pub fn reconcile(&self, payload: &ExtractionPayload) -> MatchedExtraction {
        let start = Instant::now();
        let run_id = new_run_id();
        let session = &payload.session;

        let result = MatchedExtraction {
            session: MatchedSession {
                date: session.date.clone(),
                gi_or_nogi: normalize_gi_mode(&session.gi_or_nogi),
                session_type: session.session_type.clone(),
                techniques: session
                    .techniques
                    .iter()
                    .map(|m| self.technique_mention(m))
                    .collect(),
                position_notes: session
                    .position_notes
                    .iter()
                    .map(|n| self.position_note(n))
                    .collect(),
            },
            sparring_rounds: payload
                .sparring_rounds
                .iter()
                .map(|r| self.sparring_round(r))
                .collect(),
        };

        let unmatched = result.unmatched();
        info!(
            { SUBSYSTEM } = "reconcile",
            { OPERATION } = "reconcile",
            { RUN_ID } = %run_id,
            technique_mentions = result.session.techniques.len(),
            position_notes = result.session.position_notes.len(),
            sparring_rounds = result.sparring_rounds.len(),
            unmatched_positions = unmatched.positions.len(),
            unmatched_techniques = unmatched.techniques.len(),
            { DURATION_MS } = start.elapsed().as_millis() as u64,
            "Extraction reconciled"
        );

        result
    }

    /// The position is resolved first; its id is then the context for the
    /// technique.
    fn technique_mention(&self, mention: &TechniqueMention) -> MatchedTechniqueMention {
        let position_match = self.matchers.match_position(&mention.position_name);
        let context = position_match.as_ref().map(|m| m.entity_id.as_str());
        let technique_match = self.matchers.match_technique(&mention.technique_name, context);

        debug!(
            { SUBSYSTEM } = "reconcile",
            position_name = %mention.position_name,
            technique_name = %mention.technique_name,
            { POSITION_ID } = context,
            { TECHNIQUE_ID } = technique_match.as_ref().map(|m| m.entity_id.as_str()),
            "Technique mention resolved"
        );

        MatchedTechniqueMention {
            id: new_run_id(),
            position_name: mention.position_name.clone(),
            position_match,
            technique_name: mention.technique_name.clone(),
            technique_match,
            notes: mention.notes.clone(),
            key_details: mention.key_details.clone(),
        }
    }

    fn position_note(&self, note: &PositionNote) -> MatchedPositionNote {
        MatchedPositionNote {
            id: new_run_id(),
            position_name: note.position_name.clone(),
            position_match: self.matchers.match_position(&note.position_name),
            notes: note.notes.clone(),
            key_details: note.key_details.clone(),
        }
    }

    /// Submissions carry no stated position, so they are matched without
    /// context.
    fn sparring_round(&self, round: &ExtractedSparringRound) -> MatchedSparringRound {
        let techniques = |names: &[String]| -> Vec<MatchedName> {
            names
                .iter()
                .map(|name| MatchedName {
                    id: new_run_id(),
                    name: name.clone(),
                    entity_match: self.matchers.match_technique(name, None),
                })
                .collect()
        };
        let positions = |names: &[String]| -> Vec<MatchedName> {
            names
                .iter()
                .map(|name| MatchedName {
                    id: new_run_id(),
                    name: name.clone(),
                    entity_match: self.matchers.match_position(name),
                })
                .collect()
        };

        MatchedSparringRound {
            id: new_run_id(),
            partner_name: round.partner_name.clone(),
            partner_belt: round.partner_belt.clone(),
            submissions_for: techniques(&round.submissions_for),
            submissions_against: techniques(&round.submissions_against),
            dominant_positions: positions(&round.dominant_positions),
            stuck_positions: positions(&round.stuck_positions),
            notes: round.notes.clone(),
        }
    }
}

/// Reconcile `payload` against `index` with default matching settings.
pub fn reconcile(payload: &ExtractionPayload, index: &TaxonomyIndex) -> MatchedExtraction {
    Reconciler::new(index, &MatchingConfig::default()).reconcile(payload)
}
