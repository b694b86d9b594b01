//! Position and technique matchers over a taxonomy snapshot.
//!
//! Both matchers are rebuilt together whenever a new [`TaxonomyIndex`] is
//! built. They never fail: a query that matches nothing within the
//! threshold yields `None`.

use std::time::Instant;

use tracing::{debug, warn};

use rollbook_core::{normalize_text, Candidate, EntityMatch, Matcher, MatchingConfig};
use rollbook_core::logging::{
    COMPONENT, DURATION_MS, ERROR_MSG, OPERATION, POSITION_COUNT, POSITION_ID, QUERY, SCORE,
    SUBSYSTEM, TECHNIQUE_COUNT,
};
use rollbook_taxonomy::TaxonomyIndex;

use crate::matcher::FuzzyIndex;

/// Corpus entry kept alongside the matcher so candidates can be resolved
/// without borrowing the taxonomy.
#[derive(Debug, Clone)]
struct Entry {
    id: String,
    name: String,
    /// Owning position id (techniques only).
    position_from_id: Option<String>,
}

impl Entry {
    fn to_match(&self, candidate: &Candidate) -> EntityMatch {
        EntityMatch {
            entity_id: self.id.clone(),
            entity_name: self.name.clone(),
            score: candidate.score(),
        }
    }
}

/// Breadcrumb names rendered as one searchable string.
///
/// A position caught in a parent cycle contributes its own name only.
fn path_text(index: &TaxonomyIndex, position_id: &str) -> String {
    match index.breadcrumb(position_id) {
        Ok(crumbs) => crumbs
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        Err(e) => {
            warn!(
                { SUBSYSTEM } = "search",
                { POSITION_ID } = position_id,
                { ERROR_MSG } = %e,
                "Cannot render breadcrumb for matcher key"
            );
            index
                .position(position_id)
                .map(|p| p.name.clone())
                .unwrap_or_default()
        }
    }
}

/// Fuzzy matchers for positions and techniques.
pub struct EntityMatchers {
    positions: Box<dyn Matcher>,
    techniques: Box<dyn Matcher>,
    position_entries: Vec<Entry>,
    technique_entries: Vec<Entry>,
    threshold: f32,
}

impl std::fmt::Debug for EntityMatchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMatchers")
            .field("positions", &self.position_entries.len())
            .field("techniques", &self.technique_entries.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl EntityMatchers {
    /// Build both matchers with the default [`FuzzyIndex`] scorer.
    ///
    /// Position keys: name, slug, breadcrumb text. Technique keys: name,
    /// each alias, owning position's breadcrumb text.
    pub fn build(index: &TaxonomyIndex, config: &MatchingConfig) -> Self {
        let start = Instant::now();

        let position_docs = index.positions().iter().map(|p| {
            vec![
                (p.name.clone(), config.position_name_weight),
                (p.slug.clone(), config.position_slug_weight),
                (path_text(index, &p.id), config.position_path_weight),
            ]
        });
        let positions = FuzzyIndex::new(position_docs, config.threshold);

        let technique_docs = index.techniques().iter().map(|t| {
            let mut fields = Vec::with_capacity(t.aliases.len() + 2);
            fields.push((t.name.clone(), config.technique_name_weight));
            for alias in &t.aliases {
                fields.push((alias.clone(), config.technique_alias_weight));
            }
            if index.position(&t.position_from_id).is_some() {
                fields.push((
                    path_text(index, &t.position_from_id),
                    config.technique_path_weight,
                ));
            }
            fields
        });
        let techniques = FuzzyIndex::new(technique_docs, config.threshold);

        let matchers = Self::with_matchers(index, Box::new(positions), Box::new(techniques), config);

        debug!(
            { SUBSYSTEM } = "search",
            { COMPONENT } = "entity_matchers",
            { OPERATION } = "build",
            { POSITION_COUNT } = matchers.position_entries.len(),
            { TECHNIQUE_COUNT } = matchers.technique_entries.len(),
            { DURATION_MS } = start.elapsed().as_millis() as u64,
            "Entity matchers built"
        );

        matchers
    }

    /// Wrap caller-supplied matchers.
    ///
    /// `positions` must be built over `index.positions()` and `techniques`
    /// over `index.techniques()`, in the same order, so candidate indices
    /// resolve to the right entity. Candidates out of range or beyond the
    /// configured threshold are dropped.
    pub fn with_matchers(
        index: &TaxonomyIndex,
        positions: Box<dyn Matcher>,
        techniques: Box<dyn Matcher>,
        config: &MatchingConfig,
    ) -> Self {
        let position_entries = index
            .positions()
            .iter()
            .map(|p| Entry {
                id: p.id.clone(),
                name: p.name.clone(),
                position_from_id: None,
            })
            .collect();
        let technique_entries = index
            .techniques()
            .iter()
            .map(|t| Entry {
                id: t.id.clone(),
                name: t.name.clone(),
                position_from_id: Some(t.position_from_id.clone()),
            })
            .collect();

        Self {
            positions,
            techniques,
            position_entries,
            technique_entries,
            threshold: config.threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Ranked candidates that resolve to an entry and clear the threshold.
    fn ranked<'a>(
        &self,
        matcher: &dyn Matcher,
        entries: &'a [Entry],
        query: &str,
    ) -> Vec<(&'a Entry, Candidate)> {
        if normalize_text(query).is_empty() {
            return Vec::new();
        }
        matcher
            .search(query)
            .into_iter()
            .filter(|c| c.distance <= self.threshold)
            .filter_map(|c| entries.get(c.index).map(|e| (e, c)))
            .collect()
    }

    /// Best position for `query`, or `None` when nothing is close enough.
    pub fn match_position(&self, query: &str) -> Option<EntityMatch> {
        let result = self
            .ranked(self.positions.as_ref(), &self.position_entries, query)
            .first()
            .map(|(entry, c)| entry.to_match(c));

        debug!(
            { SUBSYSTEM } = "search",
            { OPERATION } = "match_position",
            { QUERY } = query,
            matched = result.as_ref().map(|m| m.entity_id.as_str()),
            { SCORE } = result.as_ref().map(|m| m.score),
            "Position match"
        );
        result
    }

    /// Best technique for `query`.
    ///
    /// With a context position, the best in-threshold technique owned by
    /// that position wins over any better-scoring technique elsewhere.
    /// Without one, or when no owned technique qualifies, the global best
    /// is returned.
    pub fn match_technique(
        &self,
        query: &str,
        context_position_id: Option<&str>,
    ) -> Option<EntityMatch> {
        let ranked = self.ranked(self.techniques.as_ref(), &self.technique_entries, query);

        let in_context = context_position_id.and_then(|ctx| {
            ranked
                .iter()
                .find(|(entry, _)| entry.position_from_id.as_deref() == Some(ctx))
        });
        let result = in_context
            .or_else(|| ranked.first())
            .map(|(entry, c)| entry.to_match(c));

        debug!(
            { SUBSYSTEM } = "search",
            { OPERATION } = "match_technique",
            { QUERY } = query,
            context_position_id,
            in_context = in_context.is_some(),
            matched = result.as_ref().map(|m| m.entity_id.as_str()),
            { SCORE } = result.as_ref().map(|m| m.score),
            "Technique match"
        );
        result
    }

    /// Up to `limit` positions for `query`, best first.
    pub fn search_positions(&self, query: &str, limit: usize) -> Vec<EntityMatch> {
        self.ranked(self.positions.as_ref(), &self.position_entries, query)
            .into_iter()
            .take(limit)
            .map(|(entry, c)| entry.to_match(&c))
            .collect()
    }

    /// Up to `limit` techniques for `query`, best first.
    pub fn search_techniques(&self, query: &str, limit: usize) -> Vec<EntityMatch> {
        self.ranked(self.techniques.as_ref(), &self.technique_entries, query)
            .into_iter()
            .take(limit)
            .map(|(entry, c)| entry.to_match(&c))
            .collect()
    }
}
