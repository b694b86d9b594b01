//! Weighted multi-field fuzzy index implementing [`Matcher`].
//!
//! Each document carries several searchable fields, each with a weight.
//! A field's raw distance `d` is weighted as `1 - (1 - d) * (w / w_max)`,
//! so only fields at the top weight can reach distance 0. A document's
//! distance is its best weighted field; the mean over all fields breaks
//! ties, then corpus order.

use std::cmp::Ordering;

use tracing::trace;

use rollbook_core::defaults::SCORE_EPSILON;
use rollbook_core::{normalize_text, Candidate, Matcher};
use rollbook_core::logging::{COMPONENT, QUERY, RESULT_COUNT, SUBSYSTEM};

use crate::fuzzy::field_distance;

/// One searchable field of a document, already normalized.
#[derive(Debug, Clone)]
struct Field {
    chars: Vec<char>,
    weight: f32,
}

/// A fuzzy index over a fixed corpus of multi-field documents.
#[derive(Debug, Clone)]
pub struct FuzzyIndex {
    docs: Vec<Vec<Field>>,
    max_weight: f32,
    threshold: f32,
}

/// Distances within [`SCORE_EPSILON`] of each other rank as equal.
fn quantize(distance: f32) -> i64 {
    (distance / SCORE_EPSILON).round() as i64
}

impl FuzzyIndex {
    /// Build an index from `(text, weight)` field lists, one per document.
    ///
    /// Texts are normalized; fields that normalize to nothing are dropped.
    /// Candidates farther than `threshold` are never returned.
    pub fn new<D, F, S>(docs: D, threshold: f32) -> Self
    where
        D: IntoIterator<Item = F>,
        F: IntoIterator<Item = (S, f32)>,
        S: AsRef<str>,
    {
        let docs: Vec<Vec<Field>> = docs
            .into_iter()
            .map(|fields| {
                fields
                    .into_iter()
                    .filter_map(|(text, weight)| {
                        let chars: Vec<char> = normalize_text(text.as_ref()).chars().collect();
                        (!chars.is_empty() && weight > 0.0).then_some(Field { chars, weight })
                    })
                    .collect()
            })
            .collect();

        let max_weight = docs
            .iter()
            .flatten()
            .map(|f| f.weight)
            .fold(0.0f32, f32::max);

        Self {
            docs,
            max_weight: if max_weight > 0.0 { max_weight } else { 1.0 },
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Best weighted field distance and mean weighted distance for a doc.
    fn score_doc(&self, query: &[char], fields: &[Field]) -> Option<(f32, f32)> {
        if fields.is_empty() {
            return None;
        }
        let mut best = f32::INFINITY;
        let mut total = 0.0f32;
        for field in fields {
            let raw = field_distance(query, &field.chars);
            let weighted = 1.0 - (1.0 - raw) * (field.weight / self.max_weight);
            best = best.min(weighted);
            total += weighted;
        }
        Some((best, total / fields.len() as f32))
    }
}

impl Matcher for FuzzyIndex {
    fn search(&self, query: &str) -> Vec<Candidate> {
        let normalized = normalize_text(query);
        if normalized.is_empty() {
            return Vec::new();
        }
        let query: Vec<char> = normalized.chars().collect();

        let mut ranked: Vec<(Candidate, f32)> = self
            .docs
            .iter()
            .enumerate()
            .filter_map(|(index, fields)| {
                let (distance, mean) = self.score_doc(&query, fields)?;
                (distance <= self.threshold).then_some((Candidate { index, distance }, mean))
            })
            .collect();

        ranked.sort_by(|(a, a_mean), (b, b_mean)| {
            quantize(a.distance)
                .cmp(&quantize(b.distance))
                .then_with(|| a_mean.partial_cmp(b_mean).unwrap_or(Ordering::Equal))
                .then_with(|| a.index.cmp(&b.index))
        });

        trace!(
            { SUBSYSTEM } = "search",
            { COMPONENT } = "fuzzy_index",
            { QUERY } = %normalized,
            corpus_size = self.docs.len(),
            { RESULT_COUNT } = ranked.len(),
            "Fuzzy search complete"
        );

        ranked.into_iter().map(|(c, _)| c).collect()
    }

    fn len(&self) -> usize {
        self.docs.len()
    }
}
