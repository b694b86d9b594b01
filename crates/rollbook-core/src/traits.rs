//! Core traits for rollbook abstractions.
//!
//! These traits define the seams where concrete implementations plug in:
//! the approximate string search behind the entity matchers, and the backend
//! that persists the overlay document.

use crate::error::Result;
use crate::models::OverlayDocument;

// =============================================================================
// APPROXIMATE SEARCH
// =============================================================================

/// A ranked search result: the position of the document in the matcher's
/// corpus and its distance from the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Index of the matched document in the corpus the matcher was built on.
    pub index: usize,
    /// Distance in [0, 1]; 0 is identical, lower is better.
    pub distance: f32,
}

impl Candidate {
    /// External confidence score (`1 - distance`).
    pub fn score(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Approximate string search over a fixed corpus.
///
/// Implementations must return candidates sorted by ascending distance and
/// must only return candidates whose distance is within their configured
/// threshold. Any scoring model (edit distance, trigram, token matching)
/// satisfies the contract as long as lower distance means a better match.
pub trait Matcher: Send + Sync {
    /// Rank the corpus against `query`. Blank queries return no candidates.
    fn search(&self, query: &str) -> Vec<Candidate>;

    /// Number of documents in the corpus.
    fn len(&self) -> usize;

    /// Whether the corpus is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// OVERLAY PERSISTENCE
// =============================================================================

/// Storage for the overlay document.
pub trait OverlayBackend: Send + Sync {
    /// Load the persisted overlay.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet, and an error
    /// when the stored document cannot be read or decoded.
    fn load(&self) -> Result<Option<OverlayDocument>>;

    /// Persist the overlay, replacing any previous document.
    fn save(&self, overlay: &OverlayDocument) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_score_inverts_distance() {
        let c = Candidate {
            index: 0,
            distance: 0.25,
        };
        assert!((c.score() - 0.75).abs() < f32::EPSILON);
    }
}
