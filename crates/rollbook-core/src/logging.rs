//! Structured logging schema and field name constants for rollbook.
//!
//! All crates use these constants as `tracing` field names
//! (`info!({ SUBSYSTEM } = "store", ...)`), so log tooling can query the
//! same names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Corrupted catalog data the caller must act on |
//! | WARN  | Recoverable issue, automatic fallback applied (overlay reset, dangling reference) |
//! | INFO  | Lifecycle events (index built, overlay loaded/saved, entry created) |
//! | DEBUG | Decision points (match accepted/rejected, context override) |
//! | TRACE | Per-item iteration (candidate scores) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "taxonomy", "search", "store", "reconcile", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "index", "position_matcher", "technique_matcher", "mutator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "build", "match_position", "create_technique", "write"
pub const OPERATION: &str = "op";

/// Run-scoped reconciliation identifier.
pub const RUN_ID: &str = "run_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Position id being operated on.
pub const POSITION_ID: &str = "position_id";

/// Technique id being operated on.
pub const TECHNIQUE_ID: &str = "technique_id";

/// Free-text query handed to a matcher.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or lookup.
pub const RESULT_COUNT: &str = "result_count";

/// Number of positions in a snapshot.
pub const POSITION_COUNT: &str = "position_count";

/// Number of techniques in a snapshot.
pub const TECHNIQUE_COUNT: &str = "technique_count";

/// Confidence score of an accepted match.
pub const SCORE: &str = "score";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_unique_snake_case() {
        let fields = [
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            RUN_ID,
            POSITION_ID,
            TECHNIQUE_ID,
            QUERY,
            DURATION_MS,
            RESULT_COUNT,
            POSITION_COUNT,
            TECHNIQUE_COUNT,
            SCORE,
            ERROR_MSG,
        ];
        let unique: HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
        for field in fields {
            assert!(field
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
