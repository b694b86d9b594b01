//! Structural problems found in a catalog snapshot.
//!
//! None of these stop an index from being built; lookups degrade around
//! them. The report lets a caller surface or repair them.

use std::collections::HashSet;

use serde::Serialize;

use rollbook_core::Error;

use crate::index::TaxonomyIndex;

/// A structural problem in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxonomyIssue {
    /// Two positions share an id; the later one is ignored.
    DuplicatePositionId { position_id: String },
    /// Two techniques share an id; the later one is ignored.
    DuplicateTechniqueId { technique_id: String },
    /// A position's parent id does not resolve.
    DanglingParent {
        position_id: String,
        parent_id: String,
    },
    /// A position's parent chain loops back on itself.
    Cycle { position_id: String },
    /// A stored path disagrees with the path derived from the parent chain.
    PathMismatch {
        position_id: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    /// A technique's owning position does not resolve.
    DanglingTechniquePosition {
        technique_id: String,
        position_id: String,
    },
    /// A technique's destination position does not resolve.
    DanglingDestination {
        technique_id: String,
        position_id: String,
    },
}

impl std::fmt::Display for TaxonomyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePositionId { position_id } => {
                write!(f, "duplicate position id {}", position_id)
            }
            Self::DuplicateTechniqueId { technique_id } => {
                write!(f, "duplicate technique id {}", technique_id)
            }
            Self::DanglingParent {
                position_id,
                parent_id,
            } => write!(
                f,
                "position {} has unknown parent {}",
                position_id, parent_id
            ),
            Self::Cycle { position_id } => {
                write!(f, "position {} is part of a parent cycle", position_id)
            }
            Self::PathMismatch {
                position_id,
                expected,
                actual,
            } => write!(
                f,
                "position {} path {:?} should be {:?}",
                position_id, actual, expected
            ),
            Self::DanglingTechniquePosition {
                technique_id,
                position_id,
            } => write!(
                f,
                "technique {} is owned by unknown position {}",
                technique_id, position_id
            ),
            Self::DanglingDestination {
                technique_id,
                position_id,
            } => write!(
                f,
                "technique {} leads to unknown position {}",
                technique_id, position_id
            ),
        }
    }
}

impl TaxonomyIndex {
    /// Report every structural problem in the snapshot, positions first.
    pub fn diagnostics(&self) -> Vec<TaxonomyIssue> {
        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for p in self.positions() {
            if !seen.insert(p.id.as_str()) {
                issues.push(TaxonomyIssue::DuplicatePositionId {
                    position_id: p.id.clone(),
                });
                continue;
            }

            if let Some(parent) = p.parent_id.as_deref() {
                if self.position(parent).is_none() {
                    issues.push(TaxonomyIssue::DanglingParent {
                        position_id: p.id.clone(),
                        parent_id: parent.to_string(),
                    });
                    continue;
                }
            }

            match self.breadcrumb(&p.id) {
                Err(Error::TaxonomyCycle(_)) => issues.push(TaxonomyIssue::Cycle {
                    position_id: p.id.clone(),
                }),
                Err(_) => {}
                Ok(crumbs) => {
                    // Chains broken further up are reported on the ancestor.
                    let rooted = crumbs.first().is_some_and(|root| root.is_root());
                    let expected: Vec<String> = crumbs.iter().map(|c| c.slug.clone()).collect();
                    if rooted && p.path != expected {
                        issues.push(TaxonomyIssue::PathMismatch {
                            position_id: p.id.clone(),
                            expected,
                            actual: p.path.clone(),
                        });
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for t in self.techniques() {
            if !seen.insert(t.id.as_str()) {
                issues.push(TaxonomyIssue::DuplicateTechniqueId {
                    technique_id: t.id.clone(),
                });
                continue;
            }
            if self.position(&t.position_from_id).is_none() {
                issues.push(TaxonomyIssue::DanglingTechniquePosition {
                    technique_id: t.id.clone(),
                    position_id: t.position_from_id.clone(),
                });
            }
            if let Some(to) = t.position_to_id.as_deref() {
                if self.position(to).is_none() {
                    issues.push(TaxonomyIssue::DanglingDestination {
                        technique_id: t.id.clone(),
                        position_id: to.to_string(),
                    });
                }
            }
        }

        issues
    }
}
