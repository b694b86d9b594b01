//! Creation of user-defined catalog entries.
//!
//! Every operation validates its references against a taxonomy index built
//! from the store, derives the new entry's identity, and folds it into the
//! overlay through the store. The system catalog is never touched.
//!
//! Invalid requests yield `Ok(None)`; `Err` is reserved for overlay
//! persistence failures. A name is invalid when it has no letters or digits
//! ("", "  ", "???"), since the slug and id are derived from them.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use rollbook_core::{
    custom_id, slugify, CatalogEvent, Perspective, Position, ProgressRecord, ProgressStatus,
    Result, Tag, Technique, TechniqueCategory,
};
use rollbook_core::logging::{OPERATION, POSITION_ID, SUBSYSTEM, TECHNIQUE_ID};
use rollbook_taxonomy::TaxonomyIndex;

use crate::repository::CatalogStore;

/// Writes new positions, techniques, tags and progress into the overlay.
#[derive(Debug, Clone)]
pub struct CatalogMutator {
    store: Arc<CatalogStore>,
}

impl CatalogMutator {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Create a custom position under `parent_id` (or as a root).
    ///
    /// Returns `None` when the name has no letters or digits, or when the
    /// parent does not resolve. Perspective is the explicit one, else the
    /// parent's, else neutral. The path extends the parent's breadcrumb slugs
    /// with the new slug.
    pub fn create_position(
        &self,
        index: &TaxonomyIndex,
        name: &str,
        parent_id: Option<&str>,
        perspective: Option<Perspective>,
    ) -> Result<Option<Position>> {
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() {
            debug!(
                { SUBSYSTEM } = "store",
                { OPERATION } = "create_position",
                "Rejected blank position name"
            );
            return Ok(None);
        }

        let parent = match parent_id {
            None => None,
            Some(id) => match index.position(id) {
                Some(parent) => Some(parent),
                None => {
                    debug!(
                        { SUBSYSTEM } = "store",
                        { OPERATION } = "create_position",
                        parent_id = id,
                        "Rejected unknown parent position"
                    );
                    return Ok(None);
                }
            },
        };

        let mut path = match parent {
            Some(parent) if !parent.path.is_empty() => parent.path.clone(),
            Some(parent) => index
                .breadcrumb(&parent.id)?
                .iter()
                .map(|p| p.slug.clone())
                .collect(),
            None => Vec::new(),
        };
        path.push(slug.clone());

        let position = Position {
            id: custom_id(&slug),
            name: name.to_string(),
            slug,
            parent_id: parent.map(|p| p.id.clone()),
            path,
            perspective: perspective
                .or(parent.map(|p| p.perspective))
                .unwrap_or_default(),
            gi: true,
            nogi: true,
            is_custom: true,
        };

        let created = position.clone();
        self.store.apply(move |doc| {
            let mut next = doc.clone();
            let event = CatalogEvent::PositionCreated {
                position_id: created.id.clone(),
                name: created.name.clone(),
            };
            next.positions.push(created);
            (next, event)
        })?;

        Ok(Some(position))
    }

    /// Create a custom technique owned by `position_from_id`.
    ///
    /// Returns `None` when the name has no letters or digits, or when either
    /// position id does not resolve.
    pub fn create_technique(
        &self,
        index: &TaxonomyIndex,
        name: &str,
        category: TechniqueCategory,
        position_from_id: &str,
        position_to_id: Option<&str>,
    ) -> Result<Option<Technique>> {
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() {
            debug!(
                { SUBSYSTEM } = "store",
                { OPERATION } = "create_technique",
                "Rejected blank technique name"
            );
            return Ok(None);
        }
        let unresolved = std::iter::once(position_from_id)
            .chain(position_to_id)
            .find(|id| index.position(id).is_none());
        if let Some(id) = unresolved {
            debug!(
                { SUBSYSTEM } = "store",
                { OPERATION } = "create_technique",
                { POSITION_ID } = id,
                "Rejected unknown position"
            );
            return Ok(None);
        }

        let technique = Technique {
            id: custom_id(&slug),
            name: name.to_string(),
            category,
            position_from_id: position_from_id.to_string(),
            position_to_id: position_to_id.map(str::to_string),
            submission_type: None,
            gi: true,
            nogi: true,
            aliases: Vec::new(),
            key_details: None,
            is_custom: true,
        };

        let created = technique.clone();
        self.store.apply(move |doc| {
            let mut next = doc.clone();
            let event = CatalogEvent::TechniqueCreated {
                technique_id: created.id.clone(),
                name: created.name.clone(),
                position_from_id: created.position_from_id.clone(),
            };
            next.techniques.push(created);
            (next, event)
        })?;

        Ok(Some(technique))
    }

    /// Create a tag, or return the existing tag with the same slug.
    pub fn create_tag(&self, name: &str) -> Result<Option<Tag>> {
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() {
            return Ok(None);
        }
        if let Some(existing) = self.store.read().tags.iter().find(|t| t.slug == slug) {
            return Ok(Some(existing.clone()));
        }

        let tag = Tag {
            id: custom_id(&slug),
            name: name.to_string(),
            slug,
        };
        let created = tag.clone();
        self.store.apply(move |doc| {
            let mut next = doc.clone();
            let event = CatalogEvent::TagCreated {
                tag_id: created.id.clone(),
                name: created.name.clone(),
            };
            next.tags.push(created);
            (next, event)
        })?;

        Ok(Some(tag))
    }

    /// Record progress on a technique, replacing any earlier record for it.
    pub fn set_progress(
        &self,
        index: &TaxonomyIndex,
        technique_id: &str,
        status: ProgressStatus,
    ) -> Result<Option<ProgressRecord>> {
        if index.technique(technique_id).is_none() {
            debug!(
                { SUBSYSTEM } = "store",
                { OPERATION } = "set_progress",
                { TECHNIQUE_ID } = technique_id,
                "Rejected unknown technique"
            );
            return Ok(None);
        }

        let record = ProgressRecord {
            technique_id: technique_id.to_string(),
            status,
            updated_at: Utc::now(),
        };
        let updated = record.clone();
        self.store.apply(move |doc| {
            let mut next = doc.clone();
            let event = CatalogEvent::ProgressUpdated {
                technique_id: updated.technique_id.clone(),
                status: updated.status.to_string(),
            };
            match next
                .progress
                .iter_mut()
                .find(|p| p.technique_id == updated.technique_id)
            {
                Some(existing) => *existing = updated,
                None => next.progress.push(updated),
            }
            (next, event)
        })?;

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use rollbook_core::{is_custom_id, Catalog, EventBus};

    const SYSTEM: &str = r#"{
      "positions": [
        {"id": "guard", "name": "Guard", "slug": "guard", "path": ["guard"], "perspective": "bottom"},
        {"id": "mount", "name": "Mount", "slug": "mount", "perspective": "top"}
      ],
      "techniques": [
        {"id": "armbar-mount", "name": "Armbar", "category": "submission", "positionFromId": "mount"}
      ]
    }"#;

    fn mutator() -> CatalogMutator {
        let store = CatalogStore::open(
            Catalog::from_json(SYSTEM).unwrap(),
            Arc::new(MemoryBackend::new()),
            EventBus::default(),
        );
        CatalogMutator::new(Arc::new(store))
    }

    #[test]
    fn test_create_position_inherits_path_and_perspective() {
        let m = mutator();
        let index = m.store().index();
        let p = m
            .create_position(&index, "  Octopus Guard ", Some("guard"), None)
            .unwrap()
            .unwrap();

        assert_eq!(p.name, "Octopus Guard");
        assert_eq!(p.slug, "octopus-guard");
        assert_eq!(p.path, vec!["guard", "octopus-guard"]);
        assert_eq!(p.perspective, Perspective::Bottom);
        assert!(p.is_custom && is_custom_id(&p.id));
        assert!(p.id.starts_with("custom-octopus-guard-"));
        assert_eq!(m.store().read().positions, vec![p]);
    }

    #[test]
    fn test_create_position_path_from_breadcrumb_when_parent_has_none() {
        let m = mutator();
        let index = m.store().index();
        let p = m
            .create_position(&index, "S-Mount", Some("mount"), Some(Perspective::Neutral))
            .unwrap()
            .unwrap();
        assert_eq!(p.path, vec!["mount", "s-mount"]);
        assert_eq!(p.perspective, Perspective::Neutral);
    }

    #[test]
    fn test_create_root_position() {
        let m = mutator();
        let index = m.store().index();
        let p = m.create_position(&index, "Turtle", None, None).unwrap().unwrap();
        assert!(p.is_root());
        assert_eq!(p.path, vec!["turtle"]);
        assert_eq!(p.perspective, Perspective::Neutral);
    }

    #[test]
    fn test_create_position_rejects_invalid_input() {
        let m = mutator();
        let index = m.store().index();
        assert!(m.create_position(&index, "   ", None, None).unwrap().is_none());
        assert!(m.create_position(&index, "???", None, None).unwrap().is_none());
        assert!(m.create_position(&index, " -- ", Some("guard"), None).unwrap().is_none());
        assert!(m
            .create_position(&index, "Lasso", Some("nope"), None)
            .unwrap()
            .is_none());
        assert!(m.store().read().is_empty());
    }

    #[test]
    fn test_create_technique() {
        let m = mutator();
        let index = m.store().index();
        let t = m
            .create_technique(&index, "Pendulum Sweep", TechniqueCategory::Sweep, "guard", Some("mount"))
            .unwrap()
            .unwrap();
        assert_eq!(t.position_to_id.as_deref(), Some("mount"));
        assert!(t.id.starts_with("custom-pendulum-sweep-"));

        assert!(m
            .create_technique(&index, "", TechniqueCategory::Sweep, "guard", None)
            .unwrap()
            .is_none());
        assert!(m
            .create_technique(&index, "?!", TechniqueCategory::Sweep, "guard", None)
            .unwrap()
            .is_none());
        assert!(m
            .create_technique(&index, "X", TechniqueCategory::Pass, "nowhere", None)
            .unwrap()
            .is_none());
        assert!(m
            .create_technique(&index, "X", TechniqueCategory::Pass, "guard", Some("nowhere"))
            .unwrap()
            .is_none());
        assert_eq!(m.store().read().techniques.len(), 1);
    }

    #[test]
    fn test_create_tag_dedupes_by_slug() {
        let m = mutator();
        let first = m.create_tag("Comp Prep").unwrap().unwrap();
        let second = m.create_tag("comp   prep!").unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(m.store().read().tags.len(), 1);
        assert!(m.create_tag(" ").unwrap().is_none());
    }

    #[test]
    fn test_set_progress_upserts() {
        let m = mutator();
        let index = m.store().index();
        m.set_progress(&index, "armbar-mount", ProgressStatus::Learning)
            .unwrap()
            .unwrap();
        let latest = m
            .set_progress(&index, "armbar-mount", ProgressStatus::Drilling)
            .unwrap()
            .unwrap();

        let overlay = m.store().read();
        assert_eq!(overlay.progress.len(), 1);
        assert_eq!(overlay.progress[0], latest);
        assert!(m
            .set_progress(&index, "missing", ProgressStatus::Applying)
            .unwrap()
            .is_none());
    }
}
