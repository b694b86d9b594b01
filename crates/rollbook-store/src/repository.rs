//! The catalog store: the fixed system catalog plus the mutable overlay.
//!
//! Readers take the current overlay as an `Arc` and never block writers for
//! longer than a pointer clone. Writers are serialized by a gate that
//! readers never touch. A writer computes a new overlay from the current
//! one, persists it, swaps it in and bumps the revision, then emits a
//! [`CatalogEvent`] on the injected [`EventBus`].

use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::broadcast;
use tracing::{info, warn};

use rollbook_core::{
    Catalog, CatalogConfig, CatalogEvent, Error, EventBus, EventEnvelope, OverlayBackend,
    OverlayDocument, Result,
};
use rollbook_core::logging::{ERROR_MSG, OPERATION, SUBSYSTEM};
use rollbook_taxonomy::TaxonomyIndex;

use crate::backend::JsonFileBackend;

#[derive(Debug)]
struct OverlayState {
    overlay: Arc<OverlayDocument>,
    revision: u64,
}

/// Repository owning the system catalog and the overlay snapshot.
pub struct CatalogStore {
    system: Arc<Catalog>,
    state: RwLock<OverlayState>,
    /// Held for a whole write, so updaters run one at a time.
    write_gate: Mutex<()>,
    backend: Arc<dyn OverlayBackend>,
    events: EventBus,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("system_positions", &self.system.positions.len())
            .field("system_techniques", &self.system.techniques.len())
            .field("backend", &self.backend.describe())
            .field("revision", &self.revision())
            .finish()
    }
}

/// Read the system catalog JSON file.
pub fn load_system_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Storage(format!(
            "cannot read system catalog {}: {}",
            path.display(),
            e
        ))
    })?;
    Catalog::from_json(&content)
}

impl CatalogStore {
    /// Open the store, loading the overlay from `backend`.
    ///
    /// An overlay that cannot be read is treated as absent: the store starts
    /// with an empty overlay and emits [`CatalogEvent::OverlayReset`]. The
    /// unreadable document is left in place until the next write replaces
    /// it.
    pub fn open(system: Catalog, backend: Arc<dyn OverlayBackend>, events: EventBus) -> Self {
        let (overlay, event) = match backend.load() {
            Ok(Some(overlay)) => {
                let event = CatalogEvent::OverlayLoaded {
                    positions: overlay.positions.len(),
                    techniques: overlay.techniques.len(),
                };
                (overlay, event)
            }
            Ok(None) => (
                OverlayDocument::default(),
                CatalogEvent::OverlayLoaded {
                    positions: 0,
                    techniques: 0,
                },
            ),
            Err(e) => {
                warn!(
                    { SUBSYSTEM } = "store",
                    backend = %backend.describe(),
                    { ERROR_MSG } = %e,
                    "Overlay unreadable; starting with an empty overlay"
                );
                (
                    OverlayDocument::default(),
                    CatalogEvent::OverlayReset {
                        reason: e.to_string(),
                    },
                )
            }
        };

        info!(
            { SUBSYSTEM } = "store",
            { OPERATION } = "open",
            backend = %backend.describe(),
            system_positions = system.positions.len(),
            system_techniques = system.techniques.len(),
            overlay_positions = overlay.positions.len(),
            overlay_techniques = overlay.techniques.len(),
            "Catalog store opened"
        );

        let store = Self {
            system: Arc::new(system),
            state: RwLock::new(OverlayState {
                overlay: Arc::new(overlay),
                revision: 0,
            }),
            write_gate: Mutex::new(()),
            backend,
            events,
        };
        store.events.emit(event, 0);
        store
    }

    /// Open the store from configuration: system catalog JSON plus a JSON
    /// file overlay.
    pub fn from_config(config: &CatalogConfig, events: EventBus) -> Result<Self> {
        let system_path = config.system_catalog_path.as_deref().ok_or_else(|| {
            Error::Config("catalog.system_catalog_path is not set".to_string())
        })?;
        let system = load_system_catalog(system_path)?;
        let backend = JsonFileBackend::new(config.overlay_path_or_default());
        Ok(Self::open(system, Arc::new(backend), events))
    }

    pub fn system(&self) -> Arc<Catalog> {
        Arc::clone(&self.system)
    }

    /// The current overlay snapshot.
    pub fn read(&self) -> Arc<OverlayDocument> {
        match self.state.read() {
            Ok(state) => Arc::clone(&state.overlay),
            Err(poisoned) => Arc::clone(&poisoned.into_inner().overlay),
        }
    }

    /// Number of successful writes since the store was opened.
    pub fn revision(&self) -> u64 {
        match self.state.read() {
            Ok(state) => state.revision,
            Err(poisoned) => poisoned.into_inner().revision,
        }
    }

    /// The merged working catalog: system records, then overlay records.
    pub fn snapshot(&self) -> Catalog {
        Catalog::merged(&self.system, &self.read())
    }

    /// Build a taxonomy index over the current snapshot.
    pub fn index(&self) -> TaxonomyIndex {
        TaxonomyIndex::from_parts(&self.system, &self.read())
    }

    /// Receive an event after every overlay change.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Replace the overlay with `updater(current)`.
    ///
    /// Returns the new revision. Nothing changes if persisting fails.
    ///
    /// The updater may read the store (`read`, `index`, `snapshot`,
    /// `revision`). It must not call `write` on the same store, which would
    /// block on the write gate.
    pub fn write<F>(&self, updater: F) -> Result<u64>
    where
        F: FnOnce(&OverlayDocument) -> OverlayDocument,
    {
        self.apply(|current| {
            let next = updater(current);
            let event = CatalogEvent::OverlayReplaced {
                positions: next.positions.len(),
                techniques: next.techniques.len(),
            };
            (next, event)
        })
    }

    /// Shared write path: compute, persist, swap, notify.
    pub(crate) fn apply<F>(&self, updater: F) -> Result<u64>
    where
        F: FnOnce(&OverlayDocument) -> (OverlayDocument, CatalogEvent),
    {
        let _gate = self
            .write_gate
            .lock()
            .map_err(|_| Error::Internal("catalog store write gate poisoned".to_string()))?;

        // No other writer can swap the overlay while the gate is held.
        let current = self.read();
        let (next, event) = updater(&current);
        self.backend.save(&next).map_err(|e| {
            warn!(
                { SUBSYSTEM } = "store",
                backend = %self.backend.describe(),
                { ERROR_MSG } = %e,
                "Overlay write failed"
            );
            e
        })?;

        let revision = {
            let mut state = self
                .state
                .write()
                .map_err(|_| Error::Internal("catalog store lock poisoned".to_string()))?;
            state.overlay = Arc::new(next);
            state.revision += 1;
            state.revision
        };

        info!(
            { SUBSYSTEM } = "store",
            { OPERATION } = "write",
            revision,
            event_type = event.namespaced_event_type(),
            "Overlay updated"
        );
        self.events.emit(event, revision);
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use rollbook_core::{Tag, TechniqueCategory};

    struct FailingBackend;

    impl OverlayBackend for FailingBackend {
        fn load(&self) -> Result<Option<OverlayDocument>> {
            Err(Error::Serialization("expected value at line 1".to_string()))
        }

        fn save(&self, _overlay: &OverlayDocument) -> Result<()> {
            Err(Error::Storage("read-only".to_string()))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn tag(name: &str) -> Tag {
        Tag {
            id: format!("custom-{}-aaaaaa", name),
            name: name.to_string(),
            slug: name.to_string(),
        }
    }

    #[test]
    fn test_open_empty_backend() {
        let store = CatalogStore::open(
            Catalog::default(),
            Arc::new(MemoryBackend::new()),
            EventBus::default(),
        );
        assert!(store.read().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_write_persists_and_bumps_revision() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CatalogStore::open(Catalog::default(), backend.clone(), EventBus::default());

        let before = store.read();
        let revision = store
            .write(|doc| {
                let mut next = doc.clone();
                next.tags.push(tag("comp"));
                next
            })
            .unwrap();

        assert_eq!(revision, 1);
        assert!(before.is_empty(), "earlier snapshots are never mutated");
        assert_eq!(store.read().tags.len(), 1);
        assert_eq!(backend.saved().unwrap().tags.len(), 1);
    }

    #[test]
    fn test_unreadable_overlay_resets_and_failed_write_keeps_state() {
        let store = CatalogStore::open(
            Catalog::default(),
            Arc::new(FailingBackend),
            EventBus::default(),
        );
        assert!(store.read().is_empty());

        let result = store.write(|doc| {
            let mut next = doc.clone();
            next.tags.push(tag("x"));
            next
        });
        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(store.read().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_snapshot_appends_overlay() {
        let system = Catalog::from_json(
            r#"{"positions":[{"id":"mount","name":"Mount","slug":"mount"}],
                "techniques":[{"id":"kimura","name":"Kimura","category":"submission","positionFromId":"mount"}]}"#,
        )
        .unwrap();
        let store = CatalogStore::open(system, Arc::new(MemoryBackend::new()), EventBus::default());
        store
            .write(|doc| {
                let mut next = doc.clone();
                let mut technique = store.system().techniques[0].clone();
                technique.id = "custom-kimura-bbbbbb".to_string();
                technique.category = TechniqueCategory::Control;
                technique.is_custom = true;
                next.techniques.push(technique);
                next
            })
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.techniques.len(), 2);
        assert_eq!(snapshot.techniques[0].id, "kimura");
        assert!(snapshot.techniques[1].is_custom);
        assert_eq!(store.index().techniques_owned_by("mount").len(), 2);
    }

    #[test]
    fn test_updater_can_read_the_store() {
        let store = Arc::new(CatalogStore::open(
            Catalog::default(),
            Arc::new(MemoryBackend::new()),
            EventBus::default(),
        ));
        let (tx, rx) = std::sync::mpsc::channel();

        let writer = Arc::clone(&store);
        std::thread::spawn(move || {
            let result = writer.write(|doc| {
                assert!(writer.read().is_empty());
                assert_eq!(writer.revision(), 0);
                assert_eq!(writer.index().position_count(), 0);
                assert!(writer.snapshot().positions.is_empty());
                let _ = format!("{:?}", writer);
                let mut next = doc.clone();
                next.tags.push(tag("inside"));
                next
            });
            let _ = tx.send(result);
        });

        let revision = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("write finished")
            .unwrap();
        assert_eq!(revision, 1);
        assert_eq!(store.read().tags.len(), 1);
    }

    #[test]
    fn test_concurrent_writes_are_serialized() {
        let store = Arc::new(CatalogStore::open(
            Catalog::default(),
            Arc::new(MemoryBackend::new()),
            EventBus::default(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .write(|doc| {
                            let mut next = doc.clone();
                            next.tags.push(tag(&format!("t{}", i)));
                            next
                        })
                        .unwrap()
                })
            })
            .collect();
        let mut revisions: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        revisions.sort_unstable();

        assert_eq!(revisions, (1..=8).collect::<Vec<_>>());
        assert_eq!(store.read().tags.len(), 8);
    }

    #[test]
    fn test_debug_output() {
        let store = CatalogStore::open(
            Catalog::default(),
            Arc::new(MemoryBackend::new()),
            EventBus::default(),
        );
        let out = format!("{:?}", store);
        assert!(out.contains("backend: \"memory\""));
    }
}
