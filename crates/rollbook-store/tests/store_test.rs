//! Store, persistence and mutation working together.

use std::sync::Arc;

use rollbook_core::{
    Catalog, CatalogConfig, CatalogEvent, Error, EventBus, OverlayBackend, Perspective,
    TechniqueCategory,
};
use rollbook_store::{CatalogMutator, CatalogStore, JsonFileBackend, MemoryBackend};

const SYSTEM: &str = r#"{
  "positions": [
    {"id": "guard", "name": "Guard", "slug": "guard", "path": ["guard"], "perspective": "bottom"},
    {"id": "half-guard", "name": "Half Guard", "slug": "half-guard", "parentId": "guard",
     "path": ["guard", "half-guard"], "perspective": "bottom"}
  ],
  "techniques": []
}"#;

fn system() -> Catalog {
    Catalog::from_json(SYSTEM).unwrap()
}

#[test]
fn test_octopus_guard_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overlay.json");

    let store = Arc::new(CatalogStore::open(
        system(),
        Arc::new(JsonFileBackend::new(&path)),
        EventBus::default(),
    ));
    let mutator = CatalogMutator::new(store.clone());
    let index = store.index();
    let octopus = mutator
        .create_position(&index, "Octopus Guard", Some("half-guard"), None)
        .unwrap()
        .unwrap();
    assert_eq!(octopus.path, vec!["guard", "half-guard", "octopus-guard"]);
    assert_eq!(octopus.perspective, Perspective::Bottom);

    // The new position is visible once the index is rebuilt.
    let index = store.index();
    let sweep = mutator
        .create_technique(&index, "Octopus Sweep", TechniqueCategory::Sweep, &octopus.id, None)
        .unwrap()
        .unwrap();

    let reopened = CatalogStore::open(
        system(),
        Arc::new(JsonFileBackend::new(&path)),
        EventBus::default(),
    );
    let index = reopened.index();
    assert_eq!(
        index.full_path(&octopus.id).unwrap(),
        "Guard > Half Guard > Octopus Guard"
    );
    assert_eq!(index.techniques_owned_by(&octopus.id)[0].id, sweep.id);
    assert_eq!(reopened.system().positions.len(), 2);
}

#[test]
fn test_malformed_overlay_resets_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overlay.json");
    std::fs::write(&path, r#"{"positions": [{"id": 42}]"#).unwrap();

    let events = EventBus::default();
    let mut rx = events.subscribe();
    let store = CatalogStore::open(system(), Arc::new(JsonFileBackend::new(&path)), events);

    assert!(store.read().is_empty());
    assert_eq!(store.index().position_count(), 2);
    let envelope = rx.try_recv().unwrap();
    assert!(matches!(envelope.payload, CatalogEvent::OverlayReset { .. }));
    assert_eq!(envelope.event_type, "overlay.reset");

    // The next write replaces the unreadable document.
    let mutator = CatalogMutator::new(Arc::new(store));
    mutator.create_tag("Open Mat").unwrap().unwrap();
    let reloaded = JsonFileBackend::new(&path).load().unwrap().unwrap();
    assert_eq!(reloaded.tags[0].name, "Open Mat");
}

#[tokio::test]
async fn test_subscribers_see_each_write() {
    let store = Arc::new(CatalogStore::open(
        system(),
        Arc::new(MemoryBackend::new()),
        EventBus::default(),
    ));
    let mut rx = store.subscribe();
    let mutator = CatalogMutator::new(store.clone());

    let index = store.index();
    let position = mutator
        .create_position(&index, "Knee Shield", Some("half-guard"), None)
        .unwrap()
        .unwrap();
    mutator.create_tag("Comp").unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.revision, 1);
    assert!(first.payload.invalidates_index());
    assert_eq!(
        first.payload,
        CatalogEvent::PositionCreated {
            position_id: position.id.clone(),
            name: "Knee Shield".to_string(),
        }
    );

    let second = rx.recv().await.unwrap();
    assert_eq!(second.revision, 2);
    assert_eq!(second.event_type, "tag.created");
    assert!(!second.payload.invalidates_index());
}

#[test]
fn test_from_config_requires_system_catalog() {
    let err = CatalogStore::from_config(&CatalogConfig::default(), EventBus::default()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    std::fs::write(&catalog_path, SYSTEM).unwrap();
    let config = CatalogConfig {
        system_catalog_path: Some(catalog_path),
        overlay_path: Some(dir.path().join("overlay.json")),
    };
    let store = CatalogStore::from_config(&config, EventBus::default()).unwrap();
    assert_eq!(store.index().position_count(), 2);
    assert!(store.read().is_empty());
}
