//! Catalog change events and the event bus used to notify subscribers.
//!
//! The catalog store is the only mutable resource in rollbook. After each
//! snapshot replacement it emits a [`CatalogEvent`] on the [`EventBus`];
//! consumers (index rebuilders, UIs, persistence hooks) subscribe
//! independently and each receive their own stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Versioned envelope around a [`CatalogEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// Namespaced event type (e.g. `"position.created"`).
    pub event_type: String,
    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Overlay revision after the change that produced this event.
    pub revision: u64,
    /// Domain-specific event data.
    pub payload: CatalogEvent,
}

impl EventEnvelope {
    /// Wrap an event produced at the given overlay revision.
    pub fn new(event: CatalogEvent, revision: u64) -> Self {
        Self {
            event_id: crate::ids::new_run_id(),
            event_type: event.namespaced_event_type().to_string(),
            occurred_at: Utc::now(),
            revision,
            payload: event,
        }
    }
}

/// A change to the overlay catalog.
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"PositionCreated","position_id":"custom-…","name":"Octopus Guard"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// The overlay was loaded from its backend.
    OverlayLoaded { positions: usize, techniques: usize },
    /// A persisted overlay could not be read and was replaced by an empty one.
    OverlayReset { reason: String },
    /// An arbitrary updater replaced the overlay.
    OverlayReplaced { positions: usize, techniques: usize },
    PositionCreated { position_id: String, name: String },
    TechniqueCreated {
        technique_id: String,
        name: String,
        position_from_id: String,
    },
    TagCreated { tag_id: String, name: String },
    ProgressUpdated { technique_id: String, status: String },
}

impl CatalogEvent {
    /// Dot-namespaced event type.
    pub fn namespaced_event_type(&self) -> &'static str {
        match self {
            Self::OverlayLoaded { .. } => "overlay.loaded",
            Self::OverlayReset { .. } => "overlay.reset",
            Self::OverlayReplaced { .. } => "overlay.replaced",
            Self::PositionCreated { .. } => "position.created",
            Self::TechniqueCreated { .. } => "technique.created",
            Self::TagCreated { .. } => "tag.created",
            Self::ProgressUpdated { .. } => "progress.updated",
        }
    }

    /// Whether this event changes positions or techniques, meaning any
    /// taxonomy index built before it is stale.
    pub fn invalidates_index(&self) -> bool {
        !matches!(
            self,
            Self::TagCreated { .. } | Self::ProgressUpdated { .. }
        )
    }
}

/// Broadcast bus for catalog change notifications.
///
/// Cloning the bus yields another handle on the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers. Dropped silently when nobody listens.
    pub fn emit(&self, event: CatalogEvent, revision: u64) {
        let envelope = EventEnvelope::new(event, revision);
        tracing::debug!(
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            revision,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive events. Each subscriber gets its own stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}
