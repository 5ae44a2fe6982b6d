//! Change-notification event types

use crate::models::EntityKind;
use serde::{Deserialize, Serialize};

/// What happened to a cache slot or to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreAction {
    /// A full list load replaced the slot's records
    Loaded,
    Created,
    Updated,
    /// Soft delete acknowledged by the server
    Deleted,
    Restored,
    /// Hard delete, the record is gone for good
    Purged,
    SessionStarted,
    SessionEnded,
}

/// An event emitted after a successful state change
///
/// Must be Clone for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Slot that changed (`User` for session events)
    pub entity_type: EntityKind,
    pub action: StoreAction,
    /// The affected record, for single-record mutations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Number of records, for loads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl StoreEvent {
    /// Create a new StoreEvent with the current timestamp
    pub fn new(entity_type: EntityKind, action: StoreAction) -> Self {
        Self {
            entity_type,
            action,
            entity_id: None,
            count: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// Sink for store events. Emitting must never block or fail.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: StoreEvent);
}
