//! Durable storage for the session snapshot

use super::SessionError;
use crate::models::User;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key the snapshot is stored under
pub const STORAGE_KEY: &str = "auth-storage";

/// The persisted part of the session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

/// Key-value store surviving process restarts
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<SessionSnapshot>, SessionError>;
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

// ============================================================================
// File storage
// ============================================================================

/// JSON file holding an object keyed by storage key.
///
/// Other keys in the file are preserved on write.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(SessionError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "Session file is not a JSON object, ignoring it");
                Ok(Map::new())
            }
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SessionError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| {
            SessionError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        let document = self.read_document()?;
        let Some(value) = document.get(STORAGE_KEY) else {
            debug!(path = %self.path.display(), "No stored session");
            return Ok(None);
        };
        match serde_json::from_value(value.clone()) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!(error = %e, "Stored session is unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        let mut document = self.read_document()?;
        let value =
            serde_json::to_value(snapshot).map_err(|e| SessionError::Storage(e.to_string()))?;
        document.insert(STORAGE_KEY.to_string(), value);
        self.write_document(&document)
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut document = self.read_document()?;
        if document.remove(STORAGE_KEY).is_none() {
            return Ok(());
        }
        self.write_document(&document)
    }
}

// ============================================================================
// Memory storage
// ============================================================================

/// Process-local storage, for tests and one-shot runs
#[derive(Default)]
pub struct MemorySessionStorage {
    snapshot: Mutex<Option<SessionSnapshot>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
