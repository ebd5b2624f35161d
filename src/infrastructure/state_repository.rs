use crate::domain::models::{CalendarEvent, ChatMessage, Task};
use crate::infrastructure::error::CoreError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Everything the demo/offline store owns, persisted as one JSON blob per
/// anonymous session. Id counters are monotonically increasing and never
/// reused after deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DemoState {
    pub next_task_id: u64,
    pub next_event_id: u64,
    pub tasks: Vec<Task>,
    pub events: Vec<CalendarEvent>,
    pub messages: Vec<ChatMessage>,
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            next_task_id: 1,
            next_event_id: 1,
            tasks: Vec::new(),
            events: Vec::new(),
            messages: Vec::new(),
        }
    }
}

pub trait DemoStateRepository: Send + Sync {
    /// Load the blob for a session. A missing or malformed blob loads as
    /// `None`; the caller substitutes defaults.
    fn load(&self, session_id: &str) -> Result<Option<DemoState>, CoreError>;
    fn save(&self, session_id: &str, state: &DemoState) -> Result<(), CoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteDemoStateRepository {
    db_path: PathBuf,
}

impl SqliteDemoStateRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, CoreError> {
        Connection::open(&self.db_path).map_err(CoreError::from)
    }
}

impl DemoStateRepository for SqliteDemoStateRepository {
    fn load(&self, session_id: &str) -> Result<Option<DemoState>, CoreError> {
        let connection = self.connect()?;
        let payload: Option<String> = connection
            .query_row(
                "SELECT payload FROM demo_state WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(payload) = payload else {
            return Ok(None);
        };
        // Best-effort demo state: a corrupt row reads as absent.
        Ok(serde_json::from_str(&payload).ok())
    }

    fn save(&self, session_id: &str, state: &DemoState) -> Result<(), CoreError> {
        let payload = serde_json::to_string(state)?;
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO demo_state (session_id, payload, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET
               payload = excluded.payload,
               updated_at = excluded.updated_at",
            params![session_id, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDemoStateRepository {
    blobs: Mutex<HashMap<String, DemoState>>,
}

impl DemoStateRepository for InMemoryDemoStateRepository {
    fn load(&self, session_id: &str) -> Result<Option<DemoState>, CoreError> {
        let blobs = self.blobs.lock().map_err(|error| {
            CoreError::InvalidInput(format!("demo state lock poisoned: {error}"))
        })?;
        Ok(blobs.get(session_id).cloned())
    }

    fn save(&self, session_id: &str, state: &DemoState) -> Result<(), CoreError> {
        let mut blobs = self.blobs.lock().map_err(|error| {
            CoreError::InvalidInput(format!("demo state lock poisoned: {error}"))
        })?;
        blobs.insert(session_id.to_string(), state.clone());
        Ok(())
    }
}
