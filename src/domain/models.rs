use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WAKE_HOUR: u32 = 7;
pub const DEFAULT_SLEEP_HOUR: u32 = 23;

/// Active-day bounds supplied by the settings collaborator. Hours are
/// assumed to already be within [0, 23]; the engine does not re-clamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridSettings {
    pub wake_hour: u32,
    pub sleep_hour: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            wake_hour: DEFAULT_WAKE_HOUR,
            sleep_hour: DEFAULT_SLEEP_HOUR,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Unscheduled,
    Scheduled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub topic: String,
    pub estimated_minutes: u32,
    pub difficulty: u8,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.topic, "task.topic")?;
        if self.estimated_minutes == 0 {
            return Err("task.estimated_minutes must be > 0".to_string());
        }
        if let (Some(start), Some(end)) = (self.scheduled_start, self.scheduled_end) {
            if end <= start {
                return Err("task.scheduled_end must be after task.scheduled_start".to_string());
            }
        }
        Ok(())
    }

    /// Whether the task currently carries a complete schedule window.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_start.is_some() && self.scheduled_end.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Study,
    Break,
    Rest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    User,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: u64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_type: EventType,
    pub source: EventSource,
    pub task_id: Option<u64>,
}

impl CalendarEvent {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.title, "event.title")?;
        if self.end_time <= self.start_time {
            return Err("event.end_time must be after event.start_time".to_string());
        }
        Ok(())
    }

    /// Events without a task link are free-standing manual blocks.
    pub fn is_free(&self) -> bool {
        self.task_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Typed partial update for a task. A `None` field leaves the current value
/// untouched; `description` set to an empty string clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub topic: Option<String>,
    pub estimated_minutes: Option<u32>,
    pub difficulty: Option<u8>,
    pub due_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(topic) = self.topic.as_deref() {
            validate_non_empty(topic, "patch.topic")?;
        }
        if self.estimated_minutes == Some(0) {
            return Err("patch.estimated_minutes must be > 0".to_string());
        }
        if let (Some(start), Some(end)) = (self.scheduled_start, self.scheduled_end) {
            if end <= start {
                return Err("patch.scheduled_end must be after patch.scheduled_start".to_string());
            }
        }
        Ok(())
    }

    /// Fields whose change must propagate to the mirrored calendar event.
    pub fn touches_mirror(&self) -> bool {
        self.topic.is_some()
            || self.description.is_some()
            || self.scheduled_start.is_some()
            || self.scheduled_end.is_some()
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}
