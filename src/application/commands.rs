use crate::application::bootstrap::bootstrap_workspace;
use crate::domain::models::{
    CalendarEvent, ChatMessage, ChatRole, EventSource, EventType, GridSettings, Task, TaskPatch,
    TaskStatus,
};
use crate::infrastructure::config::load_grid_settings;
use crate::infrastructure::error::CoreError;
use crate::infrastructure::state_repository::{
    DemoState, DemoStateRepository, SqliteDemoStateRepository,
};
use chrono::{DateTime, Duration, Timelike, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_DIFFICULTY: u8 = 3;
const CHAT_TASK_DURATION_MINUTES: i64 = 60;
const CHAT_FALLBACK_TOPIC: &str = "Scheduled task";
const CHAT_REPLY: &str = "Scheduled your request in the next hour.";

/// Per-session scheduling engine state: config and logs on disk, the demo
/// store in memory behind a single lock, and the persistence repository the
/// store is mirrored to after every mutation.
pub struct AppState {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    session_id: String,
    repository: Arc<dyn DemoStateRepository>,
    runtime: Mutex<DemoState>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf, session_id: &str) -> Result<Self, CoreError> {
        let database_path = workspace_root.join("state").join("studygrid.sqlite");
        let repository = Arc::new(SqliteDemoStateRepository::new(database_path));
        Self::with_repository(workspace_root, session_id, repository)
    }

    /// Construct against an explicit repository (tests use the in-memory
    /// implementation). A missing or malformed persisted blob silently
    /// becomes the empty default.
    pub fn with_repository(
        workspace_root: PathBuf,
        session_id: &str,
        repository: Arc<dyn DemoStateRepository>,
    ) -> Result<Self, CoreError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let config_dir = bootstrap.workspace_root.join("config");
        let logs_dir = bootstrap.workspace_root.join("logs");
        let runtime = repository
            .load(session_id)
            .ok()
            .flatten()
            .unwrap_or_default();

        Ok(Self {
            config_dir,
            logs_dir,
            session_id: session_id.to_string(),
            repository,
            runtime: Mutex::new(runtime),
            log_guard: Mutex::new(()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Wake/sleep bounds for the grid, re-read from the settings file.
    pub fn grid_settings(&self) -> GridSettings {
        load_grid_settings(&self.config_dir)
    }

    pub fn command_error(&self, command: &str, error: &CoreError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "session": self.session_id,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    /// Mirror the store to the repository after a mutation. Fire-and-forget:
    /// the in-memory store stays authoritative for the session and a failed
    /// write only leaves a log entry.
    fn persist(&self, command: &str, snapshot: &DemoState) {
        if let Err(error) = self.repository.save(&self.session_id, snapshot) {
            self.log_error(command, &format!("persist failed: {error}"));
        }
    }
}

/// Inputs for task creation. A task created with both schedule bounds gets a
/// mirrored calendar event in the same mutation.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub topic: String,
    pub estimated_minutes: u32,
    pub difficulty: Option<u8>,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
}

/// Inputs for a free-standing calendar block. `id` selects update-by-id.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub id: Option<u64>,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_type: Option<EventType>,
}

pub fn create_task_impl(state: &AppState, draft: NewTask) -> Result<Task, CoreError> {
    let topic = draft.topic.trim();
    if topic.is_empty() {
        return Err(CoreError::InvalidInput("topic must not be empty".to_string()));
    }
    if draft.estimated_minutes == 0 {
        return Err(CoreError::InvalidInput(
            "estimated_minutes must be > 0".to_string(),
        ));
    }
    if let (Some(start), Some(end)) = (draft.scheduled_start, draft.scheduled_end) {
        if end <= start {
            return Err(CoreError::InvalidInput(
                "scheduled_end must be after scheduled_start".to_string(),
            ));
        }
    }

    let task = {
        let mut runtime = lock_runtime(state)?;
        let task = insert_task_with_mirror(&mut runtime, &draft);
        let snapshot = runtime.clone();
        drop(runtime);
        state.persist("create_task", &snapshot);
        task
    };

    state.log_info("create_task", &format!("created task_id={}", task.id));
    Ok(task)
}

pub fn list_tasks_impl(state: &AppState) -> Result<Vec<Task>, CoreError> {
    let runtime = lock_runtime(state)?;
    let mut tasks = runtime.tasks.clone();
    tasks.sort_by_key(|task| task.id);
    Ok(tasks)
}

pub fn update_task_impl(
    state: &AppState,
    task_id: u64,
    patch: TaskPatch,
) -> Result<Task, CoreError> {
    patch.validate().map_err(CoreError::InvalidInput)?;

    let mut runtime = lock_runtime(state)?;
    let Some(position) = runtime.tasks.iter().position(|task| task.id == task_id) else {
        return Err(CoreError::InvalidInput(format!(
            "task not found: {}",
            task_id
        )));
    };

    // Merge into a copy so a rejected merge leaves the store untouched.
    let mut merged = runtime.tasks[position].clone();
    if let Some(topic) = patch.topic.as_deref() {
        merged.topic = topic.trim().to_string();
    }
    if let Some(estimated) = patch.estimated_minutes {
        merged.estimated_minutes = estimated;
    }
    if let Some(difficulty) = patch.difficulty {
        merged.difficulty = difficulty;
    }
    if let Some(due_date) = patch.due_date {
        merged.due_date = due_date;
    }
    if let Some(description) = patch.description.as_deref() {
        let description = description.trim();
        merged.description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };
    }
    if let Some(status) = patch.status {
        merged.status = status;
    }
    if let Some(start) = patch.scheduled_start {
        merged.scheduled_start = Some(start);
    }
    if let Some(end) = patch.scheduled_end {
        merged.scheduled_end = Some(end);
    }
    merged.validate().map_err(CoreError::InvalidInput)?;

    runtime.tasks[position] = merged.clone();
    let updated = merged;
    if patch.touches_mirror() {
        sync_mirrored_event(&mut runtime, &updated);
    }

    let snapshot = runtime.clone();
    drop(runtime);
    state.persist("update_task", &snapshot);
    state.log_info("update_task", &format!("updated task_id={task_id}"));
    Ok(updated)
}

pub fn delete_task_impl(state: &AppState, task_id: u64) -> Result<bool, CoreError> {
    let mut runtime = lock_runtime(state)?;
    let before = runtime.tasks.len();
    runtime.tasks.retain(|task| task.id != task_id);
    if runtime.tasks.len() == before {
        return Ok(false);
    }
    // Cascade: the mirrored event is a view of the task, not a peer record.
    runtime.events.retain(|event| event.task_id != Some(task_id));

    let snapshot = runtime.clone();
    drop(runtime);
    state.persist("delete_task", &snapshot);
    state.log_info("delete_task", &format!("deleted task_id={task_id}"));
    Ok(true)
}

pub fn upsert_event_impl(state: &AppState, draft: EventDraft) -> Result<CalendarEvent, CoreError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(CoreError::InvalidInput("title must not be empty".to_string()));
    }
    if draft.end_time <= draft.start_time {
        return Err(CoreError::InvalidInput(
            "end_time must be after start_time".to_string(),
        ));
    }

    let mut runtime = lock_runtime(state)?;
    let event = match draft.id {
        Some(event_id) => {
            let Some(event) = runtime.events.iter_mut().find(|event| event.id == event_id)
            else {
                return Err(CoreError::InvalidInput(format!(
                    "event not found: {}",
                    event_id
                )));
            };
            if event.task_id.is_some() {
                return Err(CoreError::InvalidInput(format!(
                    "event {} mirrors a task; update the task instead",
                    event_id
                )));
            }
            event.title = title.to_string();
            event.start_time = draft.start_time;
            event.end_time = draft.end_time;
            if let Some(event_type) = draft.event_type {
                event.event_type = event_type;
            }
            event.clone()
        }
        None => {
            let event = CalendarEvent {
                id: runtime.next_event_id,
                title: title.to_string(),
                start_time: draft.start_time,
                end_time: draft.end_time,
                event_type: draft.event_type.unwrap_or(EventType::Study),
                source: EventSource::User,
                task_id: None,
            };
            runtime.next_event_id += 1;
            runtime.events.push(event.clone());
            event
        }
    };

    let snapshot = runtime.clone();
    drop(runtime);
    state.persist("upsert_event", &snapshot);
    state.log_info("upsert_event", &format!("upserted event_id={}", event.id));
    Ok(event)
}

pub fn delete_event_impl(state: &AppState, event_id: u64) -> Result<bool, CoreError> {
    let mut runtime = lock_runtime(state)?;
    let Some(position) = runtime.events.iter().position(|event| event.id == event_id) else {
        return Ok(false);
    };
    let removed = runtime.events.remove(position);

    // Direct deletion of a mirrored event also unschedules the task, so the
    // task never claims a schedule whose event is gone.
    if let Some(task_id) = removed.task_id {
        if let Some(task) = runtime.tasks.iter_mut().find(|task| task.id == task_id) {
            task.scheduled_start = None;
            task.scheduled_end = None;
            task.status = TaskStatus::Unscheduled;
        }
    }

    let snapshot = runtime.clone();
    drop(runtime);
    state.persist("delete_event", &snapshot);
    state.log_info("delete_event", &format!("deleted event_id={event_id}"));
    Ok(true)
}

pub fn list_events_impl(
    state: &AppState,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<Vec<CalendarEvent>, CoreError> {
    let runtime = lock_runtime(state)?;
    let mut events = match range {
        Some((start, end)) => runtime
            .events
            .iter()
            .filter(|event| event.start_time >= start && event.end_time <= end)
            .cloned()
            .collect::<Vec<_>>(),
        None => runtime.events.clone(),
    };
    events.sort_by_key(|event| event.start_time);
    Ok(events)
}

pub fn list_messages_impl(state: &AppState) -> Result<Vec<ChatMessage>, CoreError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime.messages.clone())
}

pub fn last_assistant_message_impl(state: &AppState) -> Result<Option<String>, CoreError> {
    let runtime = lock_runtime(state)?;
    Ok(runtime
        .messages
        .iter()
        .rev()
        .find(|message| message.role == ChatRole::Assistant)
        .map(|message| message.content.clone()))
}

/// Demo chat: record the user's message, schedule it as a one-hour task
/// starting at the next quarter-hour, and answer with the canned reply.
pub fn send_message_impl(state: &AppState, text: &str) -> Result<String, CoreError> {
    send_message_at(state, text, Utc::now())
}

fn send_message_at(
    state: &AppState,
    text: &str,
    now: DateTime<Utc>,
) -> Result<String, CoreError> {
    let topic = {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            CHAT_FALLBACK_TOPIC.to_string()
        } else {
            trimmed.to_string()
        }
    };
    let start = next_quarter_hour(now);
    let end = start + Duration::minutes(CHAT_TASK_DURATION_MINUTES);

    let mut runtime = lock_runtime(state)?;
    runtime.messages.push(ChatMessage {
        role: ChatRole::User,
        content: text.to_string(),
        timestamp: now,
    });
    let task = insert_task_with_mirror(
        &mut runtime,
        &NewTask {
            topic,
            estimated_minutes: CHAT_TASK_DURATION_MINUTES as u32,
            difficulty: None,
            due_date: end,
            description: Some("Created from demo chat".to_string()),
            status: Some(TaskStatus::Scheduled),
            scheduled_start: Some(start),
            scheduled_end: Some(end),
        },
    );
    runtime.messages.push(ChatMessage {
        role: ChatRole::Assistant,
        content: CHAT_REPLY.to_string(),
        timestamp: Utc::now(),
    });

    let snapshot = runtime.clone();
    drop(runtime);
    state.persist("send_message", &snapshot);
    state.log_info(
        "send_message",
        &format!("scheduled task_id={} from chat", task.id),
    );
    Ok(CHAT_REPLY.to_string())
}

pub fn clear_demo_state_impl(state: &AppState) -> Result<(), CoreError> {
    let mut runtime = lock_runtime(state)?;
    *runtime = DemoState::default();
    let snapshot = runtime.clone();
    drop(runtime);
    state.persist("clear_demo_state", &snapshot);
    state.log_info("clear_demo_state", "reset demo state");
    Ok(())
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, DemoState>, CoreError> {
    state
        .runtime
        .lock()
        .map_err(|error| CoreError::InvalidInput(format!("runtime lock poisoned: {error}")))
}

/// Insert a task, and its mirrored event when both schedule bounds are set.
/// Runs under the caller's lock so the pair appears atomically.
fn insert_task_with_mirror(runtime: &mut DemoState, draft: &NewTask) -> Task {
    let scheduled = draft.scheduled_start.is_some() && draft.scheduled_end.is_some();
    let task = Task {
        id: runtime.next_task_id,
        topic: draft.topic.trim().to_string(),
        estimated_minutes: draft.estimated_minutes,
        difficulty: draft.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
        due_date: draft.due_date,
        description: draft
            .description
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned),
        status: draft.status.unwrap_or(if scheduled {
            TaskStatus::Scheduled
        } else {
            TaskStatus::Unscheduled
        }),
        scheduled_start: draft.scheduled_start,
        scheduled_end: draft.scheduled_end,
    };
    runtime.next_task_id += 1;
    runtime.tasks.push(task.clone());

    if let (Some(start), Some(end)) = (task.scheduled_start, task.scheduled_end) {
        let event = CalendarEvent {
            id: runtime.next_event_id,
            title: task.topic.clone(),
            start_time: start,
            end_time: end,
            event_type: EventType::Study,
            source: EventSource::User,
            task_id: Some(task.id),
        };
        runtime.next_event_id += 1;
        runtime.events.push(event);
    }

    task
}

/// Re-derive the mirrored event from the updated task. Silent no-op when the
/// task has no linked event.
fn sync_mirrored_event(runtime: &mut DemoState, task: &Task) {
    let Some(event) = runtime
        .events
        .iter_mut()
        .find(|event| event.task_id == Some(task.id))
    else {
        return;
    };
    event.title = task.topic.clone();
    if let Some(start) = task.scheduled_start {
        event.start_time = start;
    }
    if let Some(end) = task.scheduled_end {
        event.end_time = end;
    }
}

/// Round `now` up to the next quarter-hour boundary (identity when already
/// on one), dropping seconds.
fn next_quarter_hour(now: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = now
        .with_second(0)
        .and_then(|value| value.with_nanosecond(0))
        .unwrap_or(now);
    let minute = truncated.minute();
    let delta = (15 - minute % 15) % 15;
    truncated + Duration::minutes(i64::from(delta))
}
