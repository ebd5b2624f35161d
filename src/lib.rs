//! Time-grid layout and local scheduling engine for a weekly study planner.
//!
//! The domain layer owns the pure pieces: the active-day hour window, the
//! minutes-to-percent coordinate mapping, the drag-selection state machine,
//! and the shared models. The application layer hosts the per-session demo
//! store with its task/event mirroring, and the infrastructure layer covers
//! config files, SQLite persistence, and errors.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::commands::{AppState, EventDraft, NewTask};
pub use domain::day_window::DayWindow;
pub use domain::layout::EventBox;
pub use domain::models::{
    CalendarEvent, ChatMessage, ChatRole, EventSource, EventType, GridSettings, Task, TaskPatch,
    TaskStatus,
};
pub use domain::selection::{DragSelection, EventDrag, SelectedRange};
pub use infrastructure::error::CoreError;
