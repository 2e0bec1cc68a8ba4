//! # Daybook Core Library
//!
//! Core logic for Daybook, a personal productivity tool: task list,
//! notes, reminders, calendar events, exams, timetable, a focus timer with
//! strict-mode app blocking, and backup/restore. The `daybook` CLI is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Storage**: one JSON blob per feature in a SQLite key-value table,
//!   wrapped by [`FeatureStore`], plus TOML-based [`Config`]
//! - **Tasks**: the [`TaskList`] state machine (single active task, groups,
//!   priority tasks with deadlines) and its persisted [`TaskBoard`]
//! - **Records**: CRUD collections for the remaining domains
//! - **Focus**: a wall-clock [`FocusTimer`] that the caller ticks, and a
//!   [`FocusService`] running the tick and app-monitor loops on tokio
//! - **Backup**: checksummed JSON export/import of every domain

pub mod backup;
pub mod daybook;
pub mod error;
pub mod events;
pub mod focus;
pub mod records;
pub mod storage;
pub mod tasks;

pub use backup::{Backup, BackupData, ImportSummary};
pub use daybook::Daybook;
pub use error::{BackupError, ConfigError, CoreError, DatabaseError, TaskError, ValidationError};
pub use events::Event;
pub use focus::{FocusService, FocusTimer, Phase, TimerState};
pub use storage::{Config, Database, FeatureStore};
pub use tasks::{TaskBoard, TaskEntry, TaskList, TaskType};
