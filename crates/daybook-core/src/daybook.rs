//! All feature stores opened over one database.

use std::sync::Arc;

use crate::error::Result;
use crate::focus::FocusTimer;
use crate::records::{CalendarEvent, Exam, Note, RecordStore, Reminder, TimetableEntry};
use crate::storage::{Database, FocusConfig};
use crate::tasks::TaskBoard;

/// Key of the persisted focus timer engine.
pub const FOCUS_TIMER_KEY: &str = "focus_timer";

pub struct Daybook {
    db: Arc<Database>,
    pub tasks: TaskBoard,
    pub notes: RecordStore<Note>,
    pub reminders: RecordStore<Reminder>,
    pub events: RecordStore<CalendarEvent>,
    pub exams: RecordStore<Exam>,
    pub timetable: RecordStore<TimetableEntry>,
}

impl Daybook {
    /// Open the default database under the data directory.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open() -> Result<Self> {
        Ok(Self::with_database(Arc::new(Database::open()?)))
    }

    pub fn with_database(db: Arc<Database>) -> Self {
        Self {
            tasks: TaskBoard::open(Arc::clone(&db)),
            notes: RecordStore::open(Arc::clone(&db)),
            reminders: RecordStore::open(Arc::clone(&db)),
            events: RecordStore::open(Arc::clone(&db)),
            exams: RecordStore::open(Arc::clone(&db)),
            timetable: RecordStore::open(Arc::clone(&db)),
            db,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Persisted focus timer, or a fresh one. Durations always follow `config`.
    pub fn load_focus_timer(&self, config: &FocusConfig) -> FocusTimer {
        let stored = match self.db.kv_get(FOCUS_TIMER_KEY) {
            Ok(Some(json)) => serde_json::from_str::<FocusTimer>(&json)
                .map_err(|e| tracing::warn!(error = %e, "corrupt focus timer, starting fresh"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read focus timer, starting fresh");
                None
            }
        };
        match stored {
            Some(mut timer) => {
                timer.reconfigure(config);
                timer
            }
            None => FocusTimer::from_config(config),
        }
    }

    /// # Errors
    /// Returns a serialization or database error.
    pub fn save_focus_timer(&self, timer: &FocusTimer) -> Result<()> {
        let json = serde_json::to_string(timer)?;
        self.db.kv_set(FOCUS_TIMER_KEY, &json)?;
        Ok(())
    }
}
