use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::focus::{Phase, TimerState};

/// Every focus-session state change produces an Event.
/// The CLI prints them; the focus service forwards them to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran down to zero; the timer switched to `next_phase`.
    PhaseCompleted {
        phase: Phase,
        next_phase: Phase,
        /// Whether the next phase started running on its own.
        auto_started: bool,
        completed_focus_sessions: u32,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Phase,
        to: Phase,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        phase: Phase,
        remaining_ms: u64,
        total_ms: u64,
        progress_pct: f64,
        completed_focus_sessions: u32,
        at: DateTime<Utc>,
    },
    /// A blocklisted app came to the foreground during strict focus.
    AppBlocked {
        app: String,
        at: DateTime<Utc>,
    },
    DndChanged {
        enabled: bool,
        at: DateTime<Utc>,
    },
}
