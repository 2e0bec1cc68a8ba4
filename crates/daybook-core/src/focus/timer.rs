//! Focus timer engine.
//!
//! The focus timer is a wall-clock-based state machine over two phases,
//! FOCUS and BREAK. It does not use internal threads - the caller is
//! responsible for calling `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v  (countdown hits zero)
//!   next phase: Running (auto_advance) or Idle
//! ```
//!
//! Every command has an `_at(now_ms)` variant taking the current epoch
//! milliseconds; the plain variants read the system clock.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::FocusConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn other(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }
}

/// Two-phase countdown.
///
/// Elapsed time is taken from the epoch-ms deltas between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusTimer {
    focus_ms: u64,
    break_ms: u64,
    auto_advance: bool,
    phase: Phase,
    state: TimerState,
    /// Remaining time in milliseconds for the current phase.
    remaining_ms: u64,
    #[serde(default)]
    completed_focus_sessions: u32,
    /// Epoch ms of the last start/resume/tick while running.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
}

fn minutes_to_ms(minutes: u64) -> u64 {
    minutes.saturating_mul(60).saturating_mul(1000)
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::from_config(&FocusConfig::default())
    }
}

impl FocusTimer {
    /// Create an idle timer at the start of a focus phase.
    pub fn new(focus_minutes: u64, break_minutes: u64, auto_advance: bool) -> Self {
        let focus_ms = minutes_to_ms(focus_minutes);
        Self {
            focus_ms,
            break_ms: minutes_to_ms(break_minutes),
            auto_advance,
            phase: Phase::Focus,
            state: TimerState::Idle,
            remaining_ms: focus_ms,
            completed_focus_sessions: 0,
            last_tick_epoch_ms: None,
        }
    }

    pub fn from_config(config: &FocusConfig) -> Self {
        Self::new(config.focus_minutes, config.break_minutes, config.auto_advance)
    }

    /// Apply new durations. An idle timer is rewound to the new length of
    /// its phase; a running or paused one keeps its countdown.
    pub fn reconfigure(&mut self, config: &FocusConfig) {
        self.focus_ms = minutes_to_ms(config.focus_minutes);
        self.break_ms = minutes_to_ms(config.break_minutes);
        self.auto_advance = config.auto_advance;
        if self.state == TimerState::Idle {
            self.remaining_ms = self.total_ms();
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn completed_focus_sessions(&self) -> u32 {
        self.completed_focus_sessions
    }

    /// Full length of the current phase.
    pub fn total_ms(&self) -> u64 {
        match self.phase {
            Phase::Focus => self.focus_ms,
            Phase::Break => self.break_ms,
        }
    }

    /// Running in the focus phase: the only state in which DND and app
    /// blocking apply.
    pub fn is_focus_running(&self) -> bool {
        self.state == TimerState::Running && self.phase == Phase::Focus
    }

    /// 0.0 .. 100.0 progress within the current phase.
    pub fn progress_pct(&self) -> f64 {
        let total = self.total_ms();
        if total == 0 {
            return 100.0;
        }
        (1.0 - self.remaining_ms as f64 / total as f64) * 100.0
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            total_ms: self.total_ms(),
            progress_pct: self.progress_pct(),
            completed_focus_sessions: self.completed_focus_sessions,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now_ms())
    }

    pub fn start_at(&mut self, now_ms: u64) -> Option<Event> {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                self.state = TimerState::Running;
                self.last_tick_epoch_ms = Some(now_ms);
                Some(Event::TimerStarted {
                    phase: self.phase,
                    duration_secs: self.remaining_ms / 1000,
                    at: Utc::now(),
                })
            }
            TimerState::Running => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now_ms())
    }

    pub fn pause_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now_ms);
        self.state = TimerState::Paused;
        self.last_tick_epoch_ms = None;
        Some(Event::TimerPaused {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(now_ms())
    }

    pub fn resume_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        self.last_tick_epoch_ms = Some(now_ms);
        Some(Event::TimerResumed {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    /// Abandon the current phase and wait idle at the start of the other one.
    pub fn skip(&mut self) -> Event {
        let from = self.phase;
        self.state = TimerState::Idle;
        self.last_tick_epoch_ms = None;
        self.switch_phase();
        Event::TimerSkipped {
            from,
            to: self.phase,
            at: Utc::now(),
        }
    }

    /// Back to an idle focus phase. The completed-session count is kept.
    pub fn reset(&mut self) -> Event {
        self.state = TimerState::Idle;
        self.phase = Phase::Focus;
        self.last_tick_epoch_ms = None;
        self.remaining_ms = self.focus_ms;
        Event::TimerReset { at: Utc::now() }
    }

    /// Call periodically. Returns `Some(Event::PhaseCompleted)` when the
    /// current phase runs out.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.flush_elapsed(now_ms);
        if self.remaining_ms > 0 {
            return None;
        }

        let finished = self.phase;
        if finished == Phase::Focus {
            self.completed_focus_sessions = self.completed_focus_sessions.saturating_add(1);
        }
        self.switch_phase();
        if self.auto_advance {
            self.last_tick_epoch_ms = Some(now_ms);
        } else {
            self.state = TimerState::Idle;
            self.last_tick_epoch_ms = None;
        }
        tracing::info!(?finished, next = ?self.phase, auto = self.auto_advance, "focus phase completed");
        Some(Event::PhaseCompleted {
            phase: finished,
            next_phase: self.phase,
            auto_started: self.auto_advance,
            completed_focus_sessions: self.completed_focus_sessions,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, now_ms: u64) {
        if let Some(last) = self.last_tick_epoch_ms {
            let elapsed = now_ms.saturating_sub(last);
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_epoch_ms = Some(now_ms.max(last));
        }
    }

    fn switch_phase(&mut self) {
        self.phase = self.phase.other();
        self.remaining_ms = self.total_ms();
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
