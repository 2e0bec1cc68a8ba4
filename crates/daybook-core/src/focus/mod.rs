mod blocker;
mod service;
mod timer;

pub use blocker::AppBlocker;
pub use service::{FocusEffects, FocusHandle, FocusService, FocusSettings, ForegroundProbe};
pub use timer::{now_ms, FocusTimer, Phase, TimerState};
