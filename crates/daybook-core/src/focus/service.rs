//! Background focus session.
//!
//! [`FocusService::spawn`] runs two independent loops at one-second
//! granularity on the current tokio runtime:
//!
//! - the tick loop advances the [`FocusTimer`], forwards its events and
//!   holds do-not-disturb on while a focus phase is running;
//! - the monitor loop polls the foreground app during strict focus and
//!   fires the blocking screen when a blocklisted app shows up.
//!
//! Both loops stop when the returned [`FocusHandle`] is shut down (or
//! dropped). Shutdown releases do-not-disturb.
//!
//! Probe and effect calls may block, so they run on tokio's blocking pool.
//! A loop waiting on one still reacts to shutdown; the call is left to
//! finish on its own.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

use super::blocker::AppBlocker;
use super::timer::{now_ms, FocusTimer};
use crate::events::Event;
use crate::storage::FocusConfig;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Upper bound on waiting for the final do-not-disturb release.
const RELEASE_GRACE: Duration = Duration::from_secs(2);

/// Source of the foreground application identifier.
///
/// Called once per second during strict focus, on the blocking pool.
pub trait ForegroundProbe: Send + Sync {
    fn foreground_app(&self) -> Option<String>;
}

/// Platform side effects of a focus session.
pub trait FocusEffects: Send + Sync {
    fn set_dnd(&self, enabled: bool);
    fn show_block_screen(&self, app: &str);
}

/// Strict-mode and DND switches taken from the config.
#[derive(Debug, Clone)]
pub struct FocusSettings {
    pub strict_mode: bool,
    pub dnd: bool,
    pub blocklist: Vec<String>,
}

impl From<&FocusConfig> for FocusSettings {
    fn from(config: &FocusConfig) -> Self {
        Self {
            strict_mode: config.strict_mode,
            dnd: config.dnd,
            blocklist: config.blocklist.clone(),
        }
    }
}

pub struct FocusService;

pub struct FocusHandle {
    timer: Arc<Mutex<FocusTimer>>,
    shutdown: watch::Sender<bool>,
    events: mpsc::UnboundedReceiver<Event>,
    loops: Vec<JoinHandle<()>>,
}

impl FocusService {
    /// Start both loops. Must be called from within a tokio runtime.
    pub fn spawn(
        timer: FocusTimer,
        settings: FocusSettings,
        probe: Arc<dyn ForegroundProbe>,
        effects: Arc<dyn FocusEffects>,
    ) -> FocusHandle {
        let timer = Arc::new(Mutex::new(timer));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (events_tx, events) = mpsc::unbounded_channel();

        let tick = tokio::spawn(tick_loop(
            Arc::clone(&timer),
            settings.dnd,
            Arc::clone(&effects),
            events_tx.clone(),
            shutdown_rx.clone(),
        ));
        let monitor = tokio::spawn(monitor_loop(
            Arc::clone(&timer),
            settings,
            probe,
            effects,
            events_tx,
            shutdown_rx,
        ));
        tracing::debug!("focus service started");

        FocusHandle {
            timer,
            shutdown,
            events,
            loops: vec![tick, monitor],
        }
    }
}

impl FocusHandle {
    /// Shared engine; lock it to issue pause/resume/skip while running.
    pub fn timer(&self) -> Arc<Mutex<FocusTimer>> {
        Arc::clone(&self.timer)
    }

    pub fn snapshot(&self) -> Event {
        self.timer.lock().snapshot()
    }

    /// Next event from either loop. `None` once both loops have stopped.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<Event> {
        self.events.try_recv().ok()
    }

    /// Stop both loops, wait for them, and return the engine.
    pub async fn shutdown(mut self) -> FocusTimer {
        let _ = self.shutdown.send(true);
        for handle in self.loops.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "focus loop ended abnormally");
            }
        }
        tracing::debug!("focus service stopped");
        let timer = self.timer.lock().clone();
        timer
    }
}

/// Epoch ms derived from the runtime clock so the loops follow tokio time.
struct LoopClock {
    base_epoch_ms: u64,
    base: Instant,
}

impl LoopClock {
    fn new() -> Self {
        Self {
            base_epoch_ms: now_ms(),
            base: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.base_epoch_ms + self.base.elapsed().as_millis() as u64
    }
}

fn poll_interval() -> tokio::time::Interval {
    let mut interval = tokio::time::interval(POLL_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Run a platform call on the blocking pool. `None` means shutdown was
/// signalled first.
async fn offload<T, F>(
    call: F,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<Result<T, JoinError>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let call = tokio::task::spawn_blocking(call);
    tokio::select! {
        joined = call => Some(joined),
        _ = shutdown.changed() => None,
    }
}

async fn tick_loop(
    timer: Arc<Mutex<FocusTimer>>,
    dnd_enabled: bool,
    effects: Arc<dyn FocusEffects>,
    events: mpsc::UnboundedSender<Event>,
    mut shutdown: watch::Receiver<bool>,
) {
    let clock = LoopClock::new();
    let mut interval = poll_interval();
    let mut dnd_on = false;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {}
        }

        let (event, focus_running) = {
            let mut timer = timer.lock();
            (timer.tick_at(clock.now_ms()), timer.is_focus_running())
        };
        if let Some(event) = event {
            let _ = events.send(event);
        }

        let want_dnd = dnd_enabled && focus_running;
        if want_dnd == dnd_on {
            continue;
        }
        // Recorded before the call so an interrupted "on" is still released.
        dnd_on = want_dnd;
        let fx = Arc::clone(&effects);
        match offload(move || fx.set_dnd(want_dnd), &mut shutdown).await {
            None => break,
            Some(Err(e)) => tracing::warn!(error = %e, "do-not-disturb call failed"),
            Some(Ok(())) => {
                tracing::info!(enabled = want_dnd, "do-not-disturb toggled");
                let _ = events.send(Event::DndChanged { enabled: want_dnd, at: Utc::now() });
            }
        }
    }

    if dnd_on {
        let release = tokio::task::spawn_blocking(move || effects.set_dnd(false));
        match tokio::time::timeout(RELEASE_GRACE, release).await {
            Ok(Ok(())) => {
                let _ = events.send(Event::DndChanged { enabled: false, at: Utc::now() });
            }
            Ok(Err(e)) => tracing::warn!(error = %e, "do-not-disturb release failed"),
            Err(_) => tracing::warn!("do-not-disturb release timed out"),
        }
    }
}

async fn monitor_loop(
    timer: Arc<Mutex<FocusTimer>>,
    settings: FocusSettings,
    probe: Arc<dyn ForegroundProbe>,
    effects: Arc<dyn FocusEffects>,
    events: mpsc::UnboundedSender<Event>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut blocker = AppBlocker::new(&settings.blocklist);
    if !settings.strict_mode || blocker.is_empty() {
        // Nothing to monitor; just wait for teardown.
        let _ = shutdown.changed().await;
        return;
    }
    let mut interval = poll_interval();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {}
        }
        if !timer.lock().is_focus_running() {
            blocker.clear();
            continue;
        }

        let p = Arc::clone(&probe);
        let app = match offload(move || p.foreground_app(), &mut shutdown).await {
            None => break,
            Some(Ok(app)) => app,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "foreground app lookup failed");
                continue;
            }
        };
        let Some(app) = blocker.observe(app.as_deref()) else {
            continue;
        };

        tracing::info!(app = %app, "blocked app in foreground");
        let fx = Arc::clone(&effects);
        let shown = app.clone();
        match offload(move || fx.show_block_screen(&shown), &mut shutdown).await {
            None => break,
            Some(Err(e)) => tracing::warn!(error = %e, "block screen call failed"),
            Some(Ok(())) => {}
        }
        let _ = events.send(Event::AppBlocked { app, at: Utc::now() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::{Phase, TimerState};

    #[derive(Default)]
    struct FakeProbe {
        app: Mutex<Option<String>>,
    }

    impl FakeProbe {
        fn set(&self, app: Option<&str>) {
            *self.app.lock() = app.map(str::to_string);
        }
    }

    impl ForegroundProbe for FakeProbe {
        fn foreground_app(&self) -> Option<String> {
            self.app.lock().clone()
        }
    }

    #[derive(Default)]
    struct Recorder {
        dnd: Mutex<Vec<bool>>,
        blocked: Mutex<Vec<String>>,
    }

    impl FocusEffects for Recorder {
        fn set_dnd(&self, enabled: bool) {
            self.dnd.lock().push(enabled);
        }

        fn show_block_screen(&self, app: &str) {
            self.blocked.lock().push(app.to_string());
        }
    }

    fn strict() -> FocusSettings {
        FocusSettings {
            strict_mode: true,
            dnd: true,
            blocklist: vec!["com.game".into()],
        }
    }

    fn running_timer(focus_minutes: u64) -> FocusTimer {
        let mut timer = FocusTimer::new(focus_minutes, 1, true);
        timer.start_at(now_ms());
        timer
    }

    #[tokio::test(start_paused = true)]
    async fn strict_focus_blocks_once_and_holds_dnd() {
        let probe = Arc::new(FakeProbe::default());
        let effects = Arc::new(Recorder::default());
        probe.set(Some("com.game"));

        let handle = FocusService::spawn(running_timer(25), strict(), probe.clone(), effects.clone());
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*effects.blocked.lock(), vec!["com.game".to_string()]);
        assert_eq!(*effects.dnd.lock(), vec![true]);

        // Leaving and returning to the blocked app fires again.
        probe.set(Some("com.notes"));
        tokio::time::sleep(Duration::from_secs(2)).await;
        probe.set(Some("com.game"));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(effects.blocked.lock().len(), 2);

        let timer = handle.shutdown().await;
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(*effects.dnd.lock(), vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn break_phase_releases_dnd_and_stops_blocking() {
        let probe = Arc::new(FakeProbe::default());
        let effects = Arc::new(Recorder::default());

        let mut handle = FocusService::spawn(running_timer(1), strict(), probe.clone(), effects.clone());
        tokio::time::sleep(Duration::from_secs(62)).await;
        probe.set(Some("com.game"));
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert!(effects.blocked.lock().is_empty());
        assert_eq!(*effects.dnd.lock(), vec![true, false]);

        let mut completed = false;
        while let Some(event) = handle.try_next_event() {
            if let Event::PhaseCompleted { phase, next_phase, .. } = event {
                assert_eq!(phase, Phase::Focus);
                assert_eq!(next_phase, Phase::Break);
                completed = true;
            }
        }
        assert!(completed);

        let timer = handle.shutdown().await;
        assert_eq!(timer.phase(), Phase::Break);
        assert_eq!(timer.completed_focus_sessions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_timer_is_not_monitored() {
        let probe = Arc::new(FakeProbe::default());
        let effects = Arc::new(Recorder::default());
        probe.set(Some("com.game"));

        let mut timer = running_timer(25);
        timer.pause_at(now_ms());
        let handle = FocusService::spawn(timer, strict(), probe, effects.clone());
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert!(effects.blocked.lock().is_empty());
        assert!(effects.dnd.lock().is_empty());

        // Resuming through the shared engine arms both loops.
        handle.timer().lock().resume();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(effects.blocked.lock().len(), 1);

        handle.shutdown().await;
    }

    struct SlowProbe;

    impl ForegroundProbe for SlowProbe {
        fn foreground_app(&self) -> Option<String> {
            std::thread::sleep(Duration::from_secs(3));
            Some("com.game".into())
        }
    }

    // Real time: blocking-pool work holds back paused-clock auto-advance.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_does_not_wait_for_a_slow_foreground_app_lookup() {
        let effects = Arc::new(Recorder::default());
        let handle = FocusService::spawn(running_timer(25), strict(), Arc::new(SlowProbe), effects.clone());
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = std::time::Instant::now();
        let timer = handle.shutdown().await;
        assert!(started.elapsed() < Duration::from_secs(1), "shutdown took {:?}", started.elapsed());

        assert_eq!(timer.state(), TimerState::Running);
        assert!(effects.blocked.lock().is_empty());
        assert_eq!(*effects.dnd.lock(), vec![true, false]);
    }
}
