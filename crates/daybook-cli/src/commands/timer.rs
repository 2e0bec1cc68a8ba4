use std::sync::Arc;

use clap::Subcommand;
use daybook_core::focus::{FocusService, FocusSettings, FocusTimer, TimerState};
use daybook_core::{Config, Daybook, Event};

use super::{print_json, CmdResult};
use crate::platform::{CommandEffects, CommandProbe};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current phase
    Start,
    /// Pause the running phase
    Pause,
    /// Resume a paused phase
    Resume,
    /// Skip to the other phase
    Skip,
    /// Return to an idle focus phase
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Run the timer in the foreground with app blocking and DND
    Run {
        /// Stop after this many completed focus sessions
        #[arg(long)]
        cycles: Option<u32>,
    },
}

pub fn run(action: TimerAction) -> CmdResult {
    let config = Config::load()?;
    let daybook = Daybook::open()?;
    let mut timer = daybook.load_focus_timer(&config.focus);

    // Catch up on time that passed since the last command.
    if let Some(event) = timer.tick() {
        print_json(&event)?;
    }

    match action {
        TimerAction::Start => print_or_snapshot(timer.start(), &timer)?,
        TimerAction::Pause => print_or_snapshot(timer.pause(), &timer)?,
        TimerAction::Resume => print_or_snapshot(timer.resume(), &timer)?,
        TimerAction::Skip => print_json(&timer.skip())?,
        TimerAction::Reset => print_json(&timer.reset())?,
        TimerAction::Status => print_json(&timer.snapshot())?,
        TimerAction::Run { cycles } => {
            let runtime = tokio::runtime::Runtime::new()?;
            timer = runtime.block_on(run_foreground(timer, &config, cycles));
            // Platform commands still in flight are killed by their own timeout.
            runtime.shutdown_timeout(std::time::Duration::from_secs(1));
        }
    }

    daybook.save_focus_timer(&timer)?;
    Ok(())
}

/// Commands that don't apply in the current state print the state instead.
fn print_or_snapshot(event: Option<Event>, timer: &FocusTimer) -> CmdResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&timer.snapshot()),
    }
}

fn print_line(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "failed to encode event"),
    }
}

/// Run the focus service until the timer goes idle, `cycles` focus sessions
/// complete, or Ctrl-C.
async fn run_foreground(mut timer: FocusTimer, config: &Config, cycles: Option<u32>) -> FocusTimer {
    let started = match timer.state() {
        TimerState::Idle => timer.start(),
        TimerState::Paused => timer.resume(),
        TimerState::Running => None,
    };
    if let Some(event) = started {
        print_line(&event);
    }

    let target = cycles.map(|n| timer.completed_focus_sessions().saturating_add(n));
    let mut handle = FocusService::spawn(
        timer,
        FocusSettings::from(&config.focus),
        Arc::new(CommandProbe::from_config(&config.focus)),
        Arc::new(CommandEffects::from_config(&config.focus)),
    );

    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };
                print_line(&event);
                if let Event::PhaseCompleted { auto_started, completed_focus_sessions, .. } = event {
                    let reached = target.is_some_and(|t| completed_focus_sessions >= t);
                    if reached || !auto_started {
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    handle.shutdown().await
}
