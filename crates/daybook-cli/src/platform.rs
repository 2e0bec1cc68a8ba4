//! Desktop stand-ins for the focus service's platform hooks.
//!
//! Each hook is a user-configured shell command. An unset command turns the
//! hook into a no-op, so a plain install still runs the timer. A command
//! that outlives [`COMMAND_TIMEOUT`] is killed.

use std::io;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use daybook_core::focus::{FocusEffects, ForegroundProbe};
use daybook_core::storage::FocusConfig;

fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
const WAIT_STEP: Duration = Duration::from_millis(20);

/// `Ok(None)` when the command was killed for running past `timeout`.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> io::Result<Option<Output>> {
    let mut child = cmd.stdin(Stdio::null()).spawn()?;
    let deadline = Instant::now() + timeout;
    loop {
        if child.try_wait()?.is_some() {
            return child.wait_with_output().map(Some);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(WAIT_STEP);
    }
}

/// Reads the foreground app from the stdout of `foreground_command`.
pub struct CommandProbe {
    command: Option<String>,
    timeout: Duration,
}

impl CommandProbe {
    pub fn from_config(config: &FocusConfig) -> Self {
        Self {
            command: config.foreground_command.clone(),
            timeout: COMMAND_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ForegroundProbe for CommandProbe {
    fn foreground_app(&self) -> Option<String> {
        let command = self.command.as_deref()?;
        let mut cmd = shell(command);
        cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        match run_with_timeout(cmd, self.timeout) {
            Ok(Some(out)) if out.status.success() => {
                let app = String::from_utf8_lossy(&out.stdout).trim().to_string();
                (!app.is_empty()).then_some(app)
            }
            Ok(Some(out)) => {
                tracing::debug!(status = %out.status, "foreground command failed");
                None
            }
            Ok(None) => {
                tracing::warn!(command, "foreground command timed out");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to run foreground command");
                None
            }
        }
    }
}

/// Runs the configured do-not-disturb and block commands.
pub struct CommandEffects {
    dnd_on: Option<String>,
    dnd_off: Option<String>,
    block: Option<String>,
    timeout: Duration,
}

impl CommandEffects {
    pub fn from_config(config: &FocusConfig) -> Self {
        Self {
            dnd_on: config.dnd_on_command.clone(),
            dnd_off: config.dnd_off_command.clone(),
            block: config.block_command.clone(),
            timeout: COMMAND_TIMEOUT,
        }
    }

    fn spawn(&self, command: &str) {
        let mut cmd = shell(command);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        match run_with_timeout(cmd, self.timeout) {
            Ok(Some(out)) if !out.status.success() => {
                tracing::warn!(status = %out.status, command, "effect command failed");
            }
            Ok(Some(_)) => {}
            Ok(None) => tracing::warn!(command, "effect command timed out"),
            Err(e) => tracing::warn!(error = %e, command, "failed to run effect command"),
        }
    }
}

impl FocusEffects for CommandEffects {
    fn set_dnd(&self, enabled: bool) {
        let command = if enabled { &self.dnd_on } else { &self.dnd_off };
        if let Some(command) = command {
            self.spawn(command);
        }
    }

    fn show_block_screen(&self, app: &str) {
        match &self.block {
            Some(command) => self.spawn(&command.replace("{app}", app)),
            None => eprintln!("Blocked during focus: {app}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_reads_trimmed_stdout() {
        let config = FocusConfig {
            foreground_command: Some("echo '  com.example.game  '".into()),
            ..FocusConfig::default()
        };
        let probe = CommandProbe::from_config(&config);
        assert_eq!(probe.foreground_app().as_deref(), Some("com.example.game"));
    }

    #[test]
    fn probe_without_command_reports_nothing() {
        let probe = CommandProbe::from_config(&FocusConfig::default());
        assert_eq!(probe.foreground_app(), None);
    }

    #[test]
    fn empty_or_failing_output_is_no_app() {
        for command in ["printf ''", "exit 3"] {
            let config = FocusConfig {
                foreground_command: Some(command.into()),
                ..FocusConfig::default()
            };
            assert_eq!(CommandProbe::from_config(&config).foreground_app(), None);
        }
    }

    #[test]
    fn hung_foreground_command_is_killed_after_timeout() {
        let config = FocusConfig {
            foreground_command: Some("sleep 5; echo late".into()),
            ..FocusConfig::default()
        };
        let probe = CommandProbe::from_config(&config).with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        assert_eq!(probe.foreground_app(), None);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
