//! Two-attempt execution strategy for the Envio generator.
//!
//! `envio init` may prompt interactively even when every answer is passed as
//! a flag. The runner therefore tries the command once with stdin closed and,
//! if that fails, exactly once more while feeding a burst of Enter key presses
//! into stdin. Each attempt is bounded by a timeout; a timed-out child is
//! killed. If both attempts fail the caller gets both diagnostics.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use schemars::JsonSchema;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tracing::{info, warn};

use super::command::EnvioCommand;

/// Output markers accepted as success in the fallback attempt.
///
/// Depends on the generator's wording and may break with new CLI versions.
const FALLBACK_SUCCESS_MARKERS: [&str; 2] = ["Initialization complete", "Successfully"];

/// Captured output is truncated to this many characters.
const MAX_OUTPUT_CHARS: usize = 10_000;

/// Which attempt produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Attempt {
    Primary,
    Fallback,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Timing of the runner.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// Upper bound for a single attempt.
    pub timeout: Duration,
    /// Wait before the first synthetic key press.
    pub keystroke_delay: Duration,
    /// Pause between synthetic key presses.
    pub keystroke_interval: Duration,
    /// Number of synthetic key presses.
    pub keystroke_count: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            keystroke_delay: Duration::from_secs(2),
            keystroke_interval: Duration::from_millis(500),
            keystroke_count: 20,
        }
    }
}

/// Why one attempt failed.
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub attempt: Attempt,
    pub reason: String,
    pub output: String,
}

/// Result of running both attempts.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Succeeded { attempt: Attempt, output: String },
    Failed {
        primary: AttemptFailure,
        fallback: AttemptFailure,
    },
}

/// Primary-then-fallback execution of an [`EnvioCommand`].
pub struct TwoAttemptRunner {
    settings: RunnerSettings,
}

impl TwoAttemptRunner {
    pub fn new(settings: RunnerSettings) -> Self {
        Self { settings }
    }

    /// Run the command, falling back to simulated input once.
    pub async fn run(&self, command: &EnvioCommand) -> RunOutcome {
        info!("Running: {}", command.display());

        let primary = match self.attempt(command, Attempt::Primary).await {
            Ok(output) => {
                return RunOutcome::Succeeded {
                    attempt: Attempt::Primary,
                    output,
                };
            }
            Err(failure) => failure,
        };

        warn!(
            "Primary attempt failed ({}), retrying with simulated key presses",
            primary.reason
        );

        match self.attempt(command, Attempt::Fallback).await {
            Ok(output) => RunOutcome::Succeeded {
                attempt: Attempt::Fallback,
                output,
            },
            Err(fallback) => {
                warn!("Fallback attempt failed ({})", fallback.reason);
                RunOutcome::Failed { primary, fallback }
            }
        }
    }

    async fn attempt(
        &self,
        command: &EnvioCommand,
        attempt: Attempt,
    ) -> Result<String, AttemptFailure> {
        let failure = |reason: String, output: String| AttemptFailure {
            attempt,
            reason,
            output,
        };

        let stdin = match attempt {
            Attempt::Primary => Stdio::null(),
            Attempt::Fallback => Stdio::piped(),
        };

        let mut child = command.to_command(stdin).spawn().map_err(|e| {
            failure(
                format!("failed to start '{}': {}", command.program(), e),
                String::new(),
            )
        })?;
        let pid = child.id();

        let feeder = child.stdin.take().map(|stdin| {
            tokio::spawn(feed_keystrokes(
                stdin,
                self.settings.keystroke_delay,
                self.settings.keystroke_interval,
                self.settings.keystroke_count,
            ))
        });

        // Dropping the child on timeout kills it (kill_on_drop); the rest of
        // its process group is killed below.
        let result = tokio::time::timeout(self.settings.timeout, child.wait_with_output()).await;

        if let Some(feeder) = feeder {
            feeder.abort();
        }
        if let Some(pid) = pid {
            kill_process_group(pid);
        }

        match result {
            Err(_) => Err(failure(
                format!("timed out after {} seconds", self.settings.timeout.as_secs_f64()),
                String::new(),
            )),
            Ok(Err(e)) => Err(failure(format!("failed to wait for command: {}", e), String::new())),
            Ok(Ok(output)) => {
                let combined = combine_output(&output.stdout, &output.stderr);
                if is_success(attempt, &output.status, &combined) {
                    info!("{} attempt succeeded", attempt);
                    Ok(combined)
                } else {
                    Err(failure(describe_status(&output.status), combined))
                }
            }
        }
    }
}

/// Kill every process left in the attempt's process group.
///
/// The generator is usually a launcher (`npx`) that starts the real CLI as a
/// grandchild, which `kill_on_drop` alone would leave running.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = i32::try_from(pid) else {
        return;
    };
    // A negative pid addresses the whole group. ESRCH means it is already gone.
    let result = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if result != 0 {
        tracing::debug!(
            "Process group {} not signalled: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

fn is_success(attempt: Attempt, status: &ExitStatus, output: &str) -> bool {
    if status.success() {
        return true;
    }
    attempt == Attempt::Fallback
        && FALLBACK_SUCCESS_MARKERS
            .iter()
            .any(|marker| output.contains(marker))
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with status {}", code),
        None => "terminated by a signal".to_string(),
    }
}

/// Press Enter `count` times after `delay`, then close stdin.
async fn feed_keystrokes(mut stdin: ChildStdin, delay: Duration, interval: Duration, count: usize) {
    tokio::time::sleep(delay).await;
    for _ in 0..count {
        if stdin.write_all(b"\n").await.is_err() || stdin.flush().await.is_err() {
            // The child stopped reading.
            return;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Stdout followed by stderr, lossily decoded and truncated.
fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    let combined = match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (true, true) => String::new(),
        (false, true) => stdout.trim_end().to_string(),
        (true, false) => stderr.trim_end().to_string(),
        (false, false) => format!("{}\n{}", stdout.trim_end(), stderr.trim_end()),
    };

    truncate_chars(combined, MAX_OUTPUT_CHARS)
}

fn truncate_chars(mut s: String, max: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
        s.push_str("\n... (output truncated)");
    }
    s
}
