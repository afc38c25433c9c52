//! Notification layer
//!
//! The core only signals "a reminder is due now" and "here is the current
//! status"; what that looks or sounds like is decided here. The default
//! implementation shells out to user-configured commands, so a chime can be
//! `paplay`, a desktop popup `notify-send`, or anything else.

use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::state::format_elapsed;

/// Sink for reminder signals and persistent status updates.
pub trait Notifier: Send + Sync {
    /// Fire the user-visible reminder. `vibrate` is advisory; sinks without a
    /// vibrator ignore it.
    fn trigger_reminder_signal(&self, play_chime: bool, vibrate: bool);

    /// Show or refresh the ambient status display.
    fn show_or_update_persistent_status(&self, is_running: bool, elapsed: Duration, is_stopped: bool);
}

/// Notifier that runs external commands, in the spirit of a desktop setup where
/// sound and popups come from small shell tools.
#[derive(Debug, Clone, Default)]
pub struct CommandNotifier {
    chime_command: Option<String>,
    status_command: Option<String>,
}

impl CommandNotifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chime_command: config.chime_command.clone(),
            status_command: config.status_command.clone(),
        }
    }

    fn run_command(&self, command: &str, args: &[(&str, String)]) {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        for (key, value) in args {
            cmd.env(key, value);
        }

        match cmd.spawn() {
            Ok(mut child) => {
                // Reap the child without blocking the caller.
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => {
                            warn!("Notification command exited with {}", status);
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Failed to wait on notification command: {}", e),
                    }
                });
            }
            Err(e) => warn!("Failed to spawn notification command: {}", e),
        }
    }
}

impl Notifier for CommandNotifier {
    fn trigger_reminder_signal(&self, play_chime: bool, vibrate: bool) {
        info!("Reminder due (chime={}, vibrate={})", play_chime, vibrate);

        if play_chime {
            if let Some(command) = &self.chime_command {
                self.run_command(command, &[]);
            }
        }
    }

    fn show_or_update_persistent_status(&self, is_running: bool, elapsed: Duration, is_stopped: bool) {
        let elapsed_display = format_elapsed(elapsed, false);
        debug!(
            "Status: {} ({})",
            elapsed_display,
            if is_running {
                "running"
            } else if is_stopped {
                "stopped"
            } else {
                "idle"
            }
        );

        if let Some(command) = &self.status_command {
            self.run_command(
                command,
                &[
                    ("SIMMER_ELAPSED", elapsed_display),
                    ("SIMMER_RUNNING", (is_running as u8).to_string()),
                    ("SIMMER_STOPPED", (is_stopped as u8).to_string()),
                ],
            );
        }
    }
}
