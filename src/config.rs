//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::scheduler::{SchedulerConfig, WakeMode};
use crate::state::ReminderSettings;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "simmer")]
#[command(about = "A state-managed HTTP stopwatch server with periodic reminder alarms")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "7217")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Default minutes between reminders, used until a saved state exists
    #[arg(short = 'm', long, default_value = "5")]
    pub period: u64,

    /// Path of the JSON state file
    #[arg(long, default_value = "simmer-state.json")]
    pub state_file: PathBuf,

    /// Wake delivery strategy to use
    #[arg(long, value_enum, default_value = "exact")]
    pub wake_mode: WakeMode,

    /// How many milliseconds early a reminder may fire and still count
    #[arg(long, default_value = "10")]
    pub alarm_tolerance_ms: u64,

    /// Wakeup flexibility window in milliseconds (windowed mode only)
    #[arg(long, default_value = "50")]
    pub wakeup_window_ms: u64,

    /// Shell command to run when a reminder fires
    #[arg(long)]
    pub chime_command: Option<String>,

    /// Shell command to run on status updates (elapsed time in $SIMMER_ELAPSED)
    #[arg(long)]
    pub status_command: Option<String>,

    /// Remove the /stop endpoint, leaving run/pause/reset/cycle
    #[arg(long)]
    pub hide_stop: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Guard-band constants for the reminder scheduler
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            alarm_tolerance: std::time::Duration::from_millis(self.alarm_tolerance_ms),
            wakeup_window: std::time::Duration::from_millis(self.wakeup_window_ms),
        }
    }

    /// Reminder settings to use when no valid saved state exists
    pub fn default_settings(&self) -> ReminderSettings {
        ReminderSettings::new(self.period.max(1) * 60, true)
            .unwrap_or_else(|_| ReminderSettings::default())
    }
}
