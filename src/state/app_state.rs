//! Main application state management

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use crate::persist::{PersistedState, StateStore};

use super::{ReminderSettings, Timer, TimerState};

/// The single mutual-exclusion domain for the core: every "read elapsed, decide,
/// mutate" sequence locks this once, so a transition can never interleave with a
/// deadline computation against stale state.
#[derive(Debug)]
pub struct CoreState {
    pub timer: Timer,
    pub settings: ReminderSettings,
}

/// A point-in-time view of the core, published to display observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub elapsed: Duration,
    pub reminders_enabled: bool,
    pub period: Duration,
}

/// Main application state shared by the API handlers, the background tasks, and
/// the reminder scheduler.
#[derive(Debug)]
pub struct AppState {
    core: Mutex<CoreState>,
    /// Persistent store for the core state.
    pub store: StateStore,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Errors surfaced to clients via /status
    pub errors: Mutex<Vec<String>>,
    /// Cleared when the wake-timer service rejects a request; counting still works.
    reminders_available: AtomicBool,
    /// Channel publishing core snapshots to display observers
    pub status_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _status_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    pub fn new(
        timer: Timer,
        settings: ReminderSettings,
        store: StateStore,
        port: u16,
        host: String,
    ) -> Self {
        let core = CoreState { timer, settings };
        let snapshot = snapshot_of(&core);
        let (status_tx, status_rx) = watch::channel(snapshot);

        Self {
            core: Mutex::new(core),
            store,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            errors: Mutex::new(Vec::new()),
            reminders_available: AtomicBool::new(true),
            status_tx,
            _status_rx: status_rx,
        }
    }

    /// Run a closure against the locked core state.
    pub fn with_core<R>(&self, f: impl FnOnce(&mut CoreState) -> R) -> Result<R, String> {
        let mut core = self
            .core
            .lock()
            .map_err(|e| format!("Failed to lock core state: {}", e))?;
        Ok(f(&mut core))
    }

    /// Current snapshot of the core.
    pub fn snapshot(&self) -> Result<TimerSnapshot, String> {
        self.with_core(|core| snapshot_of(core))
    }

    pub fn is_running(&self) -> Result<bool, String> {
        self.with_core(|core| core.timer.is_running())
    }

    /// Reminders should be armed iff the timer is running and reminders are enabled.
    pub fn reminders_desired(&self) -> Result<bool, String> {
        self.with_core(|core| core.timer.is_running() && core.settings.enabled)
    }

    /// Record the most recent user action for /status.
    pub fn set_last_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Add an error for client visibility.
    pub fn add_error(&self, error: String) {
        warn!("Recording error: {}", error);
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(error);
        }
    }

    pub fn get_errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn mark_reminders_unavailable(&self, reason: String) {
        self.reminders_available.store(false, Ordering::Relaxed);
        self.add_error(format!("Reminders temporarily unavailable: {}", reason));
    }

    pub fn mark_reminders_available(&self) {
        self.reminders_available.store(true, Ordering::Relaxed);
    }

    pub fn reminders_available(&self) -> bool {
        self.reminders_available.load(Ordering::Relaxed)
    }

    /// Publish the current snapshot to display observers.
    pub fn publish_status(&self) {
        match self.snapshot() {
            Ok(snapshot) => {
                if let Err(e) = self.status_tx.send(snapshot) {
                    warn!("Failed to publish status snapshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to snapshot core state: {}", e),
        }
    }

    /// Write the core state to the persistent store. A live running segment is
    /// folded into the accumulated value so a later restore resumes from the same
    /// elapsed time.
    pub fn persist(&self) -> Result<(), String> {
        let persisted = self.with_core(|core| PersistedState {
            accumulated_ms: core.timer.elapsed().as_millis() as u64,
            state: core.timer.state(),
            settings: core.settings,
        })?;

        self.store
            .save(&persisted)
            .map_err(|e| format!("Failed to save state: {:#}", e))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

fn snapshot_of(core: &CoreState) -> TimerSnapshot {
    TimerSnapshot {
        state: core.timer.state(),
        elapsed: core.timer.elapsed(),
        reminders_enabled: core.settings.enabled,
        period: core.settings.period(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> AppState {
        let store = StateStore::new(
            std::env::temp_dir().join(format!("simmer-app-{}.json", std::process::id())),
        );
        AppState::new(
            Timer::new(),
            ReminderSettings::default(),
            store,
            0,
            "127.0.0.1".to_string(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn reminders_desired_needs_running_and_enabled() {
        let app = test_app();
        assert!(!app.reminders_desired().unwrap());

        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        assert!(app.reminders_desired().unwrap());

        app.with_core(|core| core.settings.enabled = false).unwrap();
        assert!(!app.reminders_desired().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reflects_core() {
        let app = test_app();
        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        let snapshot = app.snapshot().unwrap();
        assert_eq!(snapshot.state, TimerState::Running);
        assert_eq!(snapshot.elapsed, Duration::from_secs(2));
        assert_eq!(snapshot.period, Duration::from_secs(300));
    }
}
