//! Persistent state storage
//!
//! Saves and restores the timer and reminder settings across process restarts.
//! Only logical state crosses the boundary: the accumulated elapsed time, the
//! phase, and the settings. Monotonic anchors never do.

use std::{fs, path::PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::state::{ReminderSettings, TimerState};

/// The on-disk form of the application state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    /// Elapsed time at save, in milliseconds. A live running segment is folded in
    /// by the caller before saving.
    pub accumulated_ms: u64,
    pub state: TimerState,
    pub settings: ReminderSettings,
}

impl PersistedState {
    pub fn fresh(settings: ReminderSettings) -> Self {
        Self {
            accumulated_ms: 0,
            state: TimerState::Reset,
            settings,
        }
    }
}

/// JSON file store for [`PersistedState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the persisted state, falling back to a fresh `Reset` state with the
    /// given default settings when the file is missing, malformed, or violates the
    /// positive-period invariant. Startup never fails on bad state.
    pub fn load(&self, defaults: ReminderSettings) -> PersistedState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No saved state at {} ({}), starting fresh", self.path.display(), e);
                return PersistedState::fresh(defaults);
            }
        };

        match serde_json::from_str::<PersistedState>(&raw) {
            Ok(state) if state.settings.is_valid() => {
                debug!("Restored state from {}: {:?}", self.path.display(), state);
                state
            }
            Ok(state) => {
                warn!(
                    "Saved state at {} has an invalid reminder period ({:?}), starting fresh",
                    self.path.display(),
                    state.settings
                );
                PersistedState::fresh(defaults)
            }
            Err(e) => {
                warn!(
                    "Saved state at {} is malformed ({}), starting fresh",
                    self.path.display(),
                    e
                );
                PersistedState::fresh(defaults)
            }
        }
    }

    /// Write the state to disk.
    pub fn save(&self, state: &PersistedState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}
