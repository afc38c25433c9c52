//! Application state module
//!
//! Holds the stopwatch state machine, the reminder settings, and the shared
//! application state wrapper.

pub mod app_state;
pub mod settings;
pub mod timer;

pub use app_state::{AppState, CoreState, TimerSnapshot};
pub use settings::ReminderSettings;
pub use timer::{format_elapsed, Timer, TimerState};
