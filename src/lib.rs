//! Simmer - a state-managed HTTP stopwatch server with periodic reminder alarms
//!
//! The core is an elapsed-time state machine driven purely by the monotonic
//! clock, plus a reminder scheduler that keeps exactly one one-shot wake request
//! outstanding while the timer runs and validates every firing before it reaches
//! the user. HTTP endpoints forward gestures in; a configurable command notifier
//! carries reminders out.

pub mod api;
pub mod config;
pub mod notify;
pub mod orchestrator;
pub mod persist;
pub mod scheduler;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use scheduler::ReminderScheduler;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
