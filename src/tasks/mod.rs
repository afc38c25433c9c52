//! Background tasks module
//!
//! Long-running tasks spawned at startup: the wake-timer slot owner, the clock
//! adjustment monitor, and the status display driver.

pub mod clock_monitor;
pub mod status_update;
pub mod wake_timer;

pub use clock_monitor::clock_monitor_task;
pub use status_update::status_update_task;
pub use wake_timer::wake_timer_task;
