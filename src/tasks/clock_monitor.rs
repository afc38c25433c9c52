//! Clock adjustment monitor task
//!
//! Wall-clock wake targets go wrong when the RTC is stepped (manual change, NTP
//! jump, timezone move) or when the host sleeps through monotonic time. There is
//! no portable "clock changed" broadcast, so this task infers one: wall-clock
//! progress is compared against monotonic progress each tick, and meaningful
//! drift is answered by letting the scheduler re-derive its wall target.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::{interval, Instant};
use tracing::{info, warn};

use crate::scheduler::ReminderScheduler;
use crate::state::AppState;

const CHECK_INTERVAL: Duration = Duration::from_secs(2);
/// Drift below this is ordinary NTP slewing and scheduler jitter, not a step.
const DRIFT_THRESHOLD: Duration = Duration::from_secs(2);

pub async fn clock_monitor_task(app: Arc<AppState>, scheduler: Arc<ReminderScheduler>) {
    info!("Starting clock monitor task");

    let mut ticker = interval(CHECK_INTERVAL);
    let mut mono_anchor = Instant::now();
    let mut wall_anchor = SystemTime::now();

    loop {
        ticker.tick().await;

        let expected = wall_anchor + mono_anchor.elapsed();
        let drift = match SystemTime::now().duration_since(expected) {
            Ok(forward) => forward,
            Err(backward) => backward.duration(),
        };

        if drift > DRIFT_THRESHOLD {
            warn!("Wall clock moved ~{:?} against the monotonic clock", drift);
            scheduler.on_clock_adjusted(&app);
        }

        mono_anchor = Instant::now();
        wall_anchor = SystemTime::now();
    }
}
