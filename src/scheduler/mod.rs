//! Reminder scheduling
//!
//! Translates "timer running with reminders enabled, period P" into exactly one
//! correctly-timed outstanding wake request, and validates each firing before it
//! reaches the user. The wake facility is treated as best-effort: it may fire a
//! little early (bounded) or arbitrarily late, and a request it rejects must
//! never take the stopwatch down with it.

pub mod wake;

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::notify::Notifier;
use crate::state::AppState;

pub use wake::{TokioWake, WakeCommand, WakeMode, WakePayload, WakeRequest, WakeService};

/// Guard-band constants. Empirically chosen; exposed through the CLI rather than
/// hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// How early a firing may arrive and still count as its deadline.
    pub alarm_tolerance: Duration,
    /// Flexibility window granted to the wake facility in windowed mode.
    pub wakeup_window: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            alarm_tolerance: Duration::from_millis(10),
            wakeup_window: Duration::from_millis(50),
        }
    }
}

/// The monotonic instant of the next reminder after `elapsed`, given reminders
/// every `period`.
///
/// A deadline landing inside the guard band is pushed out a full period:
/// scheduling that close to "now" would double-alarm when the wake facility
/// delivers on the early side of its window.
pub fn next_reminder_deadline(
    elapsed: Duration,
    period: Duration,
    now: Instant,
    guard: Duration,
) -> Instant {
    let period_ms = period.as_millis() as u64;
    let mut until_next = period_ms - (elapsed.as_millis() as u64 % period_ms);

    if until_next <= guard.as_millis() as u64 {
        until_next += period_ms;
    }

    now + Duration::from_millis(until_next)
}

/// How many reminders have happened by `elapsed`, counting one that may have
/// arrived up to `window` early. For display and debugging only; scheduling
/// decisions never consult this.
pub fn num_reminders_so_far(elapsed: Duration, period: Duration, window: Duration) -> u64 {
    (elapsed.as_millis() as u64 + window.as_millis() as u64) / period.as_millis() as u64
}

/// Keeps exactly one wake request outstanding while reminders are wanted, and
/// validates every firing the wake facility delivers.
pub struct ReminderScheduler {
    wake: Arc<dyn WakeService>,
    notifier: Arc<dyn Notifier>,
    config: SchedulerConfig,
    mode: WakeMode,
    /// Monotonic target of the last reminder actually delivered to the user;
    /// a repeat firing at or before this target is a duplicate.
    last_fired_target: Mutex<Option<Instant>>,
}

impl ReminderScheduler {
    pub fn new(
        wake: Arc<dyn WakeService>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
        mode: WakeMode,
    ) -> Self {
        Self {
            wake,
            notifier,
            config,
            mode,
            last_fired_target: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> WakeMode {
        self.mode
    }

    /// The early-side slack a deadline must clear; only windowed delivery adds
    /// window slack on top of the fixed tolerance.
    fn effective_window(&self) -> Duration {
        match self.mode {
            WakeMode::Windowed => self.config.wakeup_window,
            WakeMode::Exact | WakeMode::WallClock => Duration::ZERO,
        }
    }

    /// Reminders delivered so far for the given elapsed time.
    pub fn reminders_so_far(&self, elapsed: Duration, period: Duration) -> u64 {
        num_reminders_so_far(elapsed, period, self.effective_window())
    }

    /// Compute the next deadline and request a one-shot wake for it, retiring any
    /// previously outstanding request. Service failures are reported on the app
    /// state, never propagated; the stopwatch keeps counting without reminders.
    pub fn arm(&self, app: &AppState) {
        self.arm_at(app, Instant::now(), SystemTime::now());
    }

    fn arm_at(&self, app: &AppState, now: Instant, wall_now: SystemTime) {
        let guard = self.effective_window() + self.config.alarm_tolerance;
        let window = self.effective_window();
        let mode = self.mode;

        // Read elapsed and decide under one lock, so a transition can never
        // slip between the read and the deadline computation.
        let decision = app.with_core(|core| {
            if !core.timer.is_running() {
                return None;
            }
            let elapsed = core.timer.elapsed_at(now);
            let period = core.settings.period();
            let deadline = next_reminder_deadline(elapsed, period, now, guard);
            let wall_deadline = match mode {
                // Derived at the last moment; a clock adjustment invalidates it,
                // which the clock monitor answers with a fresh arm.
                WakeMode::WallClock => {
                    Some(core.timer.elapsed_to_wall_time_at(deadline, now, wall_now))
                }
                WakeMode::Exact | WakeMode::Windowed => None,
            };
            Some((elapsed, period, deadline, wall_deadline))
        });

        let (elapsed, period, deadline, wall_deadline) = match decision {
            Ok(Some(decision)) => decision,
            Ok(None) => {
                debug!("Not arming: timer is not running");
                return;
            }
            Err(e) => {
                warn!("Cannot arm reminder: {}", e);
                return;
            }
        };

        let request = WakeRequest {
            deadline,
            wall_deadline,
            window,
            payload: WakePayload { target: deadline },
        };

        debug!(
            "Arming reminder in {:?} (elapsed={:?}, period={:?}, mode={:?})",
            deadline.duration_since(now),
            elapsed,
            period,
            self.mode
        );
        match self.wake.request_one_shot(request) {
            Ok(()) => app.mark_reminders_available(),
            Err(e) => {
                warn!("Wake service rejected the reminder request: {}", e);
                app.mark_reminders_unavailable(e);
            }
        }
    }

    /// Retire any outstanding wake request. Idempotent.
    pub fn cancel(&self) {
        debug!("Cancelling any outstanding reminder");
        self.wake.cancel();
    }

    /// Handle a wake firing delivered by the wake facility.
    ///
    /// A firing from a state that changed between arming and delivery is stale and
    /// ignored entirely. A duplicate (target already consumed) or an early firing
    /// (wall-clock mode, ahead of its monotonic target) suppresses the user-visible
    /// signal but still re-arms: one-shot requests are consumed on firing, so going
    /// quiet here would end the reminder stream.
    pub fn on_fired(&self, app: &AppState, payload: WakePayload) {
        self.on_fired_at(app, payload, Instant::now());
    }

    fn on_fired_at(&self, app: &AppState, payload: WakePayload, now: Instant) {
        match app.is_running() {
            Ok(true) => {}
            Ok(false) => {
                debug!("Ignoring stale reminder firing: timer is not running");
                return;
            }
            Err(e) => {
                warn!("Cannot validate reminder firing: {}", e);
                return;
            }
        }

        if self.is_duplicate(payload.target) {
            debug!("Suppressing duplicate reminder firing for a consumed target");
        } else if self.is_early(payload.target, now) {
            info!(
                "Early reminder firing ({:?} ahead of target), suppressing",
                payload.target.duration_since(now)
            );
        } else {
            self.notifier.trigger_reminder_signal(true, true);
            if let Ok(mut last) = self.last_fired_target.lock() {
                *last = Some(payload.target);
            }
        }

        self.arm_at(app, now, SystemTime::now());
    }

    /// Re-derive the wall-clock target after a clock step or timezone change.
    ///
    /// Only wall-clock delivery cares: a forward step makes the facility believe
    /// the RTC target already passed. The monotonic elapsed value is unaffected,
    /// so re-arming recomputes the same logical deadline.
    pub fn on_clock_adjusted(&self, app: &AppState) {
        if self.mode != WakeMode::WallClock {
            return;
        }

        match app.reminders_desired() {
            Ok(true) => {
                info!("Wall clock adjusted, re-deriving the reminder target");
                self.arm(app);
            }
            Ok(false) => {}
            Err(e) => warn!("Cannot handle clock adjustment: {}", e),
        }
    }

    fn is_duplicate(&self, target: Instant) -> bool {
        self.last_fired_target
            .lock()
            .ok()
            .and_then(|last| *last)
            .is_some_and(|last| target <= last)
    }

    fn is_early(&self, target: Instant, now: Instant) -> bool {
        // Only RTC-targeted delivery can fire ahead of its monotonic target.
        self.mode == WakeMode::WallClock && now < target + self.config.alarm_tolerance
    }
}
