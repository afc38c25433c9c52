//! Scheduling orchestration
//!
//! Stateless glue between timer transitions, settings changes, and the reminder
//! scheduler: after every mutation it recomputes the one desired outcome —
//! reminders are armed iff the timer is running and reminders are enabled — and
//! arms or cancels accordingly. This is the only place outside the scheduler's
//! own firing path that calls arm/cancel.

use tracing::{debug, warn};

use crate::scheduler::ReminderScheduler;
use crate::state::AppState;

/// Bring the wake request in line with the current core state.
pub fn sync_reminders(app: &AppState, scheduler: &ReminderScheduler) {
    match app.reminders_desired() {
        Ok(true) => scheduler.arm(app),
        Ok(false) => scheduler.cancel(),
        Err(e) => warn!("Cannot sync reminders: {}", e),
    }
}

/// React to a timer transition or settings change: record it, republish the
/// status snapshot, persist the new state, and re-sync the wake request.
pub fn apply_transition(app: &AppState, scheduler: &ReminderScheduler, action: &str) {
    debug!("Applying transition: {}", action);
    app.set_last_action(action);
    app.publish_status();

    if let Err(e) = app.persist() {
        app.add_error(e);
    }

    sync_reminders(app, scheduler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::test_support::{test_app, test_scheduler};
    use crate::scheduler::WakeMode;

    #[tokio::test(start_paused = true)]
    async fn arms_when_running_and_enabled() {
        let (scheduler, wake, _) = test_scheduler(WakeMode::Exact);
        let app = test_app("orch-arm");

        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        apply_transition(&app, &scheduler, "run");

        assert_eq!(wake.request_count(), 1);
        assert_eq!(wake.cancel_count(), 0);
        assert_eq!(app.get_last_action().0.as_deref(), Some("run"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancels_when_paused() {
        let (scheduler, wake, _) = test_scheduler(WakeMode::Exact);
        let app = test_app("orch-pause");

        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        apply_transition(&app, &scheduler, "run");
        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        apply_transition(&app, &scheduler, "pause");

        assert_eq!(wake.request_count(), 1);
        assert_eq!(wake.cancel_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancels_when_reminders_are_disabled_mid_run() {
        let (scheduler, wake, _) = test_scheduler(WakeMode::Exact);
        let app = test_app("orch-disable");

        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        apply_transition(&app, &scheduler, "run");

        app.with_core(|core| core.settings.enabled = false).unwrap();
        apply_transition(&app, &scheduler, "settings");

        assert_eq!(wake.request_count(), 1);
        assert_eq!(wake.cancel_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn period_change_while_running_rearms() {
        let (scheduler, wake, _) = test_scheduler(WakeMode::Exact);
        let app = test_app("orch-period");

        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        apply_transition(&app, &scheduler, "run");

        app.with_core(|core| core.settings.set_period_secs(60))
            .unwrap()
            .unwrap();
        apply_transition(&app, &scheduler, "settings");

        assert_eq!(wake.request_count(), 2);
        let deadline = wake.last_request().unwrap().deadline;
        assert_eq!(
            deadline,
            tokio::time::Instant::now() + std::time::Duration::from_secs(60)
        );
    }
}
