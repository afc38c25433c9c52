//! Wake-timer background task
//!
//! Owns the single outstanding one-shot wake slot. A new arm request always
//! replaces the previous one, a cancel clears it, and expiry consumes it and
//! hands the firing to the reminder scheduler for validation. This is the
//! in-process stand-in for a platform alarm facility.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, sleep_until};
use tracing::{debug, info};

use crate::scheduler::{ReminderScheduler, WakeCommand, WakeRequest};
use crate::state::AppState;

/// How often the wall-clock strategy re-reads the RTC while waiting, so clock
/// steps shorten or extend the wait without a dedicated wakeup.
const WALL_RECHECK: Duration = Duration::from_millis(500);

pub async fn wake_timer_task(
    mut rx: UnboundedReceiver<WakeCommand>,
    scheduler: Arc<ReminderScheduler>,
    app: Arc<AppState>,
) {
    info!("Starting wake timer task");

    let mut outstanding: Option<WakeRequest> = None;

    loop {
        match outstanding.take() {
            None => match rx.recv().await {
                Some(WakeCommand::Arm(request)) => outstanding = Some(request),
                Some(WakeCommand::Cancel) => {}
                None => break,
            },
            Some(request) => {
                tokio::select! {
                    command = rx.recv() => match command {
                        // Arm retires the outstanding request before taking its place.
                        Some(WakeCommand::Arm(replacement)) => outstanding = Some(replacement),
                        Some(WakeCommand::Cancel) => debug!("Outstanding wake request cancelled"),
                        None => break,
                    },
                    _ = wait_for(&request) => {
                        debug!("Wake request fired for target {:?}", request.payload.target);
                        scheduler.on_fired(&app, request.payload);
                    }
                }
            }
        }
    }

    info!("Wake timer task stopped");
}

/// Sleep until the request is due, per its delivery strategy.
async fn wait_for(request: &WakeRequest) {
    match request.wall_deadline {
        // Wall-clock targets chase the RTC: a forward step ends the wait at once
        // (possibly ahead of the monotonic target, which the scheduler suppresses).
        Some(wall) => loop {
            match wall.duration_since(SystemTime::now()) {
                Ok(remaining) if !remaining.is_zero() => {
                    sleep(remaining.min(WALL_RECHECK)).await;
                }
                _ => break,
            }
        },
        // Monotonic delivery; a flexibility window is honored at its early edge,
        // the worst case the scheduler's guard band is sized for.
        None => sleep_until(request.deadline - request.window).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::test_support::{test_app, MockNotifier};
    use crate::scheduler::{
        ReminderScheduler, SchedulerConfig, TokioWake, WakeMode, WakeService,
    };
    use tokio::time::{advance, Instant};

    fn live_setup(
        mode: WakeMode,
    ) -> (Arc<TokioWake>, Arc<ReminderScheduler>, Arc<AppState>, Arc<MockNotifier>) {
        let (wake, rx) = TokioWake::channel();
        let wake = Arc::new(wake);
        let notifier = Arc::new(MockNotifier::default());
        let scheduler = Arc::new(ReminderScheduler::new(
            wake.clone(),
            notifier.clone(),
            SchedulerConfig::default(),
            mode,
        ));
        let app = Arc::new(test_app("wake-task"));

        tokio::spawn(wake_timer_task(rx, scheduler.clone(), app.clone()));
        (wake, scheduler, app, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_at_the_deadline_and_keeps_the_stream_going() {
        let (_, scheduler, app, notifier) = live_setup(WakeMode::Exact);
        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        app.with_core(|core| core.settings.set_period_secs(60)).unwrap().unwrap();

        scheduler.arm(&app);
        tokio::task::yield_now().await;

        // Three full periods: one reminder each, re-armed by the scheduler.
        for expected in 1..=3u32 {
            advance(Duration::from_secs(60)).await;
            tokio::task::yield_now().await;
            assert_eq!(notifier.signal_count(), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_outstanding_request() {
        let (wake, scheduler, app, notifier) = live_setup(WakeMode::Exact);
        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        app.with_core(|core| core.settings.set_period_secs(60)).unwrap().unwrap();

        scheduler.arm(&app);
        tokio::task::yield_now().await;

        // A fresh request for a later boundary supersedes the first one.
        advance(Duration::from_secs(30)).await;
        app.with_core(|core| {
            core.timer.reset();
            core.timer.toggle_run_pause();
        })
        .unwrap();
        scheduler.arm(&app);
        tokio::task::yield_now().await;

        // The superseded 60s boundary passes silently.
        advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(notifier.signal_count(), 0);

        advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(notifier.signal_count(), 1);

        drop(wake);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_clears_the_outstanding_request() {
        let (wake, scheduler, app, notifier) = live_setup(WakeMode::Exact);
        app.with_core(|core| core.timer.toggle_run_pause()).unwrap();
        app.with_core(|core| core.settings.set_period_secs(60)).unwrap().unwrap();

        scheduler.arm(&app);
        tokio::task::yield_now().await;
        wake.cancel();
        tokio::task::yield_now().await;

        advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert_eq!(notifier.signal_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn windowed_delivery_arrives_at_the_early_edge() {
        let (wake, _, _, _) = live_setup(WakeMode::Exact);
        let start = Instant::now();

        // Drive the slot directly with a windowed request.
        let deadline = start + Duration::from_secs(10);
        let fired = Arc::new(std::sync::Mutex::new(None));
        let request = WakeRequest {
            deadline,
            wall_deadline: None,
            window: Duration::from_millis(50),
            payload: crate::scheduler::WakePayload { target: deadline },
        };
        {
            let fired = fired.clone();
            tokio::spawn(async move {
                wait_for(&request).await;
                *fired.lock().unwrap() = Some(Instant::now());
            });
        }

        // Not yet due just before the window opens.
        advance(Duration::from_millis(9_900)).await;
        tokio::task::yield_now().await;
        assert!(fired.lock().unwrap().is_none());

        // Due at the window's early edge, 50ms ahead of the deadline.
        advance(Duration::from_millis(50)).await;
        tokio::task::yield_now().await;
        let at = fired.lock().unwrap().expect("request should have fired");
        assert_eq!(at, deadline - Duration::from_millis(50));

        drop(wake);
    }
}
