//! Stopwatch state machine

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// The four phases of the stopwatch.
///
/// `Stopped` differs from `Paused` only in that it suppresses reminders and
/// surfaces a different control affordance; the elapsed value is frozen either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Reset,
    Running,
    Paused,
    Stopped,
}

/// Elapsed-time counter driven only by the monotonic clock.
///
/// While running, `elapsed = accumulated + (now - running_since)`; otherwise the
/// accumulated value alone. Wall-clock adjustments never perturb the elapsed time
/// because the wall clock is never consulted for duration math.
#[derive(Debug, Clone)]
pub struct Timer {
    state: TimerState,
    /// Running time accrued before the current running segment.
    accumulated: Duration,
    /// Start of the current running segment; present iff `state == Running`.
    running_since: Option<Instant>,
}

impl Timer {
    /// Create a fresh timer in the `Reset` state.
    pub fn new() -> Self {
        Self {
            state: TimerState::Reset,
            accumulated: Duration::ZERO,
            running_since: None,
        }
    }

    /// Rebuild a timer from persisted fields.
    ///
    /// Monotonic timestamps are meaningless across process restarts, so a restored
    /// `Running` timer re-anchors its running segment to "now": the elapsed value
    /// picks up where it left off rather than including time the process was dead.
    pub fn restore(accumulated: Duration, state: TimerState) -> Self {
        Self {
            state,
            accumulated,
            running_since: (state == TimerState::Running).then(Instant::now),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_reset(&self) -> bool {
        self.state == TimerState::Reset
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == TimerState::Stopped
    }

    /// Start from `Reset`/`Paused`, or pause while `Running`. No-op from `Stopped`.
    pub fn toggle_run_pause(&mut self) {
        self.toggle_run_pause_at(Instant::now());
    }

    pub fn toggle_run_pause_at(&mut self, now: Instant) {
        match self.state {
            TimerState::Reset | TimerState::Paused => self.run_at(now),
            TimerState::Running => self.pause_at(now),
            TimerState::Stopped => {}
        }
    }

    /// Back to zero from any state. Always succeeds.
    pub fn reset(&mut self) {
        self.state = TimerState::Reset;
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    /// Freeze the elapsed value and suppress reminders. No-op from `Reset`.
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    pub fn stop_at(&mut self, now: Instant) {
        match self.state {
            TimerState::Running | TimerState::Paused => {
                self.fold_running_segment(now);
                self.state = TimerState::Stopped;
            }
            TimerState::Reset | TimerState::Stopped => {}
        }
    }

    /// Advance `Reset -> Running -> Paused -> Reset`, wrapping.
    ///
    /// A `Stopped` timer cycles as if it were `Reset`, so the single-gesture control
    /// still works after a stop.
    pub fn cycle(&mut self) {
        self.cycle_at(Instant::now());
    }

    pub fn cycle_at(&mut self, now: Instant) {
        match self.state {
            TimerState::Reset | TimerState::Stopped => self.run_at(now),
            TimerState::Running => self.pause_at(now),
            TimerState::Paused => self.reset(),
        }
    }

    /// Total elapsed running time. Pure query; never mutates state.
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + now.duration_since(since),
            None => self.accumulated,
        }
    }

    /// Translate a monotonic-frame target into a wall-clock instant by anchoring
    /// `now_monotonic <-> now_wallclock` at call time.
    ///
    /// The mapping is invalidated by any wall-clock adjustment, so callers needing
    /// a durable wall-clock target must re-derive it near the moment of use.
    pub fn elapsed_to_wall_time(&self, target: Instant) -> SystemTime {
        self.elapsed_to_wall_time_at(target, Instant::now(), SystemTime::now())
    }

    pub fn elapsed_to_wall_time_at(
        &self,
        target: Instant,
        now: Instant,
        wall_now: SystemTime,
    ) -> SystemTime {
        if target >= now {
            wall_now + target.duration_since(now)
        } else {
            wall_now - now.duration_since(target)
        }
    }

    /// Display form without sub-second precision, e.g. `0:07:26`.
    pub fn format_hh_mm_ss(&self) -> String {
        format_elapsed(self.elapsed(), false)
    }

    /// Display form with tenths of a second while under one hour, e.g. `07:26.3`.
    pub fn format_hh_mm_ss_fraction(&self) -> String {
        format_elapsed(self.elapsed(), true)
    }

    fn run_at(&mut self, now: Instant) {
        self.state = TimerState::Running;
        self.running_since = Some(now);
    }

    fn pause_at(&mut self, now: Instant) {
        self.fold_running_segment(now);
        self.state = TimerState::Paused;
    }

    fn fold_running_segment(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.duration_since(since);
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render an elapsed duration as `H:MM:SS`, or `MM:SS.d` when fractions are
/// requested and the value is still under an hour.
pub fn format_elapsed(elapsed: Duration, with_fraction: bool) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if with_fraction && hours == 0 {
        let tenths = elapsed.subsec_millis() / 100;
        format!("{:02}:{:02}.{}", minutes, seconds, tenths)
    } else {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn accumulates_only_while_running() {
        let mut timer = Timer::new();
        assert!(timer.is_reset());
        assert_eq!(timer.elapsed(), Duration::ZERO);

        timer.toggle_run_pause();
        advance(Duration::from_millis(1500)).await;
        timer.toggle_run_pause();
        assert!(timer.is_paused());
        assert_eq!(timer.elapsed(), Duration::from_millis(1500));

        // Paused time must not count.
        advance(Duration::from_secs(60)).await;
        assert_eq!(timer.elapsed(), Duration::from_millis(1500));

        timer.toggle_run_pause();
        advance(Duration::from_millis(2500)).await;
        timer.toggle_run_pause();
        assert_eq!(timer.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_is_monotonic_while_running() {
        let mut timer = Timer::new();
        timer.toggle_run_pause();

        let mut last = timer.elapsed();
        for _ in 0..10 {
            advance(Duration::from_millis(100)).await;
            let next = timer.elapsed();
            assert!(next >= last);
            last = next;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_wraps_through_all_phases() {
        let mut timer = Timer::new();

        timer.cycle();
        assert!(timer.is_running());
        advance(Duration::from_secs(3)).await;

        timer.cycle();
        assert!(timer.is_paused());
        assert_eq!(timer.elapsed(), Duration::from_secs(3));

        timer.cycle();
        assert!(timer.is_reset());
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_the_elapsed_value() {
        let mut timer = Timer::new();
        timer.toggle_run_pause();
        advance(Duration::from_secs(7)).await;

        timer.stop();
        assert!(timer.is_stopped());
        assert_eq!(timer.elapsed(), Duration::from_secs(7));

        advance(Duration::from_secs(30)).await;
        assert_eq!(timer.elapsed(), Duration::from_secs(7));

        // Run/pause is a no-op once stopped; cycling restarts.
        timer.toggle_run_pause();
        assert!(timer.is_stopped());
        timer.cycle();
        assert!(timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_a_noop_from_reset() {
        let mut timer = Timer::new();
        timer.stop();
        assert!(timer.is_reset());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_any_state() {
        let mut timer = Timer::new();
        timer.toggle_run_pause();
        advance(Duration::from_secs(5)).await;
        timer.reset();
        assert!(timer.is_reset());
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_running_reanchors_to_now() {
        let timer = Timer::restore(Duration::from_millis(5000), TimerState::Running);
        assert!(timer.is_running());
        // Wall time that passed while the process was dead must not appear.
        assert_eq!(timer.elapsed(), Duration::from_millis(5000));

        advance(Duration::from_secs(2)).await;
        assert_eq!(timer.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_paused_keeps_accumulated() {
        let timer = Timer::restore(Duration::from_secs(42), TimerState::Paused);
        advance(Duration::from_secs(9)).await;
        assert_eq!(timer.elapsed(), Duration::from_secs(42));
    }

    #[tokio::test(start_paused = true)]
    async fn wall_time_translation_anchors_at_call_time() {
        let timer = Timer::new();
        let now = Instant::now();
        let wall_now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);

        let target = now + Duration::from_secs(90);
        let wall = timer.elapsed_to_wall_time_at(target, now, wall_now);
        assert_eq!(wall, wall_now + Duration::from_secs(90));

        let past = now - Duration::from_secs(10);
        let wall = timer.elapsed_to_wall_time_at(past, now, wall_now);
        assert_eq!(wall, wall_now - Duration::from_secs(10));
    }

    #[test]
    fn formats_with_and_without_fraction() {
        assert_eq!(format_elapsed(Duration::ZERO, true), "00:00.0");
        assert_eq!(format_elapsed(Duration::from_millis(83_250), true), "01:23.2");
        assert_eq!(format_elapsed(Duration::from_millis(83_250), false), "0:01:23");
        // Past an hour the fractional form falls back to H:MM:SS.
        assert_eq!(format_elapsed(Duration::from_secs(3_600), true), "1:00:00");
        assert_eq!(format_elapsed(Duration::from_secs(7_325), false), "2:02:05");
    }
}
