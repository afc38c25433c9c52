//! Wake-timer service boundary
//!
//! The scheduler talks to an external one-shot wake facility through the
//! [`WakeService`] contract: at most one request is outstanding, a new request
//! replaces any prior one, and a request is consumed when it fires. The in-process
//! implementation forwards commands to the wake-timer background task, which owns
//! the single outstanding slot.
//!
//! Three delivery strategies exist because hosts differ in what their timer
//! facility can do; the choice is made once at startup and the scheduling
//! algorithm never branches on it.

use std::time::{Duration, SystemTime};

use clap::ValueEnum;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Delivery strategy for wake requests, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WakeMode {
    /// Sleep to the exact monotonic deadline.
    Exact,
    /// Give the host a flexibility window; delivery may arrive at the early edge.
    Windowed,
    /// Target a derived wall-clock (RTC) instant, re-checked on a coarse cadence.
    /// Survives low-power states but is exposed to clock adjustments, so firings
    /// must be validated against the embedded monotonic target.
    WallClock,
}

/// Opaque payload echoed back when a wake fires, carrying the monotonic target
/// the request was derived from so the firing can be validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakePayload {
    pub target: Instant,
}

/// A one-shot wake request.
#[derive(Debug, Clone, Copy)]
pub struct WakeRequest {
    /// The logical due time in the monotonic frame.
    pub deadline: Instant,
    /// Wall-clock translation of the deadline; only populated in wall-clock mode.
    pub wall_deadline: Option<SystemTime>,
    /// Flexibility window; zero outside windowed mode.
    pub window: Duration,
    pub payload: WakePayload,
}

/// External one-shot wake facility. Fire-and-forget: nothing is awaited, the
/// firing arrives later as an independent callback.
pub trait WakeService: Send + Sync {
    /// Request a single wake, retiring any previously outstanding request.
    fn request_one_shot(&self, request: WakeRequest) -> Result<(), String>;

    /// Drop any outstanding request. Idempotent.
    fn cancel(&self);
}

#[derive(Debug)]
pub enum WakeCommand {
    Arm(WakeRequest),
    Cancel,
}

/// Handle to the in-process wake-timer task.
#[derive(Debug, Clone)]
pub struct TokioWake {
    tx: mpsc::UnboundedSender<WakeCommand>,
}

impl TokioWake {
    /// Create the handle plus the command receiver for the wake-timer task.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WakeCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl WakeService for TokioWake {
    fn request_one_shot(&self, request: WakeRequest) -> Result<(), String> {
        self.tx
            .send(WakeCommand::Arm(request))
            .map_err(|_| "wake timer task is not running".to_string())
    }

    fn cancel(&self) {
        // A closed channel means there is nothing left to cancel.
        let _ = self.tx.send(WakeCommand::Cancel);
    }
}
