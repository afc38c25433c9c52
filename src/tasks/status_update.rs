//! Status display background task
//!
//! The display observer the core never owns: it subscribes to core snapshots and
//! refreshes the persistent status on every transition, plus once a second while
//! the timer is running so the shown elapsed time keeps moving. It ends when the
//! snapshot channel closes, so tearing down the app unsubscribes it explicitly.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::state::{AppState, TimerState};

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

pub async fn status_update_task(app: Arc<AppState>, notifier: Arc<dyn Notifier>) {
    info!("Starting status update task");

    let mut status_rx = app.status_tx.subscribe();
    let mut ticker = interval(REFRESH_INTERVAL);

    loop {
        let running = status_rx.borrow().state == TimerState::Running;

        tokio::select! {
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = ticker.tick(), if running => {}
        }

        match app.snapshot() {
            Ok(snapshot) => notifier.show_or_update_persistent_status(
                snapshot.state == TimerState::Running,
                snapshot.elapsed,
                snapshot.state == TimerState::Stopped,
            ),
            Err(e) => warn!("Failed to read status snapshot: {}", e),
        }
    }

    info!("Status update task stopped");
}
