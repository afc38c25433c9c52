//! Simmer - a state-managed HTTP stopwatch server with periodic reminder alarms
//!
//! This is the main entry point for the simmer application.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use simmer::{
    api::{create_router, ApiContext},
    config::Config,
    notify::{CommandNotifier, Notifier},
    orchestrator,
    persist::StateStore,
    scheduler::{ReminderScheduler, TokioWake, WakeMode},
    state::{AppState, Timer},
    tasks::{clock_monitor_task, status_update_task, wake_timer_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("simmer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting simmer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, wake_mode={:?}, state_file={}",
        config.host,
        config.port,
        config.wake_mode,
        config.state_file.display()
    );

    // Restore the previous session, or start fresh when nothing valid is saved.
    let store = StateStore::new(config.state_file.clone());
    let persisted = store.load(config.default_settings());
    let timer = Timer::restore(
        Duration::from_millis(persisted.accumulated_ms),
        persisted.state,
    );
    info!(
        "Timer restored: state={:?}, elapsed={}",
        timer.state(),
        timer.format_hh_mm_ss()
    );

    let app = Arc::new(AppState::new(
        timer,
        persisted.settings,
        store,
        config.port,
        config.host.clone(),
    ));

    let notifier: Arc<dyn Notifier> = Arc::new(CommandNotifier::from_config(&config));
    let (wake, wake_rx) = TokioWake::channel();
    let scheduler = Arc::new(ReminderScheduler::new(
        Arc::new(wake),
        notifier.clone(),
        config.scheduler_config(),
        config.wake_mode,
    ));

    // Background tasks: the wake slot owner, the clock monitor (wall-clock
    // targets only), and the status display driver.
    tokio::spawn(wake_timer_task(wake_rx, scheduler.clone(), app.clone()));
    if config.wake_mode == WakeMode::WallClock {
        tokio::spawn(clock_monitor_task(app.clone(), scheduler.clone()));
    }
    tokio::spawn(status_update_task(app.clone(), notifier.clone()));

    // A restored running timer picks up its reminder schedule right away.
    orchestrator::sync_reminders(&app, &scheduler);
    app.publish_status();

    // Create HTTP router with all endpoints
    let router = create_router(
        ApiContext {
            app: app.clone(),
            scheduler: scheduler.clone(),
        },
        config.hide_stop,
    );

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /toggle    - Run or pause the stopwatch");
    info!("  POST /reset     - Back to zero");
    if !config.hide_stop {
        info!("  POST /stop      - Freeze the timer and silence reminders");
    }
    info!("  POST /cycle     - Advance reset -> running -> paused -> reset");
    info!("  GET  /settings  - Current reminder settings");
    info!("  PUT  /settings  - Update reminder period / enabled flag");
    info!("  GET  /status    - Timer state, elapsed time, and reminders");
    info!("  GET  /health    - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, router);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Persist on the way out so the elapsed time survives the restart.
    if let Err(e) = app.persist() {
        tracing::error!("Failed to save state on shutdown: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
