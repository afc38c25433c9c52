//! HTTP endpoint handlers
//!
//! Deliberately thin: every handler forwards one gesture to the timer (or one
//! write to the settings), lets the orchestrator react, and reports the
//! resulting state.

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info};

use crate::orchestrator;
use crate::state::TimerState;

use super::responses::{
    ApiResponse, HealthResponse, SettingsRequest, SettingsResponse, StatusResponse, TimerStatus,
};
use super::ApiContext;

fn timer_status(ctx: &ApiContext) -> Result<TimerStatus, StatusCode> {
    let snapshot = ctx.app.snapshot().map_err(|e| {
        error!("Failed to snapshot core state: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let so_far = ctx
        .scheduler
        .reminders_so_far(snapshot.elapsed, snapshot.period);
    Ok(TimerStatus::new(snapshot, so_far))
}

fn transition(
    ctx: &ApiContext,
    message: &str,
    apply: impl FnOnce(&mut crate::state::CoreState) -> &'static str,
) -> Result<Json<ApiResponse>, StatusCode> {
    let action = ctx.app.with_core(apply).map_err(|e| {
        error!("Failed to apply transition: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    orchestrator::apply_transition(&ctx.app, &ctx.scheduler, action);
    info!("{} -> {}", message, action);

    Ok(Json(ApiResponse::new(message.to_string(), timer_status(ctx)?)))
}

/// Handle POST /toggle - run a reset/paused timer, pause a running one
pub async fn toggle_handler(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse>, StatusCode> {
    transition(&ctx, "Toggled run/pause", |core| {
        core.timer.toggle_run_pause();
        if core.timer.is_running() {
            "run"
        } else {
            "pause"
        }
    })
}

/// Handle POST /reset - back to zero from any state
pub async fn reset_handler(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse>, StatusCode> {
    transition(&ctx, "Reset timer", |core| {
        core.timer.reset();
        "reset"
    })
}

/// Handle POST /stop - freeze the elapsed value and silence reminders
pub async fn stop_handler(State(ctx): State<ApiContext>) -> Result<Json<ApiResponse>, StatusCode> {
    transition(&ctx, "Stopped timer", |core| {
        core.timer.stop();
        "stop"
    })
}

/// Handle POST /cycle - advance reset -> running -> paused -> reset
pub async fn cycle_handler(State(ctx): State<ApiContext>) -> Result<Json<ApiResponse>, StatusCode> {
    transition(&ctx, "Cycled timer", |core| {
        core.timer.cycle();
        match core.timer.state() {
            TimerState::Running => "cycle-run",
            TimerState::Paused => "cycle-pause",
            _ => "cycle-reset",
        }
    })
}

/// Handle GET /settings - current reminder settings
pub async fn get_settings_handler(
    State(ctx): State<ApiContext>,
) -> Result<Json<SettingsResponse>, StatusCode> {
    let settings = ctx.app.with_core(|core| core.settings).map_err(|e| {
        error!("Failed to read settings: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(SettingsResponse {
        period_seconds: settings.period_secs(),
        enabled: settings.enabled,
    }))
}

/// Handle PUT /settings - update period and/or enabled flag
///
/// This is the settings-write boundary: a non-positive period is rejected here
/// and never reaches the scheduler.
pub async fn put_settings_handler(
    State(ctx): State<ApiContext>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, StatusCode> {
    if request.period_seconds == Some(0) {
        info!("Rejecting settings update with zero period");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let settings = ctx
        .app
        .with_core(|core| {
            if let Some(period) = request.period_seconds {
                // Zero was rejected above; this cannot fail.
                let _ = core.settings.set_period_secs(period);
            }
            if let Some(enabled) = request.enabled {
                core.settings.enabled = enabled;
            }
            core.settings
        })
        .map_err(|e| {
            error!("Failed to update settings: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    orchestrator::apply_transition(&ctx.app, &ctx.scheduler, "settings");
    info!(
        "Settings updated: period={}s enabled={}",
        settings.period_secs(),
        settings.enabled
    );

    Ok(Json(SettingsResponse {
        period_seconds: settings.period_secs(),
        enabled: settings.enabled,
    }))
}

/// Handle GET /status - full server and timer status
pub async fn status_handler(
    State(ctx): State<ApiContext>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = timer_status(&ctx)?;
    let (last_action, last_action_time) = ctx.app.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        reminders_available: ctx.app.reminders_available(),
        errors: ctx.app.get_errors(),
        uptime: ctx.app.get_uptime(),
        port: ctx.app.port,
        host: ctx.app.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
