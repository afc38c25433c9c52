//! HTTP API module
//!
//! The gesture surface of the stopwatch: endpoints map one-to-one onto the
//! timer's operations plus the settings-write boundary and status queries.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::scheduler::ReminderScheduler;
use crate::state::AppState;

use handlers::*;

/// Shared handler context.
#[derive(Clone)]
pub struct ApiContext {
    pub app: Arc<AppState>,
    pub scheduler: Arc<ReminderScheduler>,
}

/// Create the HTTP router with all endpoints.
///
/// The stop affordance is optional (`hide_stop`); the state machine supports it
/// either way, only the route disappears.
pub fn create_router(ctx: ApiContext, hide_stop: bool) -> Router {
    let mut router = Router::new()
        .route("/toggle", post(toggle_handler))
        .route("/reset", post(reset_handler))
        .route("/cycle", post(cycle_handler))
        .route(
            "/settings",
            get(get_settings_handler).put(put_settings_handler),
        )
        .route("/status", get(status_handler))
        .route("/health", get(health_handler));

    if !hide_stop {
        router = router.route("/stop", post(stop_handler));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
