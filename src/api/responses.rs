//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{format_elapsed, TimerSnapshot, TimerState};

/// Timer details embedded in every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStatus {
    pub state: TimerState,
    pub elapsed_ms: u64,
    pub display: String,
    pub reminders_enabled: bool,
    pub period_seconds: u64,
    pub reminders_so_far: u64,
}

impl TimerStatus {
    pub fn new(snapshot: TimerSnapshot, reminders_so_far: u64) -> Self {
        Self {
            state: snapshot.state,
            elapsed_ms: snapshot.elapsed.as_millis() as u64,
            display: format_elapsed(snapshot.elapsed, true),
            reminders_enabled: snapshot.reminders_enabled,
            period_seconds: snapshot.period.as_secs(),
            reminders_so_far,
        }
    }
}

/// API response structure for transition endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerStatus,
}

impl ApiResponse {
    pub fn new(message: String, timer: TimerStatus) -> Self {
        Self {
            status: format!("{:?}", timer.state).to_lowercase(),
            message,
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Full status response for GET /status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerStatus,
    pub reminders_available: bool,
    pub errors: Vec<String>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Settings view for GET /settings and the PUT /settings response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub period_seconds: u64,
    pub enabled: bool,
}

/// Partial settings update body for PUT /settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsRequest {
    pub period_seconds: Option<u64>,
    pub enabled: Option<bool>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
