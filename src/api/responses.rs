//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// API response structure for timer command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub state: TimerState,
    pub count: u64,
}

impl CommandResponse {
    /// Create a new command response
    pub fn new(message: String, state: TimerState, count: u64) -> Self {
        Self {
            status: state.to_string(),
            message,
            timestamp: Utc::now(),
            state,
            count,
        }
    }
}

/// Status response with timer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: TimerState,
    pub count: u64,
    pub ticks: u64,
    pub interval_ms: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_command: Option<String>,
    pub last_command_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
