//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::error;

use crate::{
    state::AppState,
    timer::{TimerCommand, TimerError},
};
use super::responses::{CommandResponse, HealthResponse, StatusResponse};

fn run_command(state: &AppState, command: TimerCommand) -> Result<Json<CommandResponse>, StatusCode> {
    match state.handle_command(command) {
        Ok(timer_state) => Ok(Json(CommandResponse::new(
            format!("Timer {}", timer_state),
            timer_state,
            state.count(),
        ))),
        Err(TimerError::UseAfterTeardown) => {
            error!("Timer command {:?} after shutdown", command);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(e) => {
            error!("Failed to apply {:?}: {}", command, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /resume - Start delivering ticks
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> Result<Json<CommandResponse>, StatusCode> {
    run_command(&state, TimerCommand::Resume)
}

/// Handle POST /suspend - Stop delivering ticks
pub async fn suspend_handler(State(state): State<Arc<AppState>>) -> Result<Json<CommandResponse>, StatusCode> {
    run_command(&state, TimerCommand::Suspend)
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_command, last_command_time) = state.get_last_command();

    Json(StatusResponse {
        state: state.timer.state(),
        count: state.count(),
        ticks: state.timer.ticks(),
        interval_ms: state.timer.interval().as_millis() as u64,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_command: last_command.map(|c| format!("{:?}", c).to_lowercase()),
        last_command_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
