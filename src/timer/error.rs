//! Timer error types

use thiserror::Error;

/// Errors returned by [`PeriodicTimer`](super::PeriodicTimer) operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The requested interval was zero. Zero is rejected rather than clamped.
    #[error("timer interval must be greater than zero")]
    InvalidInterval,

    /// A control call was issued after teardown began.
    #[error("timer has been torn down")]
    UseAfterTeardown,

    /// The timer was constructed outside of a tokio runtime.
    #[error("periodic timer requires a running tokio runtime")]
    NoRuntime,
}

/// Errors reported by a [`TimerSource`](super::TimerSource).
///
/// These model the faults a platform periodic timer raises when driven
/// out of order. `PeriodicTimer` never lets them reach its callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("timer source resumed before being armed")]
    NotArmed,

    #[error("timer source is already active")]
    AlreadyActive,

    #[error("timer source is already paused")]
    AlreadyPaused,

    /// Cancelling a paused source faults on dispatch-style platforms.
    #[error("timer source cancelled while paused")]
    CancelWhilePaused,

    #[error("timer source has been cancelled")]
    Cancelled,
}
