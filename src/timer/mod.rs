//! Periodic timer module
//!
//! This module contains the suspendable periodic timer, the platform timer
//! abstraction it drives, and the state machine shared by both.

pub mod error;
pub mod mock;
pub mod periodic;
pub mod source;
pub mod state;

// Re-export main types
pub use error::{SourceError, TimerError};
pub use periodic::{PeriodicTimer, TickCallback};
pub use source::{EventHandler, TimerSource, TokioTimerSource};
pub use state::{TimerCommand, TimerState, TimerStatus};
