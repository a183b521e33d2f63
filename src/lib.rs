//! Periodic Timer - a suspendable, resumable periodic timer with safe teardown
//!
//! The core is [`timer::PeriodicTimer`]. The remaining modules make up a small
//! HTTP controller that maps resume/suspend commands onto one timer and
//! counts its ticks.

pub mod config;
pub mod timer;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use timer::{PeriodicTimer, TimerError, TimerState};
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
