//! State management module
//!
//! This module contains the controller's application state.

pub mod app_state;

// Re-export main types
pub use app_state::AppState;
