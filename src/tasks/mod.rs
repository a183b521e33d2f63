//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod status_monitor;

// Re-export main functions
pub use status_monitor::status_monitor_task;
