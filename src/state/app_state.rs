//! Main application state management

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::timer::{PeriodicTimer, TimerCommand, TimerError, TimerState};

/// Application state owning the periodic timer and its tick counter
#[derive(Debug)]
pub struct AppState {
    /// The single timer driven by incoming commands
    pub timer: PeriodicTimer,
    /// Ticks counted by the controller
    pub count: AtomicU64,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last command tracking
    pub last_command: Mutex<Option<(TimerCommand, DateTime<Utc>)>>,
}

impl AppState {
    /// Create the application state and hook the tick counter to the timer.
    ///
    /// The tick callback only holds a weak reference to the state.
    pub fn new(port: u16, host: String, interval: Duration) -> Result<Arc<Self>, TimerError> {
        let state = Arc::new(Self {
            timer: PeriodicTimer::new(interval)?,
            count: AtomicU64::new(0),
            start_time: Instant::now(),
            port,
            host,
            last_command: Mutex::new(None),
        });

        state.timer.on_tick_weak(&state, |state| {
            state.record_tick();
        })?;
        Ok(state)
    }

    /// Increment the counter for one tick notification
    pub fn record_tick(&self) -> u64 {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        info!("count: {}", count);
        count
    }

    /// Current tick count
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Forward a command to the timer and record it
    pub fn handle_command(&self, command: TimerCommand) -> Result<TimerState, TimerError> {
        info!("Received {:?} command", command);
        match command {
            TimerCommand::Resume => self.timer.resume()?,
            TimerCommand::Suspend => self.timer.suspend()?,
        }

        if let Ok(mut last) = self.last_command.lock() {
            *last = Some((command, Utc::now()));
        }

        Ok(self.timer.state())
    }

    /// Get last command information
    pub fn get_last_command(&self) -> (Option<TimerCommand>, Option<DateTime<Utc>>) {
        match self.last_command.lock().ok().and_then(|last| *last) {
            Some((command, time)) => (Some(command), Some(time)),
            None => (None, None),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed())
    }
}

/// Format a duration as `1h 2m 3s`, omitting leading zero units
pub fn format_uptime(duration: Duration) -> String {
    let hours = duration.as_secs() / 3600;
    let minutes = (duration.as_secs() % 3600) / 60;
    let seconds = duration.as_secs() % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
