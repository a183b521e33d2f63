//! Timer state structure and transitions

use serde::{Deserialize, Serialize};

/// Lifecycle state of a periodic timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Initial state; no ticks are delivered.
    #[default]
    Suspended,
    /// Ticks are delivered once per interval.
    Resumed,
}

/// A control command issued to a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerCommand {
    Resume,
    Suspend,
}

impl TimerState {
    /// Apply a command and return the resulting state.
    ///
    /// Redundant commands leave the state unchanged.
    pub fn apply(self, command: TimerCommand) -> Self {
        match command {
            TimerCommand::Resume => TimerState::Resumed,
            TimerCommand::Suspend => TimerState::Suspended,
        }
    }

    /// Whether applying `command` would change the state
    pub fn transitions_on(self, command: TimerCommand) -> bool {
        self.apply(command) != self
    }

    /// Fold a sequence of commands starting from the initial state
    pub fn fold<I>(commands: I) -> Self
    where
        I: IntoIterator<Item = TimerCommand>,
    {
        commands
            .into_iter()
            .fold(TimerState::default(), TimerState::apply)
    }

    /// Check if ticks are being delivered
    pub fn is_resumed(&self) -> bool {
        matches!(self, TimerState::Resumed)
    }
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerState::Suspended => write!(f, "suspended"),
            TimerState::Resumed => write!(f, "resumed"),
        }
    }
}

/// Snapshot published to timer watchers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerStatus {
    pub state: TimerState,
    pub ticks: u64,
}

impl TimerStatus {
    /// Create the status of a freshly constructed timer
    pub fn new() -> Self {
        Self::default()
    }
}
