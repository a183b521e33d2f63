//! Platform timer abstraction and its tokio-backed implementation

use std::{sync::Arc, time::Duration};
use tokio::{
    runtime::Handle,
    sync::mpsc,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, trace, warn};

use super::{SourceError, TimerError};

/// Handler invoked by a source each time it fires
pub type EventHandler = Arc<dyn Fn() + Send + Sync + 'static>;

/// A platform-level repeating timer with pause/resume semantics.
///
/// Sources behave like dispatch timer sources: they start out paused,
/// reject redundant pause/resume calls, and fault when cancelled while
/// paused. Callers are expected to guard against all of these.
pub trait TimerSource: Send + 'static {
    /// Install or clear the handler run on every fire
    fn set_event_handler(&mut self, handler: Option<EventHandler>) -> Result<(), SourceError>;

    /// Configure the schedule without activating it
    fn arm(&mut self, interval: Duration, immediate_first_fire: bool) -> Result<(), SourceError>;

    /// Start firing on the armed schedule
    fn resume(&mut self) -> Result<(), SourceError>;

    /// Stop firing until the next resume
    fn pause(&mut self) -> Result<(), SourceError>;

    /// Retire the source permanently. Only valid while active.
    fn cancel(&mut self) -> Result<(), SourceError>;
}

/// Configuration flags shared by source implementations to enforce
/// platform ordering rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Lifecycle {
    pub armed: bool,
    pub active: bool,
    pub cancelled: bool,
}

impl Lifecycle {
    pub fn configure(&mut self) -> Result<(), SourceError> {
        if self.cancelled {
            return Err(SourceError::Cancelled);
        }
        Ok(())
    }

    pub fn arm(&mut self) -> Result<(), SourceError> {
        self.configure()?;
        self.armed = true;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SourceError> {
        self.configure()?;
        if !self.armed {
            return Err(SourceError::NotArmed);
        }
        if self.active {
            return Err(SourceError::AlreadyActive);
        }
        self.active = true;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), SourceError> {
        self.configure()?;
        if !self.active {
            return Err(SourceError::AlreadyPaused);
        }
        self.active = false;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), SourceError> {
        self.configure()?;
        if !self.active {
            return Err(SourceError::CancelWhilePaused);
        }
        self.cancelled = true;
        Ok(())
    }
}

enum SourceCommand {
    SetHandler(Option<EventHandler>),
    Arm {
        interval: Duration,
        immediate_first_fire: bool,
    },
    Resume,
    Pause,
    Cancel,
}

/// Timer source driven by a dedicated tokio task.
///
/// Control calls return immediately; they are validated here and
/// forwarded in order to the driver task, which owns the schedule and
/// runs the event handler. Every resume restarts the schedule, so with
/// `immediate_first_fire` the first fire happens right away and then
/// once per interval. Missed fires are not caught up.
#[derive(Debug)]
pub struct TokioTimerSource {
    tx: mpsc::UnboundedSender<SourceCommand>,
    lifecycle: Lifecycle,
}

impl TokioTimerSource {
    /// Create a source on the current tokio runtime
    pub fn new() -> Result<Self, TimerError> {
        let handle = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        Ok(Self::with_handle(&handle))
    }

    /// Create a source whose driver task runs on `handle`
    pub fn with_handle(handle: &Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(drive_source(rx));

        Self {
            tx,
            lifecycle: Lifecycle::default(),
        }
    }

    fn send(&self, command: SourceCommand) {
        if self.tx.send(command).is_err() {
            warn!("Timer source driver is gone, command dropped");
        }
    }
}

impl TimerSource for TokioTimerSource {
    fn set_event_handler(&mut self, handler: Option<EventHandler>) -> Result<(), SourceError> {
        self.lifecycle.configure()?;
        self.send(SourceCommand::SetHandler(handler));
        Ok(())
    }

    fn arm(&mut self, interval: Duration, immediate_first_fire: bool) -> Result<(), SourceError> {
        self.lifecycle.arm()?;
        self.send(SourceCommand::Arm {
            interval,
            immediate_first_fire,
        });
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SourceError> {
        self.lifecycle.resume()?;
        self.send(SourceCommand::Resume);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SourceError> {
        self.lifecycle.pause()?;
        self.send(SourceCommand::Pause);
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), SourceError> {
        self.lifecycle.cancel()?;
        self.send(SourceCommand::Cancel);
        Ok(())
    }
}

impl std::fmt::Debug for SourceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceCommand::SetHandler(handler) => {
                write!(f, "SetHandler({})", if handler.is_some() { "some" } else { "none" })
            }
            SourceCommand::Arm {
                interval,
                immediate_first_fire,
            } => write!(f, "Arm({:?}, immediate={})", interval, immediate_first_fire),
            SourceCommand::Resume => write!(f, "Resume"),
            SourceCommand::Pause => write!(f, "Pause"),
            SourceCommand::Cancel => write!(f, "Cancel"),
        }
    }
}

fn build_ticker(period: Duration, immediate_first_fire: bool) -> Interval {
    let start = if immediate_first_fire {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_fire(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Driver task: applies commands in arrival order and fires the handler
async fn drive_source(mut rx: mpsc::UnboundedReceiver<SourceCommand>) {
    debug!("Timer source driver started");

    let mut handler: Option<EventHandler> = None;
    let mut schedule: Option<(Duration, bool)> = None;
    let mut ticker: Option<Interval> = None;

    loop {
        tokio::select! {
            // Queued commands are applied before a ready fire.
            biased;

            command = rx.recv() => {
                let Some(command) = command else {
                    debug!("Timer source handle dropped, stopping driver");
                    break;
                };
                trace!("Timer source command: {:?}", command);

                match command {
                    SourceCommand::SetHandler(new_handler) => handler = new_handler,
                    SourceCommand::Arm { interval, immediate_first_fire } => {
                        schedule = Some((interval, immediate_first_fire));
                        if ticker.is_some() {
                            ticker = Some(build_ticker(interval, immediate_first_fire));
                        }
                    }
                    SourceCommand::Resume => {
                        ticker = schedule.map(|(interval, immediate)| build_ticker(interval, immediate));
                    }
                    SourceCommand::Pause => ticker = None,
                    SourceCommand::Cancel => {
                        debug!("Timer source cancelled");
                        break;
                    }
                }
            }

            _ = next_fire(&mut ticker) => {
                if let Some(handler) = &handler {
                    handler();
                }
            }
        }
    }
}
