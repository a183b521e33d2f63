//! Recording timer source for testing
//!
//! `RecordingSource` enforces the same ordering rules as the real source
//! but never fires on its own. Tests drive it through a [`SourceProbe`].

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use super::{source::Lifecycle, EventHandler, SourceError, TimerSource};

/// A call made on a [`RecordingSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCall {
    /// `true` when a handler was installed, `false` when it was cleared
    SetHandler(bool),
    Arm {
        interval: Duration,
        immediate_first_fire: bool,
    },
    Resume,
    Pause,
    Cancel,
}

#[derive(Default)]
struct Recorded {
    calls: Vec<SourceCall>,
    rejected: Vec<SourceError>,
    handler: Option<EventHandler>,
    lifecycle: Lifecycle,
}

/// Mock timer source that records every call
pub struct RecordingSource {
    inner: Arc<Mutex<Recorded>>,
}

/// Test-side view of a [`RecordingSource`]
#[derive(Clone)]
pub struct SourceProbe {
    inner: Arc<Mutex<Recorded>>,
}

fn lock(inner: &Mutex<Recorded>) -> MutexGuard<'_, Recorded> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingSource {
    /// Create a source and the probe observing it
    pub fn new() -> (Self, SourceProbe) {
        let inner = Arc::new(Mutex::new(Recorded::default()));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            SourceProbe { inner },
        )
    }

    fn record<F>(&self, call: SourceCall, step: F) -> Result<(), SourceError>
    where
        F: FnOnce(&mut Recorded) -> Result<(), SourceError>,
    {
        let mut recorded = lock(&self.inner);
        recorded.calls.push(call);
        let result = step(&mut recorded);
        if let Err(e) = result {
            recorded.rejected.push(e);
        }
        result
    }
}

impl TimerSource for RecordingSource {
    fn set_event_handler(&mut self, handler: Option<EventHandler>) -> Result<(), SourceError> {
        self.record(SourceCall::SetHandler(handler.is_some()), |r| {
            r.lifecycle.configure()?;
            r.handler = handler;
            Ok(())
        })
    }

    fn arm(&mut self, interval: Duration, immediate_first_fire: bool) -> Result<(), SourceError> {
        self.record(
            SourceCall::Arm {
                interval,
                immediate_first_fire,
            },
            |r| r.lifecycle.arm(),
        )
    }

    fn resume(&mut self) -> Result<(), SourceError> {
        self.record(SourceCall::Resume, |r| r.lifecycle.resume())
    }

    fn pause(&mut self) -> Result<(), SourceError> {
        self.record(SourceCall::Pause, |r| r.lifecycle.pause())
    }

    fn cancel(&mut self) -> Result<(), SourceError> {
        self.record(SourceCall::Cancel, |r| r.lifecycle.cancel())
    }
}

impl SourceProbe {
    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<SourceCall> {
        lock(&self.inner).calls.clone()
    }

    /// Calls the source refused, in order
    pub fn rejected(&self) -> Vec<SourceError> {
        lock(&self.inner).rejected.clone()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.inner).lifecycle.active
    }

    pub fn is_cancelled(&self) -> bool {
        lock(&self.inner).lifecycle.cancelled
    }

    /// The currently installed handler, if any.
    ///
    /// Holding on to it and calling it later simulates a fire that was
    /// already in flight.
    pub fn handler(&self) -> Option<EventHandler> {
        lock(&self.inner).handler.clone()
    }

    /// Fire once if the source is active. Returns whether a handler ran.
    pub fn fire(&self) -> bool {
        let handler = {
            let recorded = lock(&self.inner);
            if !recorded.lifecycle.active || recorded.lifecycle.cancelled {
                return false;
            }
            recorded.handler.clone()
        };

        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}
