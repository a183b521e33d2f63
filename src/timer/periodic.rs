//! Suspendable, resumable periodic timer

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

use super::{
    EventHandler, SourceError, TimerCommand, TimerError, TimerSource, TimerState, TimerStatus,
    TokioTimerSource,
};

/// Callback invoked once per tick
pub type TickCallback = Arc<dyn Fn() + Send + Sync + 'static>;

struct Control<S> {
    state: TimerState,
    callback: Option<TickCallback>,
    /// `None` once teardown has begun
    source: Option<S>,
    ticks: u64,
}

struct Shared<S> {
    control: Mutex<Control<S>>,
    status_tx: watch::Sender<TimerStatus>,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Control<S>> {
        // User code never runs under this lock, so a poisoned guard still
        // holds consistent state.
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, control: &Control<S>) {
        self.status_tx.send_replace(TimerStatus {
            state: control.state,
            ticks: control.ticks,
        });
    }
}

/// A periodic timer with idempotent `resume`/`suspend` and safe teardown.
///
/// The timer starts suspended. Once resumed it fires **immediately** and
/// then every `interval`; each resume after a suspend restarts that
/// cadence, and ticks missed while suspended are not delivered.
///
/// Ticks run on the source's execution context (for [`TokioTimerSource`],
/// a dedicated tokio task). Control calls can come from any thread and
/// are serialized with tick delivery by an internal lock.
///
/// Dropping the timer tears it down: the callback is cleared, the
/// source's handler is detached, a suspended source is resumed, and only
/// then is it cancelled.
pub struct PeriodicTimer<S: TimerSource = TokioTimerSource> {
    interval: Duration,
    shared: Arc<Shared<S>>,
}

impl PeriodicTimer<TokioTimerSource> {
    /// Create a suspended timer on the current tokio runtime.
    ///
    /// Fails with [`TimerError::InvalidInterval`] for a zero interval and
    /// [`TimerError::NoRuntime`] outside a runtime.
    pub fn new(interval: Duration) -> Result<Self, TimerError> {
        if interval.is_zero() {
            return Err(TimerError::InvalidInterval);
        }
        Self::with_source(interval, TokioTimerSource::new()?)
    }
}

impl<S: TimerSource> PeriodicTimer<S> {
    /// Create a suspended timer over the given source.
    ///
    /// The source is armed with an immediate first fire but left paused.
    pub fn with_source(interval: Duration, mut source: S) -> Result<Self, TimerError> {
        if interval.is_zero() {
            return Err(TimerError::InvalidInterval);
        }

        let (status_tx, _) = watch::channel(TimerStatus::new());
        let shared = Arc::new(Shared {
            control: Mutex::new(Control {
                state: TimerState::Suspended,
                callback: None,
                source: None,
                ticks: 0,
            }),
            status_tx,
        });

        let weak = Arc::downgrade(&shared);
        let handler: EventHandler = Arc::new(move || deliver_tick(&weak));
        check("set_event_handler", source.set_event_handler(Some(handler)));
        check("arm", source.arm(interval, true));

        shared.lock().source = Some(source);
        debug!("Created periodic timer with interval {:?}", interval);

        Ok(Self { interval, shared })
    }

    /// The fixed tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current lifecycle state
    pub fn state(&self) -> TimerState {
        self.shared.lock().state
    }

    /// Number of ticks delivered so far
    pub fn ticks(&self) -> u64 {
        self.shared.lock().ticks
    }

    /// Whether teardown has begun
    pub fn is_torn_down(&self) -> bool {
        self.shared.lock().source.is_none()
    }

    /// Watch state changes and tick counts without registering a callback
    pub fn subscribe(&self) -> watch::Receiver<TimerStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Replace the tick callback. `None` detaches it.
    pub fn set_callback(&self, callback: Option<TickCallback>) -> Result<(), TimerError> {
        let mut control = self.shared.lock();
        if control.source.is_none() {
            return Err(TimerError::UseAfterTeardown);
        }
        control.callback = callback;
        Ok(())
    }

    /// Register a closure as the tick callback
    pub fn on_tick<F>(&self, f: F) -> Result<(), TimerError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.set_callback(Some(Arc::new(f)))
    }

    /// Register a callback that only holds a weak reference to `owner`.
    ///
    /// Ticks after `owner` has been dropped are ignored, so being notified
    /// never extends the owner's lifetime.
    pub fn on_tick_weak<T, F>(&self, owner: &Arc<T>, f: F) -> Result<(), TimerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let owner = Arc::downgrade(owner);
        self.on_tick(move || {
            if let Some(owner) = owner.upgrade() {
                f(&owner);
            }
        })
    }

    /// Start delivering ticks. No-op if already resumed.
    ///
    /// The first tick fires immediately, then once per interval.
    pub fn resume(&self) -> Result<(), TimerError> {
        self.apply(TimerCommand::Resume)
    }

    /// Stop delivering ticks. No-op if already suspended.
    pub fn suspend(&self) -> Result<(), TimerError> {
        self.apply(TimerCommand::Suspend)
    }

    fn apply(&self, command: TimerCommand) -> Result<(), TimerError> {
        let mut guard = self.shared.lock();
        let control = &mut *guard;
        let Some(source) = control.source.as_mut() else {
            return Err(TimerError::UseAfterTeardown);
        };

        if !control.state.transitions_on(command) {
            debug!("Timer already {}, ignoring {:?}", control.state, command);
            return Ok(());
        }

        // State flips before the source is touched so a concurrent tick
        // never sees a stale state.
        control.state = control.state.apply(command);
        match command {
            TimerCommand::Resume => check("resume", source.resume()),
            TimerCommand::Suspend => check("pause", source.pause()),
        }

        self.shared.publish(control);
        info!("Timer {}", control.state);
        Ok(())
    }

    /// Tear the timer down. Idempotent; later control calls fail with
    /// [`TimerError::UseAfterTeardown`].
    ///
    /// Cancelling a paused source faults on dispatch-style platforms, so a
    /// suspended source is always resumed right before it is cancelled.
    pub fn shutdown(&self) {
        let mut control = self.shared.lock();
        control.callback = None;
        let Some(mut source) = control.source.take() else {
            return;
        };

        check("set_event_handler", source.set_event_handler(None));
        if !control.state.is_resumed() {
            check("resume", source.resume());
        }
        check("cancel", source.cancel());
        drop(source);

        info!("Timer torn down after {} ticks", control.ticks);
    }
}

impl<S: TimerSource> Drop for PeriodicTimer<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S: TimerSource> std::fmt::Debug for PeriodicTimer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let control = self.shared.lock();
        f.debug_struct("PeriodicTimer")
            .field("interval", &self.interval)
            .field("state", &control.state)
            .field("ticks", &control.ticks)
            .field("torn_down", &control.source.is_none())
            .finish()
    }
}

/// Source errors mean the state guards above were bypassed
fn check(operation: &str, result: Result<(), SourceError>) {
    if let Err(e) = result {
        error!("Timer source rejected {}: {}", operation, e);
        debug_assert!(false, "timer source rejected {operation}: {e}");
    }
}

fn deliver_tick<S: TimerSource>(shared: &Weak<Shared<S>>) {
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let callback = {
        let mut control = shared.lock();
        if control.source.is_none() || !control.state.is_resumed() {
            trace!("Dropping tick, timer is {} or torn down", control.state);
            return;
        }
        control.ticks += 1;
        shared.publish(&control);
        control.callback.clone()
    };

    if let Some(callback) = callback {
        callback();
    }
}
