//! Periodic timer integration tests.
//!
//! Drives the tokio-backed timer on a paused clock:
//! - Immediate first tick, then one per interval
//! - Idempotent resume/suspend
//! - No ticks while suspended or after teardown
//! - Teardown from either state

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use periodic_timer::timer::{
    mock::{RecordingSource, SourceCall},
    PeriodicTimer, TimerCommand, TimerError, TimerState,
};
use proptest::prelude::*;
use tokio::time::sleep;

const INTERVAL: Duration = Duration::from_secs(1);

/// Helper to build a timer whose callback bumps a shared counter
fn counting_timer(interval: Duration) -> (PeriodicTimer, Arc<AtomicUsize>) {
    let timer = PeriodicTimer::new(interval).expect("valid timer");
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    timer
        .on_tick(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .expect("timer is live");
    (timer, count)
}

fn ticks(count: &AtomicUsize) -> usize {
    count.load(Ordering::SeqCst)
}

#[tokio::test(start_paused = true)]
async fn resume_fires_immediately_then_every_interval() {
    let (timer, count) = counting_timer(INTERVAL);
    timer.resume().unwrap();

    sleep(INTERVAL / 2).await;
    assert_eq!(ticks(&count), 1);

    for expected in 2..=6 {
        sleep(INTERVAL).await;
        assert_eq!(ticks(&count), expected);
    }
    assert_eq!(timer.ticks(), 6);
}

#[tokio::test(start_paused = true)]
async fn double_resume_keeps_single_cadence() {
    let (timer, count) = counting_timer(INTERVAL);
    timer.resume().unwrap();
    timer.resume().unwrap();

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(ticks(&count), 4);
    assert_eq!(timer.state(), TimerState::Resumed);
}

#[tokio::test(start_paused = true)]
async fn suspend_pauses_and_resume_restarts_cadence() {
    let (timer, count) = counting_timer(INTERVAL);
    timer.resume().unwrap();

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(ticks(&count), 3);

    timer.suspend().unwrap();
    sleep(Duration::from_secs(2)).await;
    assert_eq!(ticks(&count), 3);

    timer.resume().unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(ticks(&count), 4);

    sleep(INTERVAL).await;
    assert_eq!(ticks(&count), 5);
}

#[tokio::test(start_paused = true)]
async fn suspend_without_resume_then_drop() {
    let (timer, count) = counting_timer(INTERVAL);
    timer.suspend().unwrap();
    drop(timer);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(ticks(&count), 0);
}

#[tokio::test(start_paused = true)]
async fn drop_while_resumed_stops_ticks() {
    let (timer, count) = counting_timer(INTERVAL);
    timer.resume().unwrap();

    // Wake exactly on a tick boundary so a fire is due as the timer drops
    sleep(INTERVAL).await;
    drop(timer);
    let at_drop = ticks(&count);
    assert!(at_drop >= 1);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(ticks(&count), at_drop);
}

#[tokio::test(start_paused = true)]
async fn shutdown_rejects_further_control() {
    let (timer, count) = counting_timer(INTERVAL);
    timer.resume().unwrap();
    sleep(INTERVAL / 2).await;

    timer.shutdown();
    assert_eq!(timer.resume(), Err(TimerError::UseAfterTeardown));
    assert_eq!(timer.suspend(), Err(TimerError::UseAfterTeardown));

    sleep(Duration::from_secs(3)).await;
    assert_eq!(ticks(&count), 1);
}

#[tokio::test]
async fn zero_interval_is_rejected() {
    assert_eq!(
        PeriodicTimer::new(Duration::ZERO).unwrap_err(),
        TimerError::InvalidInterval
    );
}

#[test]
fn construction_outside_runtime_is_rejected() {
    assert_eq!(
        PeriodicTimer::new(INTERVAL).unwrap_err(),
        TimerError::NoRuntime
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_control_from_many_threads() {
    let (timer, count) = counting_timer(Duration::from_millis(1));
    let timer = Arc::new(timer);

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let timer = Arc::clone(&timer);
            thread::spawn(move || {
                for n in 0..200 {
                    if (n + i) % 2 == 0 {
                        timer.resume().unwrap();
                    } else {
                        timer.suspend().unwrap();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    timer.suspend().unwrap();
    assert_eq!(timer.state(), TimerState::Suspended);

    sleep(Duration::from_millis(50)).await;
    let settled = ticks(&count);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(ticks(&count), settled);
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Command(TimerCommand),
    Advance(u64),
}

fn command() -> impl Strategy<Value = TimerCommand> {
    prop_oneof![Just(TimerCommand::Resume), Just(TimerCommand::Suspend)]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        command().prop_map(Step::Command),
        (1u64..3000).prop_map(Step::Advance),
    ]
}

proptest! {
    #[test]
    fn state_is_fold_of_commands(commands in prop::collection::vec(command(), 0..40)) {
        let (source, probe) = RecordingSource::new();
        let timer = PeriodicTimer::with_source(INTERVAL, source).unwrap();

        let mut expected = TimerState::Suspended;
        let mut transitions = 0;
        for command in &commands {
            match command {
                TimerCommand::Resume => timer.resume().unwrap(),
                TimerCommand::Suspend => timer.suspend().unwrap(),
            }
            if expected.transitions_on(*command) {
                transitions += 1;
            }
            expected = expected.apply(*command);
            prop_assert_eq!(timer.state(), expected);
        }
        prop_assert_eq!(timer.state(), TimerState::fold(commands.iter().copied()));

        let control_calls = probe
            .calls()
            .into_iter()
            .filter(|c| matches!(c, SourceCall::Resume | SourceCall::Pause))
            .count();
        prop_assert_eq!(control_calls, transitions);

        drop(timer);
        prop_assert!(probe.rejected().is_empty());
        prop_assert_eq!(probe.calls().last().copied(), Some(SourceCall::Cancel));
    }

    #[test]
    fn no_ticks_while_suspended(steps in prop::collection::vec(step(), 1..30)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        runtime.block_on(async {
            let (timer, count) = counting_timer(INTERVAL);

            for step in steps {
                match step {
                    Step::Command(TimerCommand::Resume) => timer.resume().unwrap(),
                    Step::Command(TimerCommand::Suspend) => timer.suspend().unwrap(),
                    Step::Advance(ms) => {
                        let before = ticks(&count);
                        let suspended = timer.state() == TimerState::Suspended;
                        sleep(Duration::from_millis(ms)).await;
                        if suspended {
                            prop_assert_eq!(ticks(&count), before);
                        }
                    }
                }
            }

            let before = ticks(&count);
            drop(timer);
            sleep(Duration::from_secs(10)).await;
            prop_assert_eq!(ticks(&count), before);
            Ok(())
        })?;
    }
}
