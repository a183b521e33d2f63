//! Timer status monitor background task

use tokio::sync::watch;
use tracing::{debug, info};

use crate::timer::{TimerState, TimerStatus};

/// Background task that logs timer state changes until the timer goes away.
///
/// Returns the last status observed.
pub async fn status_monitor_task(mut status_rx: watch::Receiver<TimerStatus>) -> TimerStatus {
    info!("Starting timer status monitor");

    let mut last_state = status_rx.borrow_and_update().state;

    while status_rx.changed().await.is_ok() {
        let status = *status_rx.borrow_and_update();

        if status.state != last_state {
            match status.state {
                TimerState::Resumed => info!("Timer resumed at tick {}", status.ticks),
                TimerState::Suspended => info!("Timer suspended after {} ticks", status.ticks),
            }
            last_state = status.state;
        } else {
            debug!("Timer tick {}", status.ticks);
        }
    }

    let status = *status_rx.borrow();
    info!("Timer status monitor stopped after {} ticks", status.ticks);
    status
}
