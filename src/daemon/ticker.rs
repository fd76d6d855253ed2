//! Periodic tick source for the timer engine.
//!
//! A [`Ticker`] owns at most one background task feeding one-second ticks
//! into a shared [`TimerEngine`]. Starting it again aborts the previous task
//! first, so a countdown can never be decremented twice per period.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use super::timer::TimerEngine;

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Single tick source for one engine.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Creates an idle ticker with a one-second period.
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    /// Creates an idle ticker with a custom period.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            handle: None,
        }
    }

    /// Spawns the tick task, cancelling any previous one.
    ///
    /// The task ends on its own once the engine stops running, either
    /// because it was paused or because a period completed.
    pub fn start(&mut self, engine: Arc<Mutex<TimerEngine>>) {
        self.cancel();

        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let mut engine = engine.lock().await;
                if !engine.get_state().is_running {
                    break;
                }
                if engine.tick().is_some() {
                    break;
                }
            }
            debug!("Tick source finished");
        }));
    }

    /// Stops the tick task immediately.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Tick source cancelled");
        }
    }

    /// Forgets a tick task that already ended on its own.
    ///
    /// A task started after the last completion is left running.
    pub fn clear_finished(&mut self) {
        if self.handle.as_ref().is_some_and(JoinHandle::is_finished) {
            self.handle = None;
        }
    }

    /// Returns true while a tick task is alive.
    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================
