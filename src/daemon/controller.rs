//! Timer controller.
//!
//! Composes the engine, its single tick source and the session reconciler
//! behind one object that the IPC handler drives. The daemon's event loop
//! reports completed periods back through [`TimerController::on_period_completed`].

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info};

use crate::store::SessionStore;
use crate::types::{DailySession, TimerMode, TimerSnapshot, TimerState};

use super::reconciler::SessionReconciler;
use super::ticker::Ticker;
use super::timer::{TimerEngine, TimerEvent};

/// Drives one timer engine and reconciles its completions.
pub struct TimerController<S: SessionStore> {
    engine: Arc<Mutex<TimerEngine>>,
    ticker: Ticker,
    reconciler: SessionReconciler<S>,
    /// Local count of completed work periods, overridden by the store
    completed_pomodoros: u32,
    /// Date `completed_pomodoros` counts for
    counted_on: NaiveDate,
    today_rx: watch::Receiver<Option<DailySession>>,
}

impl<S: SessionStore> TimerController<S> {
    /// Creates a controller with a fresh engine publishing on `event_tx`.
    pub fn new(
        event_tx: mpsc::UnboundedSender<TimerEvent>,
        reconciler: SessionReconciler<S>,
    ) -> Self {
        Self::with_ticker(event_tx, reconciler, Ticker::new())
    }

    /// Creates a controller with a custom tick source.
    pub fn with_ticker(
        event_tx: mpsc::UnboundedSender<TimerEvent>,
        reconciler: SessionReconciler<S>,
        ticker: Ticker,
    ) -> Self {
        let today_rx = reconciler.subscribe();
        let counted_on = reconciler.today();
        Self {
            engine: Arc::new(Mutex::new(TimerEngine::new(event_tx))),
            ticker,
            reconciler,
            completed_pomodoros: 0,
            counted_on,
            today_rx,
        }
    }

    /// Shared handle to the engine.
    pub fn engine(&self) -> Arc<Mutex<TimerEngine>> {
        Arc::clone(&self.engine)
    }

    pub fn reconciler(&self) -> &SessionReconciler<S> {
        &self.reconciler
    }

    /// Starts the countdown. Returns false if it was already running.
    pub async fn start(&mut self) -> bool {
        let started = self.engine.lock().await.start();
        if started {
            self.ticker.start(self.engine());
        }
        started
    }

    /// Pauses the countdown. Returns false if it was already paused.
    pub async fn pause(&mut self) -> bool {
        self.ticker.cancel();
        self.engine.lock().await.pause()
    }

    /// Flips between running and paused. Returns the new running flag.
    pub async fn toggle(&mut self) -> bool {
        let running = self.engine.lock().await.toggle();
        if running {
            self.ticker.start(self.engine());
        } else {
            self.ticker.cancel();
        }
        running
    }

    /// Stops and restores the full duration of the current mode.
    pub async fn reset(&mut self) {
        self.ticker.cancel();
        self.engine.lock().await.reset();
    }

    /// Stops and forces `mode`, discarding progress.
    pub async fn switch_mode(&mut self, mode: TimerMode) {
        self.ticker.cancel();
        self.engine.lock().await.switch_mode(mode);
    }

    /// Applies the side effects of a finished period.
    ///
    /// Work periods bump the local counter and dispatch a store write
    /// without waiting for it. A countdown restarted before this runs keeps
    /// its tick source.
    pub fn on_period_completed(&mut self, mode: TimerMode) {
        self.ticker.clear_finished();
        if mode != TimerMode::Work {
            debug!("Break completed, nothing to record");
            return;
        }

        self.sync_published();
        self.completed_pomodoros += 1;
        info!("Pomodoro completed: {} today", self.completed_pomodoros);
        self.reconciler.dispatch_completion();
    }

    /// Resets the local counter after a change of user.
    pub fn clear_completed(&mut self) {
        self.completed_pomodoros = 0;
        self.counted_on = self.reconciler.today();
        self.today_rx.mark_unchanged();
    }

    /// Completed work periods today.
    ///
    /// Once the store publishes a record its count replaces the local one;
    /// whichever happened last wins. The count starts over when the local
    /// date changes.
    pub fn completed_pomodoros(&mut self) -> u32 {
        self.sync_published();
        self.completed_pomodoros
    }

    /// Copy of the engine state.
    pub async fn state(&self) -> TimerState {
        self.engine.lock().await.get_state().clone()
    }

    /// Presentation view of the timer.
    pub async fn snapshot(&mut self) -> TimerSnapshot {
        let completed = self.completed_pomodoros();
        let signed_in = self.reconciler.current_user().is_signed_in();
        let engine = self.engine.lock().await;
        TimerSnapshot::from_state(engine.get_state(), completed, signed_in)
    }

    /// Returns true while a tick task is alive.
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_active()
    }

    fn sync_published(&mut self) {
        let today = self.reconciler.today();
        if today != self.counted_on {
            debug!("Date changed to {}, daily count starts over", today);
            self.counted_on = today;
            self.completed_pomodoros = 0;
        }

        if !self.today_rx.has_changed().unwrap_or(false) {
            return;
        }
        if let Some(session) = self.today_rx.borrow_and_update().as_ref() {
            if session.date == today {
                self.completed_pomodoros = session.completed_count;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
