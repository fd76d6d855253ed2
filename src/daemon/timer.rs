//! Timer engine for the Pomodoro timer.
//!
//! This module provides the countdown state machine:
//! - Work/Break modes crossed with idle/running
//! - One-second ticks driven by [`super::ticker::Ticker`]
//! - Event firing for completions and state changes
//!
//! The engine never schedules anything itself. Whoever owns it must make
//! sure at most one tick source is feeding [`TimerEngine::tick`].

use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{TimerMode, TimerState};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for notifications, persistence and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started or resumed
    Started {
        /// Mode being counted down
        mode: TimerMode,
        /// Remaining seconds at start
        remaining_seconds: u32,
    },
    /// Countdown paused
    Paused {
        /// Remaining seconds at pause
        remaining_seconds: u32,
    },
    /// Countdown restored to the full duration of the current mode
    Reset {
        /// Current mode
        mode: TimerMode,
    },
    /// Mode forced by the user
    ModeSwitched {
        /// New mode
        mode: TimerMode,
    },
    /// One second elapsed
    Tick {
        /// Remaining seconds after the tick
        remaining_seconds: u32,
    },
    /// A countdown reached zero
    PeriodCompleted {
        /// The mode that just finished
        mode: TimerMode,
    },
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Countdown state machine for one timer.
pub struct TimerEngine {
    /// Current timer state
    state: TimerState,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an engine in Work/Idle with the full work duration.
    pub fn new(event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            state: TimerState::new(),
            event_tx,
        }
    }

    /// Starts the countdown.
    ///
    /// Returns false when nothing changed (already running).
    pub fn start(&mut self) -> bool {
        if self.state.is_running || self.state.remaining_seconds == 0 {
            return false;
        }

        self.state.is_running = true;
        debug!(
            "Timer started: mode={}, remaining={}s",
            self.state.mode, self.state.remaining_seconds
        );
        self.emit(TimerEvent::Started {
            mode: self.state.mode,
            remaining_seconds: self.state.remaining_seconds,
        });
        true
    }

    /// Pauses the countdown.
    ///
    /// Returns false when nothing changed (already paused).
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }

        self.state.is_running = false;
        debug!("Timer paused: remaining={}s", self.state.remaining_seconds);
        self.emit(TimerEvent::Paused {
            remaining_seconds: self.state.remaining_seconds,
        });
        true
    }

    /// Flips between running and paused. Returns the new running flag.
    pub fn toggle(&mut self) -> bool {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
        self.state.is_running
    }

    /// Stops the countdown and restores the full duration of the current mode.
    pub fn reset(&mut self) {
        self.state.reset();
        debug!("Timer reset: mode={}", self.state.mode);
        self.emit(TimerEvent::Reset {
            mode: self.state.mode,
        });
    }

    /// Stops the countdown and forces `mode`, discarding progress.
    pub fn switch_mode(&mut self, mode: TimerMode) {
        self.state.switch_mode(mode);
        debug!("Timer switched to {}", mode);
        self.emit(TimerEvent::ModeSwitched { mode });
    }

    /// Advances the countdown by one second.
    ///
    /// Ignored while paused. When the countdown reaches zero the engine stops,
    /// emits `PeriodCompleted`, flips the mode and resets the counter, leaving
    /// the timer idle. Returns the completed mode in that case.
    pub fn tick(&mut self) -> Option<TimerMode> {
        if !self.state.is_running {
            return None;
        }

        let reached_zero = self.state.tick();
        self.emit(TimerEvent::Tick {
            remaining_seconds: self.state.remaining_seconds,
        });

        if !reached_zero {
            return None;
        }

        let completed = self.state.complete_period();
        debug!("Period completed: {} -> {}", completed, self.state.mode);
        self.emit(TimerEvent::PeriodCompleted { mode: completed });
        Some(completed)
    }

    /// Returns a reference to the current timer state.
    pub fn get_state(&self) -> &TimerState {
        &self.state
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(test)]
    pub fn get_state_mut(&mut self) -> &mut TimerState {
        &mut self.state
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Timer event dropped: receiver closed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
