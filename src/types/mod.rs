//! Core data types for the Pomodoro timer.
//!
//! This module defines the data structures used for:
//! - Timer state management (mode, countdown, running flag)
//! - Per-day session records and the daily target
//! - IPC request/response serialization

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Length of a work period in seconds (25 minutes).
pub const WORK_DURATION_SECS: u32 = 25 * 60;

/// Length of a break period in seconds (5 minutes).
pub const BREAK_DURATION_SECS: u32 = 5 * 60;

/// Minutes credited to the daily record per completed work period.
pub const WORK_PERIOD_MINUTES: u32 = 25;

/// Daily target used when the user has not configured one.
pub const DEFAULT_DAILY_TARGET: u8 = 8;

/// Smallest accepted daily target.
pub const MIN_DAILY_TARGET: u8 = 1;

/// Largest accepted daily target.
pub const MAX_DAILY_TARGET: u8 = 20;

// ============================================================================
// ValidationError
// ============================================================================

/// Errors raised by local input validation, before any store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The daily target is not a number or lies outside 1-20.
    #[error("目標は1〜20の範囲で設定してください")]
    DailyTargetOutOfRange(String),

    /// The user identifier is empty.
    #[error("ユーザーIDが空です")]
    EmptyUserId,
}

// ============================================================================
// TimerMode
// ============================================================================

/// The two countdown phases of the timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Focused work period (25 minutes)
    #[default]
    Work,
    /// Rest period (5 minutes)
    Break,
}

impl TimerMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::Break => "break",
        }
    }

    /// Returns the display label ("作業" / "休憩").
    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Work => "作業",
            TimerMode::Break => "休憩",
        }
    }

    /// Returns the fixed countdown length of this mode in seconds.
    pub fn duration_seconds(&self) -> u32 {
        match self {
            TimerMode::Work => WORK_DURATION_SECS,
            TimerMode::Break => BREAK_DURATION_SECS,
        }
    }

    /// Returns the mode that follows this one when its countdown completes.
    pub fn next(&self) -> TimerMode {
        match self {
            TimerMode::Work => TimerMode::Break,
            TimerMode::Break => TimerMode::Work,
        }
    }
}


impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Countdown state owned by the timer engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    /// Current countdown mode
    pub mode: TimerMode,
    /// Remaining seconds in the current mode
    pub remaining_seconds: u32,
    /// Whether the countdown is advancing
    pub is_running: bool,
}

impl TimerState {
    /// Creates the initial state: Work, idle, full work duration.
    pub fn new() -> Self {
        Self::idle(TimerMode::Work)
    }

    /// Creates an idle state at the full duration of `mode`.
    pub fn idle(mode: TimerMode) -> Self {
        Self {
            mode,
            remaining_seconds: mode.duration_seconds(),
            is_running: false,
        }
    }

    /// Returns the full duration of the current mode in seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.mode.duration_seconds()
    }

    /// Returns how much of the current period has elapsed, in percent.
    pub fn progress_percent(&self) -> f64 {
        let duration = f64::from(self.duration_seconds());
        let remaining = f64::from(self.remaining_seconds.min(self.duration_seconds()));
        (duration - remaining) / duration * 100.0
    }

    /// Stops the countdown and restores the full duration of the current mode.
    pub fn reset(&mut self) {
        self.is_running = false;
        self.remaining_seconds = self.mode.duration_seconds();
    }

    /// Stops the countdown and moves to `mode` at its full duration.
    pub fn switch_mode(&mut self, mode: TimerMode) {
        *self = Self::idle(mode);
    }

    /// Decrements the countdown by one second.
    ///
    /// Returns true if this tick brought the countdown to zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        self.remaining_seconds == 0
    }

    /// Finishes the current period: flips the mode and leaves the timer idle.
    ///
    /// Returns the mode that was completed.
    pub fn complete_period(&mut self) -> TimerMode {
        let completed = self.mode;
        *self = Self::idle(completed.next());
        completed
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// UserId
// ============================================================================

/// Identity of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Creates a user id, rejecting blank input.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// DailySession
// ============================================================================

/// Per-user, per-calendar-date aggregate of completed work periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySession {
    /// Opaque record identifier
    pub id: String,
    /// Local calendar date (`YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Completed work periods on this date
    pub completed_count: u32,
    /// Accumulated work minutes on this date
    pub total_work_minutes: u32,
}

impl DailySession {
    /// Returns the counters after one more completed work period.
    pub fn next_counts(&self) -> (u32, u32) {
        (
            self.completed_count + 1,
            self.total_work_minutes + WORK_PERIOD_MINUTES,
        )
    }
}

// ============================================================================
// DailyTarget
// ============================================================================

/// The user's goal for completed work periods per day (1-20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DailyTarget(u8);

impl DailyTarget {
    /// Creates a target, rejecting values outside 1-20.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (MIN_DAILY_TARGET..=MAX_DAILY_TARGET).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::DailyTargetOutOfRange(value.to_string()))
        }
    }

    /// Parses user input such as `"8"`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| ValidationError::DailyTargetOutOfRange(input.to_string()))?;
        u8::try_from(value)
            .map_err(|_| ValidationError::DailyTargetOutOfRange(input.to_string()))
            .and_then(Self::new)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for DailyTarget {
    fn default() -> Self {
        Self(DEFAULT_DAILY_TARGET)
    }
}

impl TryFrom<u8> for DailyTarget {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DailyTarget> for u8 {
    fn from(value: DailyTarget) -> Self {
        value.0
    }
}

impl fmt::Display for DailyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Toast
// ============================================================================

/// Severity of an in-app message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Info,
    Error,
}

/// A transient in-app message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    pub body: String,
    pub level: ToastLevel,
}

impl Toast {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            level: ToastLevel::Info,
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            level: ToastLevel::Error,
        }
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Presentation view of the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    /// Current countdown mode
    pub mode: TimerMode,
    /// Remaining seconds in the current mode
    pub remaining_seconds: u32,
    /// Whether the countdown is advancing
    pub is_running: bool,
    /// Elapsed share of the current period (0-100)
    pub progress_percent: f64,
    /// Completed work periods today
    pub completed_pomodoros: u32,
    /// Whether a user is signed in
    pub signed_in: bool,
}

impl TimerSnapshot {
    /// Builds a snapshot from the engine state and today's counter.
    pub fn from_state(state: &TimerState, completed_pomodoros: u32, signed_in: bool) -> Self {
        Self {
            mode: state.mode,
            remaining_seconds: state.remaining_seconds,
            is_running: state.is_running,
            progress_percent: state.progress_percent(),
            completed_pomodoros,
            signed_in,
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Start (or keep) the countdown running
    Start,
    /// Pause the countdown
    Pause,
    /// Flip between running and paused
    Toggle,
    /// Restore the full duration of the current mode
    Reset,
    /// Force a mode, discarding progress
    Switch {
        /// Target mode
        mode: TimerMode,
    },
    /// Query the timer and recent messages
    Status,
    /// Query today's session record and daily target
    Today,
    /// Reload today's session record from the store
    Refetch,
    /// List past session records, newest first
    History {
        /// Maximum number of records
        limit: u32,
    },
    /// Read the daily target
    GetTarget,
    /// Store a new daily target
    SetTarget {
        /// Target value (validated again by the daemon)
        target: u8,
    },
    /// Switch the active user
    SignIn {
        /// User identifier
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Clear the active user
    SignOut,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    /// Timer view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSnapshot>,
    /// Today's session record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today_session: Option<DailySession>,
    /// Past session records, newest first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<DailySession>>,
    /// Daily target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_target: Option<u8>,
    /// Recent in-app messages, oldest first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notices: Option<Vec<Toast>>,
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
