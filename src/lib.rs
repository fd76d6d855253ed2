//! Pomodoro Sync Library
//!
//! This library provides the core functionality for the Pomodoro timer
//! daemon and its CLI.
//! It includes:
//! - Timer engine, tick source and controller
//! - Session reconciler keeping per-day records in a store
//! - Session stores (memory, SQLite, hosted PostgREST)
//! - Completion notifications (toasts, desktop alerts, sound)
//! - Daily target settings and progress statistics
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities

pub mod cli;
pub mod config;
pub mod context;
pub mod daemon;
pub mod notification;
pub mod settings;
pub mod sound;
pub mod stats;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    DailySession, DailyTarget, IpcRequest, IpcResponse, ResponseData, TimerMode, TimerSnapshot,
    TimerState, Toast, ToastLevel, UserId, ValidationError,
};

pub use config::{AppConfig, ConfigError, StoreConfig};
pub use context::{Clock, CurrentUser, FixedClock, LocalClock};
pub use daemon::{Daemon, SessionReconciler, TimerController, TimerEngine, TimerEvent};
pub use store::{ConfiguredStore, MemoryStore, RestStore, SessionStore, SqliteStore, StoreError};

// Re-export notification types
pub use notification::{
    AlertChannel, MockAlertChannel, NoopAlertChannel, NotificationError, Notifier, Permission,
};

// Re-export sound types
pub use sound::{MockSoundPlayer, RodioSoundPlayer, SoundError, SoundPlayer, SoundSource};

// Re-export settings types
pub use settings::{DialogAction, DialogState, SettingsError, SettingsService};
