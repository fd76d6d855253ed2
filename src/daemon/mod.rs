//! Daemon module for the Pomodoro timer.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Timer engine with state transitions and countdown logic
//! - `ticker`: The single one-second tick source feeding the engine
//! - `reconciler`: Keeps today's session record in step with the store
//! - `controller`: Composes engine, ticker and reconciler
//! - `ipc`: Unix socket server and request dispatch
//! - `runner`: The event loop tying everything together

pub mod controller;
pub mod ipc;
pub mod reconciler;
pub mod runner;
pub mod ticker;
pub mod timer;

pub use controller::TimerController;
pub use ipc::{IpcError, IpcServer, NoticeBoard, RequestHandler};
pub use reconciler::SessionReconciler;
pub use runner::{run_from_config, Daemon};
pub use ticker::{Ticker, TICK_PERIOD};
pub use timer::{TimerEngine, TimerEvent};
