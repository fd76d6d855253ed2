//! CLI module for the Pomodoro timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: IPC client for daemon communication
//! - `display`: Output formatting and display logic
//! - `prompt`: Interactive daily target editor

pub mod client;
pub mod commands;
pub mod display;
pub mod prompt;

pub use client::IpcClient;
pub use commands::{Cli, Commands, ModeArg, TargetAction};
pub use display::Display;
pub use prompt::edit_target;
