//! Command definitions for the Pomodoro timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::store::DEFAULT_HISTORY_LIMIT;
use crate::types::{DailyTarget, TimerMode};

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro Sync CLI
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro",
    version,
    about = "日々の記録を同期するポモドーロタイマー",
    long_about = "25分の作業と5分の休憩を繰り返すポモドーロタイマー。\n\
                  完了したポモドーロは日ごとに記録され、1日の目標と比較できます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer daemon in the foreground
    Daemon,

    /// Start the countdown
    Start,

    /// Pause the countdown
    Pause,

    /// Start if paused, pause if running
    Toggle,

    /// Restore the full duration of the current mode
    Reset,

    /// Switch to work or break mode (discards progress)
    Switch {
        /// Mode to switch to
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Show current timer status
    Status,

    /// Show today's progress against the daily target
    Today,

    /// Reload today's record from the store
    Refetch,

    /// Show past daily records
    History {
        /// Number of days to show (1-365)
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_HISTORY_LIMIT,
            value_parser = clap::value_parser!(u32).range(1..=365)
        )]
        limit: u32,
    },

    /// Read or change the daily target
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },

    /// Sign in as a user
    SignIn {
        /// User identifier
        #[arg(value_parser = validate_user_id)]
        user_id: String,
    },

    /// Sign out
    SignOut,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// `target` subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum TargetAction {
    /// Show the daily target
    Get,

    /// Set the daily target (1-20)
    Set {
        /// Pomodoros per day
        #[arg(value_parser = parse_target)]
        value: DailyTarget,
    },

    /// Edit the daily target interactively
    Edit,
}

/// Timer mode as a command-line value
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// 25-minute work period
    Work,
    /// 5-minute break
    Break,
}

impl From<ModeArg> for TimerMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Work => TimerMode::Work,
            ModeArg::Break => TimerMode::Break,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a daily target with the same rules as the settings dialog.
fn parse_target(s: &str) -> Result<DailyTarget, String> {
    DailyTarget::parse(s).map_err(|e| e.to_string())
}

/// Validates the user id.
///
/// - Must not be blank
/// - Must not exceed 100 characters
fn validate_user_id(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("ユーザーIDは空にできません".to_string());
    }
    if trimmed.chars().count() > 100 {
        return Err("ユーザーIDは100文字以内にしてください".to_string());
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Cli Tests
    // ------------------------------------------------------------------------

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["pomodoro"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
            assert!(cli.socket.is_none());
        }

        #[test]
        fn test_parse_verbose_flag() {
            let cli = Cli::parse_from(["pomodoro", "-v", "status"]);
            assert!(cli.verbose);
        }

        #[test]
        fn test_parse_socket_after_subcommand() {
            let cli = Cli::parse_from(["pomodoro", "status", "--socket", "/tmp/p.sock"]);
            assert_eq!(cli.socket, Some(PathBuf::from("/tmp/p.sock")));
        }

        #[test]
        fn test_parse_timer_commands() {
            let parse = |arg: &str| Cli::parse_from(["pomodoro", arg]).command;

            assert!(matches!(parse("daemon"), Some(Commands::Daemon)));
            assert!(matches!(parse("start"), Some(Commands::Start)));
            assert!(matches!(parse("pause"), Some(Commands::Pause)));
            assert!(matches!(parse("toggle"), Some(Commands::Toggle)));
            assert!(matches!(parse("reset"), Some(Commands::Reset)));
            assert!(matches!(parse("status"), Some(Commands::Status)));
            assert!(matches!(parse("today"), Some(Commands::Today)));
            assert!(matches!(parse("refetch"), Some(Commands::Refetch)));
            assert!(matches!(parse("sign-out"), Some(Commands::SignOut)));
        }

        #[test]
        fn test_parse_switch() {
            let cli = Cli::parse_from(["pomodoro", "switch", "break"]);
            match cli.command {
                Some(Commands::Switch { mode }) => {
                    assert_eq!(TimerMode::from(mode), TimerMode::Break);
                }
                _ => panic!("Expected Switch command"),
            }

            assert!(Cli::try_parse_from(["pomodoro", "switch", "nap"]).is_err());
        }

        #[test]
        fn test_parse_history_limit() {
            let cli = Cli::parse_from(["pomodoro", "history"]);
            assert!(matches!(cli.command, Some(Commands::History { limit: 30 })));

            let cli = Cli::parse_from(["pomodoro", "history", "--limit", "7"]);
            assert!(matches!(cli.command, Some(Commands::History { limit: 7 })));

            assert!(Cli::try_parse_from(["pomodoro", "history", "--limit", "0"]).is_err());
        }

        #[test]
        fn test_parse_sign_in() {
            let cli = Cli::parse_from(["pomodoro", "sign-in", " alice "]);
            match cli.command {
                Some(Commands::SignIn { user_id }) => assert_eq!(user_id, "alice"),
                _ => panic!("Expected SignIn command"),
            }

            assert!(Cli::try_parse_from(["pomodoro", "sign-in", "  "]).is_err());
        }

        #[test]
        fn test_parse_completions_zsh() {
            let cli = Cli::parse_from(["pomodoro", "completions", "zsh"]);
            match cli.command {
                Some(Commands::Completions { shell }) => {
                    assert_eq!(shell, clap_complete::Shell::Zsh);
                }
                _ => panic!("Expected Completions command"),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Target Tests
    // ------------------------------------------------------------------------

    mod target_tests {
        use super::*;

        #[test]
        fn test_target_set_valid() {
            for value in ["1", "8", "20"] {
                let cli = Cli::parse_from(["pomodoro", "target", "set", value]);
                match cli.command {
                    Some(Commands::Target {
                        action: TargetAction::Set { value: target },
                    }) => assert_eq!(target.to_string(), value),
                    _ => panic!("Expected target set"),
                }
            }
        }

        #[test]
        fn test_target_set_rejected_locally() {
            for value in ["0", "21", "abc"] {
                let err = Cli::try_parse_from(["pomodoro", "target", "set", value]).unwrap_err();
                assert!(err.to_string().contains("目標は1〜20の範囲で設定してください"));
            }
        }

        #[test]
        fn test_target_get_and_edit() {
            let cli = Cli::parse_from(["pomodoro", "target", "get"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Target {
                    action: TargetAction::Get
                })
            ));

            let cli = Cli::parse_from(["pomodoro", "target", "edit"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Target {
                    action: TargetAction::Edit
                })
            ));
        }
    }

    // ------------------------------------------------------------------------
    // Validation Tests
    // ------------------------------------------------------------------------

    mod validation_tests {
        use super::*;

        #[test]
        fn test_validate_user_id_too_long() {
            let long = "a".repeat(101);
            assert!(validate_user_id(&long).is_err());
            assert!(validate_user_id(&"a".repeat(100)).is_ok());
        }
    }
}
