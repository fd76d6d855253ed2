//! Pomodoro Sync CLI
//!
//! This tool helps you stay focused using the Pomodoro Technique:
//! - 25 minutes of focused work
//! - 5 minutes of break
//! - Completed pomodoros recorded per day against a daily target

use anyhow::Result;
use clap::{CommandFactory, Parser};

use pomodoro_sync::cli::{edit_target, Cli, Commands, Display, IpcClient, TargetAction};
use pomodoro_sync::config::AppConfig;
use pomodoro_sync::daemon::run_from_config;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(&cli);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `warn`, or `info` with `--verbose`. Only the
/// daemon prints timestamps.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt().with_env_filter(filter).with_target(false);
    if matches!(cli.command, Some(Commands::Daemon)) {
        builder.init();
    } else {
        builder.without_time().init();
    }
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Daemon => {
            let mut config = AppConfig::load()?;
            if let Some(socket) = cli.socket {
                config.socket_path = Some(socket);
            }
            run_from_config(&config).await?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
        command => {
            let client = create_client(cli.socket)?;
            run_client_command(&client, command).await?;
        }
    }

    Ok(())
}

/// Resolves the socket from `--socket`, then the config file.
fn create_client(socket: Option<std::path::PathBuf>) -> Result<IpcClient> {
    let socket_path = match socket {
        Some(path) => path,
        None => AppConfig::load()?.socket_path()?,
    };
    Ok(IpcClient::with_socket_path(socket_path))
}

async fn run_client_command(client: &IpcClient, command: Commands) -> Result<()> {
    match command {
        Commands::Start => Display::show_control(&client.start().await?),
        Commands::Pause => Display::show_control(&client.pause().await?),
        Commands::Toggle => Display::show_control(&client.toggle().await?),
        Commands::Reset => Display::show_control(&client.reset().await?),
        Commands::Switch { mode } => Display::show_control(&client.switch(mode.into()).await?),
        Commands::Status => Display::show_status(&client.status().await?),
        Commands::Today => Display::show_today(&client.today().await?),
        Commands::Refetch => {
            client.refetch().await?;
            Display::show_today(&client.today().await?);
        }
        Commands::History { limit } => Display::show_history(&client.history(limit).await?),
        Commands::Target { action } => match action {
            TargetAction::Get => Display::show_target(&client.get_target().await?),
            TargetAction::Set { value } => Display::show_message(&client.set_target(value).await?),
            TargetAction::Edit => edit_target(client).await?,
        },
        Commands::SignIn { user_id } => Display::show_control(&client.sign_in(&user_id).await?),
        Commands::SignOut => Display::show_message(&client.sign_out().await?),
        Commands::Daemon | Commands::Completions { .. } => {}
    }
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
