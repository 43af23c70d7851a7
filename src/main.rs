//! capturekit - element and debugger context capture for coding tasks
//!
//! Main entry point for the capturekit CLI.

mod adapters;
mod cli;
mod cmd_remote;
mod cmd_run;

use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use capturekit_config::{ConfigLoader, default_config_path};

use adapters::capturekit_dir;
use cli::{Cli, Commands};
use cmd_remote::Listing;

/// Initialize tracing with console and file output.
///
/// Logs go to ~/.capturekit/logs/ with daily rotation.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = capturekit_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("capturekit")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the whole program.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ConfigLoader::load_or_default(&config_path)?;
    info!("Configuration: {}", config_path.display());

    match cli.command {
        None => cmd_run::run_session(config, None).await,
        Some(Commands::Run { endpoint }) => cmd_run::run_session(config, endpoint).await,
        Some(Commands::SetApiKey { key }) => cmd_remote::set_api_key(&config, &key).await,
        Some(Commands::Sources) => cmd_remote::list(&config, Listing::Sources).await,
        Some(Commands::History) => cmd_remote::list(&config, Listing::History).await,
        Some(Commands::Config) => cmd_remote::show_config(&config, &config_path),
    }
}
