use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use fittrack_cli::commands::Cli;
use fittrack_cli::config::Config;

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging; the guard flushes the log file on exit
    let _guard = init_logging(&cli)?;

    // Initialize tokio runtime
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { cli.execute().await })
}

/// Scripted commands log to stderr. The interactive client owns the terminal,
/// so it logs to <config dir>/logs/fittrack.log instead.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let default_level = if cli.is_verbose() { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if !cli.launches_app() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let log_dir = Config::config_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let appender = tracing_appender::rolling::never(log_dir, "fittrack.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}
