//! Logging init: daily-rotated file under the XDG state dir plus stderr.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directory that holds the rotated log files (`~/.local/state/gsd/logs`).
pub fn log_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gsd")?;
    Ok(xdg_dirs.get_state_home().join("logs"))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,gsd_core=debug"))
}

/// Initialize logging: INFO and up to stderr, DEBUG and up to a daily-rotated
/// file under the XDG state dir. Returns the appender guard; hold it for the
/// lifetime of the process or buffered lines are lost on exit.
///
/// Fails only if the log directory cannot be created; callers should fall back
/// to [`init_logging_stderr`] rather than aborting.
pub fn init_logging() -> Result<WorkerGuard> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::daily(&dir, "gsd.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("logging to {}", dir.display());
    Ok(guard)
}

/// Stderr-only logging. Use when `init_logging` fails so the CLI still runs.
pub fn init_logging_stderr() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
