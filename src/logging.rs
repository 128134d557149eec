//! Sets up logging for the binaries.

use std::{fs::OpenOptions, io, path::Path, sync::Arc};

use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// The filter used for stdout when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log to stdout, filtered by `RUST_LOG` or [DEFAULT_LOG_FILTER], and append
/// debug level logs to the file at `log_path` when one is given.
///
/// # Errors
/// Returns an error if the log file cannot be opened.
///
/// # Panics
/// Panics if a global subscriber has already been set.
pub fn setup_logging(log_path: Option<&Path>) -> Result<(), io::Error> {
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let debug_log = match log_path {
        Some(log_path) => {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_writer(Arc::new(log_file))
                    .with_filter(filter::LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}
