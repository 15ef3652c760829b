//! Diagnostics for the `stash-dupes` binary.
//!
//! Command output (scene counts, duplicate listings) is printed to stdout and
//! never passes through here. Tracing events (the fetch target, HTTP
//! status warnings, per-strategy group counts) go to the journal under the
//! `stash-dupes` identifier, or to `stash-dupes.log` in [`default_log_dir`]
//! when journald cannot be reached.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "STASH_DUPES_LOG";
const DEFAULT_DIRECTIVE: &str = "info";
const APP_NAME: &str = "stash-dupes";

/// Build the event filter from a `STASH_DUPES_LOG` value. Unset or
/// unparsable values fall back to `info`.
fn filter_from(value: Option<&str>) -> EnvFilter {
    value
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Call once, before the first request.
pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    let env_filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());

    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(journald_layer.with_syslog_identifier(APP_NAME.to_string()))
                .init();
            return Ok(());
        }
    }

    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    std::fs::create_dir_all(&log_dir)?;

    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, log_file_name()));
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::debug!("stash-dupes {} logging to {:?}", env!("CARGO_PKG_VERSION"), log_dir);
    Ok(())
}

fn log_file_name() -> String {
    format!("{}.log", APP_NAME)
}

/// `~/.local/share/stash-dupes/logs` on Linux.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("logs")
}
