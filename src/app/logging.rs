//! Usage: Process-wide tracing setup (env filter, stdout fmt layer, log bridge, panic hook).

use crate::shared::error::AppResult;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Flushes buffered log lines when dropped; keep it alive for the whole run.
#[must_use]
pub struct LoggingGuard {
    _writer: WorkerGuard,
}

pub(crate) fn init() -> AppResult<LoggingGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_target(true));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("LOGGING_INIT: tracing subscriber already set: {e}"))?;
    tracing_log::LogTracer::init()
        .map_err(|e| format!("LOGGING_INIT: log bridge init failed: {e}"))?;

    Ok(LoggingGuard { _writer: guard })
}

/// Panic payloads may echo token material, so only the location is logged.
pub(crate) fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(location = %location, "PANIC: calsync-auth panicked at {location}");
    }));
}
