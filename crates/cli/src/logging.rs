//! Logging setup: `RUST_LOG` filter, pretty or JSON output, stderr or a rolling file

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "offline_queue=info";
const LOG_FILE_PREFIX: &str = "offline-queue.log";

/// Install the global subscriber
///
/// Keep the returned guard alive for the life of the process when logging to
/// a file, dropping it flushes pending lines.
pub fn init_logging(format: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| anyhow!("Failed to create env filter: {e}"))?;

    // stdout stays reserved for command output (e.g. `list --json`)
    let (writer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let result = match format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(writer))
            .try_init(),
    };
    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}
