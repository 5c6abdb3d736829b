//! Tracing setup: stderr plus an append-only log file

use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbose`. The returned guard flushes the file sink
/// on drop and must live until the process exits. A log file that cannot be
/// opened is reported on stderr and the run carries on without it.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = match config.format {
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        LogFormat::Pretty => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    let appender = config.file.as_deref().map(|path| (path, file_appender(path)));
    let (file_layer, guard, file_error) = match appender {
        Some((_, Ok(appender))) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard), None)
        }
        Some((path, Err(e))) => (None, None, Some((path, e))),
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    if let Some((path, e)) = file_error {
        warn!(path = %path.display(), error = %e, "Log file unavailable, logging to stderr only");
    }

    Ok(guard)
}

/// Never-rotating appender on `path`, creating its directory if needed
fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let (dir, file_name) = split_log_path(path)?;
    std::fs::create_dir_all(&dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&dir)
        .map_err(|e| Error::Logging(format!("cannot open {}: {e}", path.display())))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Logging(format!("invalid log file path: {}", path.display())))?
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_name))
}
