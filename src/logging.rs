use crate::error::{Error, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber.
///
/// With a log file everything goes there. Without one, batch runs log to
/// stderr and interactive runs stay silent so the screen is not garbled.
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(log_file: Option<&Path>, level: &str, interactive: bool) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(level).map_err(|e| Error::Logging(e.to_string()))?;

    match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::Logging(format!("{} is not a file", path.display())))?;
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(file_name.to_string_lossy())
                .build(dir)
                .map_err(|e| Error::Logging(e.to_string()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init()
                .map_err(|e| Error::Logging(e.to_string()))?;
            Ok(Some(guard))
        }
        None if interactive => Ok(None),
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .compact()
                        .without_time()
                        .with_target(false),
                )
                .try_init()
                .map_err(|e| Error::Logging(e.to_string()))?;
            Ok(None)
        }
    }
}
