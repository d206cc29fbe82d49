//! Tracing subscriber setup.
//!
//! Logs go to stderr with local-time timestamps. `RUST_LOG` takes precedence
//! over the configured level. When a log file is configured, a second
//! non-blocking layer writes plain (uncoloured) lines to it; the returned
//! [`LoggingGuard`] must be held until exit or buffered lines are lost.
//!
//! A log file that cannot be created is not fatal: the subscriber is
//! installed with the stderr layer only and a warning names the file.

use std::path::Path;

use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing::warn;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;

/// Keeps the file writer alive.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// Returns `None` if a subscriber was already installed (tests, embedding).
pub fn init_logging(settings: &LoggingSettings) -> Option<LoggingGuard> {
    let filter = build_filter(&settings.level);
    let timer = local_timer();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_target(false);

    let mut file_failure = None;
    let (file_layer, file_guard) = match settings.file.as_deref().map(|p| (p, file_writer(p))) {
        Some((_, Ok((writer, guard)))) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(timer)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        Some((path, Err(e))) => {
            file_failure = Some((path, e));
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .ok()?;

    if let Some((path, e)) = file_failure {
        warn!(path = %path.display(), error = %e, "Cannot open log file, logging to stderr only");
    }

    Some(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// `RUST_LOG` if set and valid, otherwise `level`, otherwise `info`.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn local_timer() -> OffsetTime<Rfc3339> {
    // Local offset lookup fails on some multi-threaded Unix setups.
    OffsetTime::local_rfc_3339().unwrap_or_else(|_| OffsetTime::new(UtcOffset::UTC, Rfc3339))
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), InitError> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "simdetect.log".to_string());

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)?;
    Ok(tracing_appender::non_blocking(appender))
}
