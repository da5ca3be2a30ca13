//! Console and per-run file logging.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub dir: PathBuf,
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// `-v` count.
    pub verbose: u8,
    pub quiet: bool,
    pub file: Option<LogFile>,
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file in {dir}: {source}")]
    File { dir: String, source: InitError },
    #[error(transparent)]
    Install(#[from] TryInitError),
}

/// Console level for the given flags. `-q` wins over `-v`.
pub fn console_level(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// `<prefix>-<YYYY-MM-DD-HHMMSS>`, the log file name without extension.
pub fn log_file_stem(prefix: &str, now: DateTime<Local>) -> String {
    format!("{prefix}-{}", now.format("%Y-%m-%d-%H%M%S"))
}

/// Install the global subscriber. Keep the guard alive until exit so the
/// file writer flushes.
pub fn init(options: &LogOptions) -> Result<Option<WorkerGuard>, LoggingError> {
    let level = console_level(options.verbose, options.quiet);
    let console_filter = if options.verbose > 0 || options.quiet {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let (file, guard) = match &options.file {
        Some(target) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(log_file_stem(&target.prefix, Local::now()))
                .filename_suffix("log")
                .build(&target.dir)
                .map_err(|source| LoggingError::File {
                    dir: target.dir.display().to_string(),
                    source,
                })?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_level = if options.verbose > 0 { level } else { "info" };
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new(file_level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn quiet_beats_verbose() {
        assert_eq!(console_level(0, false), "info");
        assert_eq!(console_level(1, false), "debug");
        assert_eq!(console_level(3, false), "trace");
        assert_eq!(console_level(2, true), "warn");
    }

    #[test]
    fn file_stem_carries_the_run_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).single().expect("time");
        assert_eq!(
            log_file_stem("Firewall_API_Output", now),
            "Firewall_API_Output-2024-03-01-090507"
        );
    }
}
