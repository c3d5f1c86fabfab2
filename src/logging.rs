//! Tracing subscriber setup: stdout for everything, optional ERROR-only log file.
//!
//! The log file rolls on a time schedule and is written from a background thread.

use crate::config::{Environment, LogRotation, LoggingSettings};
use crate::error::ConfigError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Map a `LOG_LEVEL` name to a filter directive. `WARNING` and `CRITICAL` are accepted.
pub fn level_directive(level: &str) -> Result<&'static str, ConfigError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok("trace"),
        "DEBUG" => Ok("debug"),
        "INFO" => Ok("info"),
        "WARN" | "WARNING" => Ok("warn"),
        "ERROR" | "CRITICAL" => Ok("error"),
        _ => Err(ConfigError::InvalidValue {
            var: "LOG_LEVEL",
            value: level.to_string(),
            supported: "DEBUG, INFO, WARNING, ERROR, CRITICAL",
        }),
    }
}

fn rotation(r: LogRotation) -> Rotation {
    match r {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

/// Rolling appender for `settings.file_path`: the directory holds the files and the file
/// name is their prefix.
fn file_appender(settings: &LoggingSettings) -> Result<RollingFileAppender, ConfigError> {
    let path = &settings.file_path;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
    let prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConfigError::Logging(format!("{}: not a file path", path.display())))?;
    let mut builder = RollingFileAppender::builder()
        .rotation(rotation(settings.file_rotation))
        .filename_prefix(prefix);
    if let Some(max) = settings.file_retention.max_files(settings.file_rotation) {
        builder = builder.max_log_files(max);
    }
    builder
        .build(dir)
        .map_err(|e| ConfigError::Logging(format!("{}: {}", path.display(), e)))
}

/// Install the global subscriber. `RUST_LOG` overrides `LOG_LEVEL` when set.
/// Development and test get compact output with source locations; production adds timestamps.
///
/// When the log file is enabled the returned guard flushes it on drop; hold it until exit.
pub fn init(settings: &LoggingSettings, environment: Environment) -> Result<Option<WorkerGuard>, ConfigError> {
    let directive = level_directive(&settings.level)?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let (compact, full) = match environment {
        Environment::Production => (None, Some(tracing_subscriber::fmt::layer())),
        Environment::Development | Environment::Test => (
            Some(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .without_time()
                    .with_file(true)
                    .with_line_number(true),
            ),
            None,
        ),
    };

    let (file, guard) = if settings.file_enabled {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(settings)?);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(LevelFilter::ERROR);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(compact)
        .with(full)
        .with(file)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::info!(
        level = directive,
        file_enabled = settings.file_enabled,
        file_rotation = ?settings.file_rotation,
        file_retention = ?settings.file_retention,
        environment = %environment,
        "logging configured"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names() {
        assert_eq!(level_directive("INFO").unwrap(), "info");
        assert_eq!(level_directive("warning").unwrap(), "warn");
        assert_eq!(level_directive("CRITICAL").unwrap(), "error");
        assert!(matches!(
            level_directive("LOUD"),
            Err(ConfigError::InvalidValue { var: "LOG_LEVEL", .. })
        ));
    }

    #[test]
    fn file_appender_creates_missing_directory() {
        let dir = std::env::temp_dir().join(format!("project-api-logs-{}", uuid::Uuid::new_v4().simple()));
        let settings = LoggingSettings {
            file_enabled: true,
            file_path: dir.join("nested").join("errors.log"),
            file_rotation: LogRotation::Never,
            ..LoggingSettings::default()
        };
        file_appender(&settings).unwrap();
        assert!(dir.join("nested").join("errors.log").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rotation_mapping() {
        assert_eq!(rotation(LogRotation::Daily), Rotation::DAILY);
        assert_eq!(rotation(LogRotation::Never), Rotation::NEVER);
    }
}
