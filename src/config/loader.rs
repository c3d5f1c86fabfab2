//! Load settings from `.env` and the process environment.

use crate::config::types::*;
use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

impl Settings {
    /// Read `.env` (if present), then build settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Missing keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Settings::default();

        let environment: Environment = match get("ENVIRONMENT") {
            Some(v) => v.parse()?,
            None => defaults.environment,
        };
        let debug = match get("DEBUG") {
            Some(v) => parse_bool("DEBUG", &v)?,
            None => defaults.debug,
        };
        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(v) => parse_list("ALLOWED_ORIGINS", &v)?,
            None => defaults.allowed_origins,
        };

        let server = ServerSettings {
            host: get("HOST").unwrap_or(defaults.server.host),
            port: match get("PORT") {
                Some(v) => parse_number("PORT", &v)?,
                None => defaults.server.port,
            },
        };

        let database = DatabaseSettings {
            provider: match get("POSTGRES_PROVIDER") {
                Some(v) => v.parse()?,
                None => defaults.database.provider,
            },
            url: get("DATABASE_URL").unwrap_or(defaults.database.url),
            echo: match get("DATABASE_ECHO") {
                Some(v) => parse_bool("DATABASE_ECHO", &v)?,
                None => defaults.database.echo,
            },
            max_connections: match get("DATABASE_POOL_SIZE") {
                Some(v) => parse_number("DATABASE_POOL_SIZE", &v)?,
                None => defaults.database.max_connections,
            },
            acquire_timeout: match get("DATABASE_POOL_TIMEOUT") {
                Some(v) => Duration::from_secs(parse_number("DATABASE_POOL_TIMEOUT", &v)?),
                None => defaults.database.acquire_timeout,
            },
            schema: get("DATABASE_SCHEMA"),
        };

        let logging = LoggingSettings {
            level: get("LOG_LEVEL").unwrap_or(defaults.logging.level),
            file_enabled: match get("LOG_FILE_ENABLED") {
                Some(v) => parse_bool("LOG_FILE_ENABLED", &v)?,
                None => defaults.logging.file_enabled,
            },
            file_path: get("LOG_FILE_PATH").map(PathBuf::from).unwrap_or(defaults.logging.file_path),
            file_rotation: match get("LOG_FILE_ROTATION") {
                Some(v) => v.parse()?,
                None => defaults.logging.file_rotation,
            },
            file_retention: match get("LOG_FILE_RETENTION") {
                Some(v) => v.parse()?,
                None => defaults.logging.file_retention,
            },
        };

        Ok(Settings {
            environment,
            debug,
            app_version: get("APP_VERSION").unwrap_or(defaults.app_version),
            allowed_origins,
            server,
            database,
            logging,
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            supported: "true, false, 1, 0, yes, no, on, off",
        }),
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        supported: "a non-negative integer",
    })
}

/// JSON array (`["a","b"]`) or comma-separated list.
fn parse_list(var: &'static str, value: &str) -> Result<Vec<String>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        let items: Vec<String> = serde_json::from_str(trimmed).map_err(|_| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            supported: "a JSON array of strings or a comma-separated list",
        })?;
        return Ok(items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect());
    }
    Ok(trimmed
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
