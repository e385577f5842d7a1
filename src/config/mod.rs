//! Configuration layer: typed settings with layered precedence (file → env).

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const LOCAL_CONFIG_BASENAME: &str = "brezza";
const ENV_PREFIX: &str = "BREZZA";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_ENTITY_LIMIT: usize = 500;
const DEFAULT_CACHE_QUERY_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// Root settings for the persistence layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Postgres connection URL. Empty when running on the in-memory store.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub entity_limit: usize,
    pub query_limit: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            entity_limit: DEFAULT_CACHE_ENTITY_LIMIT,
            query_limit: DEFAULT_CACHE_QUERY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Settings {
    /// Load settings from `brezza.toml` (plus an optional explicit file) with
    /// `BREZZA__*` environment overrides layered on top.
    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder =
            Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid {
                message: "database.max_connections must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.database.url.is_empty());
        assert_eq!(settings.database.max_connections, 8);
        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.entity_limit, 500);
        assert_eq!(settings.cache.query_limit, 50);
        assert_eq!(settings.logging.level, LogLevel::Info);
        assert_eq!(settings.logging.format, LogFormat::Compact);
    }

    #[test]
    fn load_reads_file_and_keeps_defaults_elsewhere() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("brezza.toml");
        std::fs::write(
            &path,
            r#"
[database]
url = "postgres://localhost/brezza"

[cache]
entity_limit = 64

[logging]
level = "debug"
format = "json"
"#,
        )
        .expect("write config");

        let settings = Settings::load(Some(&path)).expect("load");
        assert_eq!(settings.database.url, "postgres://localhost/brezza");
        assert_eq!(settings.database.max_connections, 8);
        assert_eq!(settings.cache.entity_limit, 64);
        assert_eq!(settings.cache.query_limit, 50);
        assert_eq!(settings.logging.level, LogLevel::Debug);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn zero_connection_pool_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("brezza.toml");
        std::fs::write(&path, "[database]\nmax_connections = 0\n").expect("write config");

        let err = Settings::load(Some(&path)).expect_err("invalid settings");
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }

    #[test]
    fn cache_settings_convert_to_cache_config() {
        let settings = CacheSettings {
            enabled: false,
            entity_limit: 7,
            query_limit: 3,
        };
        let config = crate::cache::CacheConfig::from(&settings);
        assert!(!config.enabled);
        assert_eq!(config.entity_limit, 7);
        assert_eq!(config.query_limit, 3);
    }
}
