//! Server configuration loading from file and environment variables.

use roster_db::{DatabaseUrl, DatabaseUrlError, RegistrySettings};
use roster_types::RunMode;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Application settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Application-wide settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Execution mode. Development generates the schema on every request
    /// and mounts Swagger UI.
    #[serde(default)]
    pub env: RunMode,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://db.sqlite3`.
    #[serde(default = "default_db_url")]
    pub url: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// How long a request may wait to establish its connection, in
    /// milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum connections held by one request's registry.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "roster_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_db_url() -> String {
    "sqlite://db.sqlite3".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    RegistrySettings::default().busy_timeout_ms
}

fn default_connect_timeout_ms() -> u64 {
    RegistrySettings::default().connect_timeout_ms
}

fn default_pool_max_size() -> u32 {
    RegistrySettings::default().pool_max_size
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            busy_timeout_ms: default_busy_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// Parses the configured connection string.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseUrlError` if the string is not a supported SQLite URL.
    pub fn parsed_url(&self) -> Result<DatabaseUrl, DatabaseUrlError> {
        self.url.parse()
    }

    /// Registry tunables derived from this configuration.
    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            busy_timeout_ms: self.busy_timeout_ms,
            connect_timeout_ms: self.connect_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `APP_ENV` overrides `app.env` (only `development` selects development)
/// - `PORT` overrides `server.port`
/// - `ROSTER_HOST` overrides `server.host`
/// - `DATABASE_URL` overrides `database.url`
/// - `ROSTER_DB_BUSY_TIMEOUT_MS` overrides `database.busy_timeout_ms`
/// - `ROSTER_DB_CONNECT_TIMEOUT_MS` overrides `database.connect_timeout_ms`
/// - `ROSTER_LOG_LEVEL` overrides `logging.level`
/// - `ROSTER_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

fn load_config_with_env(
    path: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(mode) = env("APP_ENV") {
        config.app.env = RunMode::from_env_label(&mode);
    }
    if let Some(port) = env("PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(host) = env("ROSTER_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(url) = env("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(ms) = env("ROSTER_DB_BUSY_TIMEOUT_MS") {
        if let Ok(parsed) = ms.parse() {
            config.database.busy_timeout_ms = parsed;
        }
    }
    if let Some(ms) = env("ROSTER_DB_CONNECT_TIMEOUT_MS") {
        if let Ok(parsed) = ms.parse() {
            config.database.connect_timeout_ms = parsed;
        }
    }
    if let Some(level) = env("ROSTER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("ROSTER_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = load_config_with_env(None, env_from(&[])).unwrap();
        assert_eq!(config.app.env, RunMode::Production);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.url, "sqlite://db.sqlite3");
        assert_eq!(config.database.registry_settings(), RegistrySettings::default());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config =
            load_config_with_env(Some(path.to_str().unwrap()), env_from(&[])).unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn file_values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [app]
            env = "development"

            [server]
            port = 9090

            [database]
            url = "sqlite:///tmp/roster.db"
            pool_max_size = 2
            "#,
        )
        .unwrap();

        let config =
            load_config_with_env(Some(path.to_str().unwrap()), env_from(&[])).unwrap();
        assert_eq!(config.app.env, RunMode::Development);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:///tmp/roster.db");
        assert_eq!(config.database.pool_max_size, 2);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

        let env = env_from(&[
            ("APP_ENV", "development"),
            ("PORT", "7000"),
            ("DATABASE_URL", "sqlite://:memory:"),
            ("ROSTER_DB_CONNECT_TIMEOUT_MS", "250"),
            ("ROSTER_LOG_JSON", "1"),
        ]);
        let config = load_config_with_env(Some(path.to_str().unwrap()), env).unwrap();

        assert!(config.app.env.is_development());
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.database.parsed_url(), Ok(DatabaseUrl::Memory));
        assert_eq!(config.database.connect_timeout_ms, 250);
        assert!(config.logging.json);
    }

    #[test]
    fn unparseable_env_values_are_ignored() {
        let env = env_from(&[("PORT", "eighty"), ("APP_ENV", "staging")]);
        let config = load_config_with_env(None, env).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.app.env, RunMode::Production);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = load_config_with_env(Some(path.to_str().unwrap()), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
