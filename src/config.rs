//! Configuration system for the Aquafarm API.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `AQUAFARM_SERVER_HOST` - Server bind address
//! - `AQUAFARM_SERVER_PORT` - Server port
//! - `AQUAFARM_DATABASE_TYPE` - Database backend: `sqlite` or `postgres`
//! - `AQUAFARM_DATABASE_URL` - Database connection URL (routed by scheme)
//! - `AQUAFARM_DB_MAX_OPEN_CONNS` - Maximum pooled connections
//! - `AQUAFARM_DB_MAX_IDLE_CONNS` - Connections kept open while idle
//! - `AQUAFARM_DB_MAX_LIFETIME_SECS` - Connection lifetime (0 = unlimited)
//! - `AQUAFARM_LOGGING_ENABLED` - Enable logging
//! - `AQUAFARM_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::{Config, ConfigBuilder};
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Global configuration singleton.
static CONFIG: OnceLock<AquafarmConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AquafarmConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database type: "sqlite" or "postgres"
    pub db_type: String,
    /// SQLite connection URL
    pub sqlite_url: String,
    /// PostgreSQL connection URL
    pub postgres_url: String,
    /// Upper bound on pooled connections
    pub max_open_conns: u32,
    /// Connections the pool keeps open when idle
    pub max_idle_conns: u32,
    /// Maximum lifetime of a pooled connection in seconds; 0 disables the limit
    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            sqlite_url: "sqlite://aquafarm.db?mode=rwc".to_string(),
            postgres_url: "postgres://localhost/aquafarm".to_string(),
            max_open_conns: 10,
            max_idle_conns: 2,
            max_lifetime_secs: 3600,
        }
    }
}

impl DatabaseConfig {
    /// Connection URL for the configured backend.
    pub fn url(&self) -> &str {
        match self.db_type.as_str() {
            "postgres" => &self.postgres_url,
            _ => &self.sqlite_url,
        }
    }

    /// Connection lifetime, `None` when unlimited.
    pub fn max_lifetime(&self) -> Option<Duration> {
        (self.max_lifetime_secs > 0).then(|| Duration::from_secs(self.max_lifetime_secs))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

fn config_err(e: config::ConfigError) -> AppError {
    AppError::Config(e.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl AquafarmConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` file (optional)
    /// 3. Environment variables
    pub fn load() -> AppResult<Self> {
        let defaults = Self::default();
        let builder = Self::with_defaults(Config::builder(), &defaults)?
            .add_source(config::File::with_name("config").required(false));

        let database_url = env::var("AQUAFARM_DATABASE_URL").ok();

        let builder = builder
            .set_override_option("server.host", env::var("AQUAFARM_SERVER_HOST").ok())
            .map_err(config_err)?
            .set_override_option("server.port", env_parsed::<i64>("AQUAFARM_SERVER_PORT"))
            .map_err(config_err)?
            .set_override_option("database.db_type", env::var("AQUAFARM_DATABASE_TYPE").ok())
            .map_err(config_err)?
            .set_override_option(
                "database.sqlite_url",
                database_url
                    .clone()
                    .filter(|url| url.starts_with("sqlite")),
            )
            .map_err(config_err)?
            .set_override_option(
                "database.postgres_url",
                database_url.filter(|url| url.starts_with("postgres")),
            )
            .map_err(config_err)?
            .set_override_option(
                "database.max_open_conns",
                env_parsed::<i64>("AQUAFARM_DB_MAX_OPEN_CONNS"),
            )
            .map_err(config_err)?
            .set_override_option(
                "database.max_idle_conns",
                env_parsed::<i64>("AQUAFARM_DB_MAX_IDLE_CONNS"),
            )
            .map_err(config_err)?
            .set_override_option(
                "database.max_lifetime_secs",
                env_parsed::<i64>("AQUAFARM_DB_MAX_LIFETIME_SECS"),
            )
            .map_err(config_err)?
            .set_override_option(
                "logging.enabled",
                env_parsed::<bool>("AQUAFARM_LOGGING_ENABLED"),
            )
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("AQUAFARM_LOG_LEVEL").ok())
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| AppError::Config(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("failed to deserialize config: {e}")))
    }

    fn with_defaults(
        builder: ConfigBuilder<config::builder::DefaultState>,
        defaults: &Self,
    ) -> AppResult<ConfigBuilder<config::builder::DefaultState>> {
        builder
            .set_default("server.host", defaults.server.host.as_str())
            .map_err(config_err)?
            .set_default("server.port", i64::from(defaults.server.port))
            .map_err(config_err)?
            .set_default("database.db_type", defaults.database.db_type.as_str())
            .map_err(config_err)?
            .set_default("database.sqlite_url", defaults.database.sqlite_url.as_str())
            .map_err(config_err)?
            .set_default("database.postgres_url", defaults.database.postgres_url.as_str())
            .map_err(config_err)?
            .set_default(
                "database.max_open_conns",
                i64::from(defaults.database.max_open_conns),
            )
            .map_err(config_err)?
            .set_default(
                "database.max_idle_conns",
                i64::from(defaults.database.max_idle_conns),
            )
            .map_err(config_err)?
            .set_default(
                "database.max_lifetime_secs",
                defaults.database.max_lifetime_secs as i64,
            )
            .map_err(config_err)?
            .set_default("logging.enabled", defaults.logging.enabled)
            .map_err(config_err)?
            .set_default("logging.level", defaults.logging.level.as_str())
            .map_err(config_err)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        match self.database.db_type.as_str() {
            "sqlite" | "postgres" => {}
            other => {
                return Err(AppError::Config(format!(
                    "database.db_type must be 'sqlite' or 'postgres', got '{other}'"
                )));
            }
        }

        if self.database.max_open_conns == 0 {
            return Err(AppError::Config(
                "database.max_open_conns must be greater than 0".to_string(),
            ));
        }
        if self.database.max_idle_conns > self.database.max_open_conns {
            return Err(AppError::Config(
                "database.max_idle_conns cannot exceed database.max_open_conns".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(AppError::Config(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> AppResult<&'static AquafarmConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = AquafarmConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is equivalent.
    Ok(CONFIG.get_or_init(|| config))
}
