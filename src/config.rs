//! Application configuration.
//!
//! Settings are read from an optional TOML file, then overridden from the
//! environment, then validated. The file is located through
//! `FARMPOWER_CONFIG` and defaults to `farmpower.toml` in the working
//! directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::booking::{
    domain::{Tractor, TractorId, User, UserId, UserRole},
    services::BookingServiceConfig,
};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "FARMPOWER_CONFIG";
/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "farmpower.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AppConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// A setting is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Booking service tunables.
    pub bookings: BookingsConfig,
    /// Log output settings.
    pub log: LogConfig,
    /// Users and tractors known to the in-process directory.
    pub directory: DirectorySeed,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Returns `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `PostgreSQL` settings. Without a URL the in-memory repository is used.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: Option<String>,
    /// Pool size.
    pub max_connections: u32,
    /// Applies the bundled migrations at startup.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

/// Booking service tunables.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BookingsConfig {
    /// Timeout for each storage call, in milliseconds.
    pub repository_timeout_ms: u64,
    /// Listing page size when none is requested.
    pub default_page_size: usize,
    /// Largest listing page size.
    pub max_page_size: usize,
    /// Capacity of the notification queue.
    pub notification_queue_capacity: usize,
}

impl Default for BookingsConfig {
    fn default() -> Self {
        Self {
            repository_timeout_ms: 5_000,
            default_page_size: 10,
            max_page_size: 100,
            notification_queue_capacity: 256,
        }
    }
}

impl BookingsConfig {
    /// Returns the matching service tunables.
    #[must_use]
    pub const fn service_config(&self) -> BookingServiceConfig {
        BookingServiceConfig {
            repository_timeout: Duration::from_millis(self.repository_timeout_ms),
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Emits JSON instead of the compact text format.
    pub json: bool,
}

/// Directory records loaded into the in-process user directory.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DirectorySeed {
    /// Known users.
    pub users: Vec<UserSeed>,
    /// Known tractors.
    pub tractors: Vec<TractorSeed>,
}

/// One user record.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct UserSeed {
    /// User identifier.
    pub id: Uuid,
    /// User role.
    pub role: UserRole,
    /// Whether the account may act.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl From<UserSeed> for User {
    fn from(seed: UserSeed) -> Self {
        let user = Self::new(UserId::from_uuid(seed.id), seed.role);
        if seed.active { user } else { user.deactivated() }
    }
}

/// One tractor record.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct TractorSeed {
    /// Tractor identifier.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
}

impl From<TractorSeed> for Tractor {
    fn from(seed: TractorSeed) -> Self {
        Self {
            id: TractorId::from_uuid(seed.id),
            owner_id: UserId::from_uuid(seed.owner_id),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the file named by [`CONFIG_PATH_ENV`] and
    /// the process environment.
    ///
    /// A missing default file is not an error; a missing file named
    /// explicitly is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or
    /// when the resulting settings are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok();
        let path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));
        let mut config = match read_file(&path) {
            Ok(contents) => Self::from_toml_str(&contents)?,
            Err(ConfigError::Read { source, .. })
                if explicit.is_none() && source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(err) => return Err(err),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies environment overrides through `lookup`.
    ///
    /// Recognised variables are `DATABASE_URL`, `FARMPOWER_HOST`,
    /// `FARMPOWER_PORT` and `FARMPOWER_LOG_JSON`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a value cannot be parsed.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(host) = lookup("FARMPOWER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("FARMPOWER_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "FARMPOWER_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(json) = lookup("FARMPOWER_LOG_JSON") {
            self.log.json = parse_flag(&json).ok_or_else(|| ConfigError::InvalidEnv {
                name: "FARMPOWER_LOG_JSON",
                value: json.clone(),
            })?;
        }
        Ok(())
    }

    /// Normalizes and checks the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for out-of-range values.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            self.server.host = ServerConfig::default().host;
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be in 1..=65535".to_owned()));
        }
        if let Some(url) = &self.database.url {
            let lower = url.to_ascii_lowercase();
            if !(lower.starts_with("postgres://") || lower.starts_with("postgresql://")) {
                return Err(ConfigError::Invalid(
                    "database.url must start with postgres:// or postgresql://".to_owned(),
                ));
            }
            if self.database.max_connections == 0 {
                return Err(ConfigError::Invalid(
                    "database.max_connections must be at least 1".to_owned(),
                ));
            }
        }
        let bookings = &self.bookings;
        if bookings.repository_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "bookings.repository_timeout_ms must be positive".to_owned(),
            ));
        }
        if bookings.max_page_size == 0 || bookings.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "bookings page sizes must be at least 1".to_owned(),
            ));
        }
        if bookings.default_page_size > bookings.max_page_size {
            return Err(ConfigError::Invalid(
                "bookings.default_page_size must not exceed bookings.max_page_size".to_owned(),
            ));
        }
        if bookings.notification_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "bookings.notification_queue_capacity must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
