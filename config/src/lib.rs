//! # Configuration for FluentSQL
//!
//! Connection settings and query-layer options, loaded from a TOML file or
//! built in code.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{AppConfig, DatabaseConfig, QueryConfig};
//!
//! let database = DatabaseConfig::new(
//!     "localhost".to_string(), 5432, "myapp".to_string(),
//!     "postgres".to_string(), "password".to_string(),
//!     1, 10, 30, 600, 3600,
//! )
//! .with_charset("UTF8");
//!
//! let config = AppConfig::new(database, QueryConfig::default().with_table_prefix("app_"));
//! assert!(config.validate().is_ok());
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [database]
//! host = "localhost"
//! port = 5432
//! database = "myapp"
//! username = "postgres"
//! password = "password"
//! charset = "UTF8"
//! min_connections = 1
//! max_connections = 10
//! connection_timeout_seconds = 30
//! idle_timeout_seconds = 600
//! max_lifetime_seconds = 3600
//!
//! [query]
//! table_prefix = "app_"
//! log_statements = false
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // FLUENTSQL_CONFIG, else ./fluentsql.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./fluentsql.toml";
const CONFIG_PATH_VAR: &str = "FLUENTSQL_CONFIG";

/// Everything except RFC 3986 unreserved characters is escaped in URL parts
const URL_PART: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Client encoding requested at connect time; empty keeps the server default
    #[serde(default)]
    pub charset: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

/// Options applied to every statement built through the facade
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Prepended to table names given to from / join / insert / update / delete
    #[serde(default)]
    pub table_prefix: String,
    /// Log every statement at INFO instead of DEBUG
    #[serde(default)]
    pub log_statements: bool,
}

impl AppConfig {
    pub fn new(database: DatabaseConfig, query: QueryConfig) -> Self {
        Self { database, query }
    }

    /// Load configuration from the TOML file named by `FLUENTSQL_CONFIG`
    /// (environment or `.env`), falling back to `./fluentsql.toml`
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(error) if error.not_found() => {}
            Err(error) => return Err(error.into()),
        }

        if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified as {} (environment or .env) or in {} file",
                CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let db = &self.database;

        if db.host.is_empty() {
            return Err(ConfigError::Invalid(
                "Database host cannot be empty".to_string(),
            ));
        }
        if db.port == 0 {
            return Err(ConfigError::Invalid(
                "Database port cannot be zero".to_string(),
            ));
        }
        if db.database.is_empty() {
            return Err(ConfigError::Invalid(
                "Database name cannot be empty".to_string(),
            ));
        }
        if db.username.is_empty() {
            return Err(ConfigError::Invalid(
                "Database username cannot be empty".to_string(),
            ));
        }
        if db.min_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database min_connections must be greater than 0".to_string(),
            ));
        }
        if db.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if db.min_connections > db.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".to_string(),
            ));
        }
        if db.connection_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connection_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if !db.charset.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ConfigError::Invalid(format!(
                "Database charset '{}' is not a valid encoding name",
                db.charset
            )));
        }

        let prefix = &self.query.table_prefix;
        if !prefix.is_empty()
            && !(prefix.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
                && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            return Err(ConfigError::Invalid(format!(
                "Table prefix '{}' may only contain letters, digits and underscores",
                prefix
            )));
        }

        Ok(())
    }
}

impl QueryConfig {
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Apply the configured prefix to a table name. Schema-qualified names
    /// get the prefix on the table part.
    pub fn prefixed(&self, table: &str) -> String {
        if self.table_prefix.is_empty() {
            return table.to_string();
        }
        match table.rsplit_once('.') {
            Some((schema, name)) => format!("{}.{}{}", schema, self.table_prefix, name),
            None => format!("{}{}", self.table_prefix, table),
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        min_connections: u32,
        max_connections: u32,
        connection_timeout_seconds: u64,
        idle_timeout_seconds: u64,
        max_lifetime_seconds: u64,
    ) -> Self {
        Self {
            host,
            port,
            database,
            username,
            password,
            charset: String::new(),
            min_connections,
            max_connections,
            connection_timeout_seconds,
            idle_timeout_seconds,
            max_lifetime_seconds,
        }
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Build a `postgresql://` URL. User, password, database and charset
    /// are percent-encoded; IPv6 hosts are bracketed.
    pub fn connection_string(&self) -> String {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let mut url = format!(
            "postgresql://{}:{}@{}:{}/{}",
            encode_part(&self.username),
            encode_part(&self.password),
            host,
            self.port,
            encode_part(&self.database)
        );
        if !self.charset.is_empty() {
            url.push_str("?options=-c%20client_encoding%3D");
            url.push_str(&encode_part(&self.charset));
        }
        url
    }
}

fn encode_part(part: &str) -> String {
    utf8_percent_encode(part, URL_PART).to_string()
}
