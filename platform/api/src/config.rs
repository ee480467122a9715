use std::net::SocketAddr;

use anyhow::Result;
use common::config::LoggingConfig;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
/// The API issues and validates visitor passes
pub struct AppConfig {
    /// The path to the config file
    pub config_file: Option<String>,

    /// Name of this instance
    pub name: String,

    ///  The logging config
    pub logging: LoggingConfig,

    /// API Config
    pub api: ApiConfig,

    /// Database Config
    pub database: DatabaseConfig,

    /// JWT Config
    pub jwt: JwtConfig,

    /// Pass Config
    pub pass: PassConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address for the API
    pub bind_address: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 4000)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    /// Keeps everything in process memory, nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Which store to use
    pub backend: DatabaseBackend,

    /// The database URL to use
    pub uri: String,

    /// If we should run the migrations on startup
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Postgres,
            uri: "postgres://root@localhost:5432/visitor_pass".to_string(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// JWT secret
    pub secret: String,

    /// JWT issuer
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: "visitor-pass".to_string(),
            secret: "visitor-pass".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct PassConfig {
    /// The longest a pass may be valid for, in minutes
    pub max_duration_minutes: u32,

    /// The page size used when a list request has no limit
    pub default_page_size: u32,

    /// The largest page a list request may ask for
    pub max_page_size: u32,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            max_duration_minutes: 7 * 24 * 60,
            default_page_size: 100,
            max_page_size: 500,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: Some("config".to_string()),
            name: "visitor-pass-api".to_string(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            pass: PassConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn parse() -> Result<Self> {
        let (mut config, config_file) = common::config::parse::<Self>(!cfg!(test), "PASS", Self::default().config_file)?;

        config.config_file = config_file;

        Ok(config)
    }
}
