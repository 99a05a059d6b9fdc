use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `PR_REVIEW_DATABASE_URL` or
/// `PR_REVIEW_DATABASE__MAX_CONNECTIONS`.
pub const ENV_PREFIX: &str = "PR_REVIEW";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            busy_timeout_secs: 30,
            acquire_timeout_secs: 10,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config.toml` in the
    /// working directory and `PR_REVIEW_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`AppConfig::load`], but reads the given file instead of the
    /// optional `config.toml`. The file must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = DatabaseConfig::default();

        let mut builder = Config::builder()
            .set_default("environment", "development")?
            .set_default("database_url", "sqlite://pr_review.db")?
            .set_default("server_host", "0.0.0.0")?
            .set_default("server_port", 8080_i64)?
            .set_default("database.max_connections", defaults.max_connections as i64)?
            .set_default("database.busy_timeout_secs", defaults.busy_timeout_secs as i64)?
            .set_default(
                "database.acquire_timeout_secs",
                defaults.acquire_timeout_secs as i64,
            )?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
