//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ACCOUNT_SERVICE_CONFIG`
//! environment variable. A missing file is not an error; every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ACCOUNT_SERVICE_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ACCOUNT_SERVICE_DATABASE__POOL__MAX_CONNECTIONS=20` sets `database.pool.max_connections`.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 3002
//! request_timeout: 30s
//! database:
//!   url: sqlite://accounts.db
//!   pool:
//!     max_connections: 10
//! hash:
//!   memory_kib: 19456
//!   iterations: 2
//!   parallelism: 1
//! initial_admin:
//!   username: admin
//!   password: change-me
//! ```

use std::time::Duration;

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::auth::password::{Argon2Params, MAX_PASSWORD_BYTES};
use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ACCOUNT_SERVICE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Raw `DATABASE_URL` override, folded into `database.url` on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    /// Password hashing cost
    pub hash: Argon2Params,
    /// Upper bound on the time spent serving a single request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Account created on startup if its username is free
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_admin: Option<InitialAdminConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string, e.g. `sqlite://accounts.db` or `sqlite::memory:`
    pub url: String,
    pub pool: PoolSettings,
}

/// Connection pool sizing and timeouts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Zero disables idle reaping
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InitialAdminConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            database_url: None,
            database: DatabaseConfig::default(),
            hash: Argon2Params::default(),
            request_timeout: Duration::from_secs(30),
            initial_admin: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://accounts.db".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.database.url.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: database.url must not be empty".to_string(),
            });
        }

        if self.database.pool.max_connections == 0 || self.database.pool.min_connections > self.database.pool.max_connections {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: invalid pool sizing: min_connections ({}) / max_connections ({})",
                    self.database.pool.min_connections, self.database.pool.max_connections
                ),
            });
        }

        self.hash.validate().map_err(|e| Error::Internal {
            operation: format!("Config validation: invalid hash parameters: {e}"),
        })?;

        if self.request_timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: request_timeout must be greater than zero".to_string(),
            });
        }

        if let Some(admin) = &self.initial_admin {
            if admin.username.trim().is_empty() {
                return Err(Error::Internal {
                    operation: "Config validation: initial_admin.username must not be empty".to_string(),
                });
            }
            if admin.password.is_empty() || admin.password.len() > MAX_PASSWORD_BYTES {
                return Err(Error::Internal {
                    operation: format!("Config validation: initial_admin.password must be 1 to {MAX_PASSWORD_BYTES} bytes"),
                });
            }
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            // ACCOUNT_SERVICE_CONFIG names the file itself and is not a config key
            .merge(Env::prefixed("ACCOUNT_SERVICE_").ignore(&["CONFIG"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
