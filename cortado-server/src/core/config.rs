use std::net::SocketAddr;
use std::path::PathBuf;

use chrono_tz::Tz;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | CORTADO_HOST | 0.0.0.0 | Bind address |
/// | CORTADO_PORT | 3000 | HTTP port |
/// | CORTADO_DATA_DIR | ./data | redb database location |
/// | CORTADO_LOG_DIR | (unset) | Daily-rolling log files, console only when unset |
/// | CORTADO_LOG_LEVEL | info | Fallback level when RUST_LOG is unset |
/// | CORTADO_ENV | development | development \| staging \| production |
/// | CORTADO_TIMEZONE | UTC | Default timezone for new tenants |
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory holding the redb database file.
    pub data_dir: PathBuf,
    pub log_dir: Option<String>,
    pub log_level: String,
    pub environment: String,
    /// Default timezone assigned to tenants that do not specify one.
    pub timezone: Tz,
}

impl Config {
    /// Load configuration from environment variables, with defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("CORTADO_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("CORTADO_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            data_dir: std::env::var("CORTADO_DATA_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),
            log_dir: std::env::var("CORTADO_LOG_DIR").ok(),
            log_level: std::env::var("CORTADO_LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            environment: std::env::var("CORTADO_ENV").unwrap_or_else(|_| "development".into()),
            timezone: std::env::var("CORTADO_TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::UTC),
        }
    }

    /// Override the network and storage settings (used by tests).
    pub fn with_overrides(data_dir: impl Into<PathBuf>, port: u16) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.port = port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], self.port)))
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("cortado.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
