use serde::{Deserialize, Serialize};
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "HOUSEHOLD_DB_PATH";
pub const ENV_HTTP_ADDR: &str = "HOUSEHOLD_HTTP_ADDR";
pub const ENV_HORIZON_DAYS: &str = "HOUSEHOLD_HORIZON_DAYS";
pub const ENV_REFRESH_SECS: &str = "HOUSEHOLD_REFRESH_SECS";
pub const ENV_CONFIG_FILE: &str = "HOUSEHOLD_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime settings shared by the binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub database_path: PathBuf,
    pub http_addr: String,
    /// Days ahead generated by each refresh.
    pub horizon_days: u32,
    pub refresh_interval_secs: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./household.db"),
            http_addr: "0.0.0.0:3000".to_string(),
            horizon_days: 7,
            refresh_interval_secs: 24 * 60 * 60,
        }
    }
}

impl PlannerConfig {
    /// Keys missing from the file keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(file).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the file named by `HOUSEHOLD_CONFIG`, then individual
    /// environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match lookup(ENV_CONFIG_FILE) {
            Some(path) if !path.trim().is_empty() => Self::from_json_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env_with(lookup)
    }

    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup(ENV_HTTP_ADDR) {
            self.http_addr = addr;
        }
        if let Some(value) = lookup(ENV_HORIZON_DAYS) {
            self.horizon_days = parse_value(ENV_HORIZON_DAYS, &value)?;
        }
        if let Some(value) = lookup(ENV_REFRESH_SECS) {
            self.refresh_interval_secs = parse_value(ENV_REFRESH_SECS, &value)?;
        }
        Ok(self)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_value(ENV_HTTP_ADDR, &self.http_addr)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
