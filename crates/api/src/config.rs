//! API process configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use userhub_infra::config::{self, ConfigError};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Which `UserStore` backs the API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local map; data is lost on exit. For local development.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub port: u16,
    /// Directory served for non-API `GET`/`HEAD` paths, if present.
    pub static_dir: Option<PathBuf>,
    pub request_timeout: Duration,
    pub storage: StorageBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            storage: StorageBackend::default(),
        }
    }
}

impl ApiConfig {
    /// Load from `APP_PORT`, `STATIC_DIR`, `REQUEST_TIMEOUT_SECS`, `USERHUB_STORAGE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(config::env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = config::parsed_or(&lookup, "APP_PORT", DEFAULT_PORT)?;
        let timeout_secs =
            config::parsed_or(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let storage = config::parsed_or(&lookup, "USERHUB_STORAGE", StorageBackend::default())?;

        let static_dir = lookup("STATIC_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string());
        let static_dir = Some(PathBuf::from(static_dir)).filter(|p| p.is_dir());

        Ok(Self {
            port,
            static_dir,
            request_timeout: Duration::from_secs(timeout_secs),
            storage,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
