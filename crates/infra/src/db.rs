//! Database bootstrap: connection settings, connect-with-retry, schema setup.
//!
//! Everything here runs once at process startup. Failures are fatal to the
//! caller; nothing in this module is on the request path.

use std::fmt;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{self, ConfigError};
use crate::user_store::{PostgresUserStore, StoreError};

/// Postgres connection parameters. All fields are required.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .finish()
    }
}

impl DbConfig {
    /// Load from `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(config::env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = config::required(&lookup, "DB_HOST")?;
        let port_raw = config::required(&lookup, "DB_PORT")?;
        let port = port_raw.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Invalid {
                name: "DB_PORT",
                value: port_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            host,
            port,
            user: config::required(&lookup, "DB_USER")?,
            password: config::required(&lookup, "DB_PASSWORD")?,
            dbname: config::required(&lookup, "DB_NAME")?,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
    }
}

/// Bounded attempts with a fixed delay between them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("could not connect to postgres after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("failed to ensure users schema: {0}")]
    Schema(#[from] StoreError),
}

/// Connect to Postgres, retrying with a fixed delay.
///
/// Each attempt opens a pool and pings it so a half-up server counts as a failure.
pub async fn connect_with_retry(cfg: &DbConfig, policy: RetryPolicy) -> Result<PgPool, DbError> {
    let attempts = policy.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match try_connect(cfg).await {
            Ok(pool) => {
                info!(host = %cfg.host, port = cfg.port, db = %cfg.dbname, attempt, "connected to postgres");
                return Ok(pool);
            }
            Err(e) => {
                warn!(attempt, max_attempts = attempts, error = %e, "postgres connection failed");
                last_error = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    Err(DbError::RetriesExhausted {
        attempts,
        last_error,
    })
}

async fn try_connect(cfg: &DbConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(cfg.connect_options())
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}

/// Connect and make sure the `users` table exists.
pub async fn bootstrap(cfg: &DbConfig, policy: RetryPolicy) -> Result<PostgresUserStore, DbError> {
    let pool = connect_with_retry(cfg, policy).await?;
    let store = PostgresUserStore::new(pool);
    store.ensure_schema().await?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_USER", "app"),
            ("DB_PASSWORD", "secret"),
            ("DB_NAME", "users"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<DbConfig, ConfigError> {
        DbConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn loads_all_fields() {
        let cfg = load(&full_env()).unwrap();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.dbname, "users");
    }

    #[test]
    fn every_field_is_required() {
        for key in ["DB_HOST", "DB_PORT", "DB_USER", "DB_PASSWORD", "DB_NAME"] {
            let mut env = full_env();
            env.remove(key);
            assert_eq!(load(&env), Err(ConfigError::Missing(key)), "{key}");
        }
    }

    #[test]
    fn non_numeric_port_is_invalid() {
        let mut env = full_env();
        env.insert("DB_PORT", "fivefour");
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid { name: "DB_PORT", .. })
        ));
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = load(&full_env()).unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[tokio::test]
    async fn retry_gives_up_after_bounded_attempts() {
        let cfg = DbConfig {
            host: "127.0.0.1".into(),
            // Reserved port; nothing listens here.
            port: 1,
            user: "nobody".into(),
            password: "nothing".into(),
            dbname: "none".into(),
        };
        let policy = RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(10),
        };

        let err = connect_with_retry(&cfg, policy).await.unwrap_err();
        assert!(matches!(err, DbError::RetriesExhausted { attempts: 2, .. }));
    }
}
