//! Infrastructure layer: user storage backends and database bootstrap.

pub mod config;
pub mod db;
pub mod user_store;

pub use config::ConfigError;
pub use db::{bootstrap, connect_with_retry, DbConfig, DbError, RetryPolicy};
pub use user_store::{
    InMemoryUserStore, PostgresUserStore, StoreError, StoreErrorKind, UserStore,
};
