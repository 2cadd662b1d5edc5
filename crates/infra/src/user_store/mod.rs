//! User storage boundary.
//!
//! `UserStore` is the capability set the HTTP layer depends on. Two backends
//! implement it: Postgres for deployments and an in-memory map for tests and
//! local development.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;
pub use r#trait::{StoreError, StoreErrorKind, UserStore};
