//! `userhub-core`: the `User` resource and its domain error model.
//!
//! This crate is transport- and storage-agnostic.

pub mod entity;
pub mod error;
pub mod user;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use user::{parse_user_id, User, UserId};
