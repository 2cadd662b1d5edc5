//! The `User` resource.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

/// Storage-assigned identifier. `0` means "not yet persisted".
pub type UserId = i64;

/// A user record as exposed over HTTP and persisted by the stores.
///
/// The JSON shape is exactly `{"id": .., "name": .., "email": ..}`. A missing
/// `id` decodes as `0`; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl User {
    /// Build an unsaved user.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Copy of this record carrying `id` instead of its own.
    pub fn with_id(&self, id: UserId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    /// Presence checks on the two required fields.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if self.email.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        Ok(())
    }
}

impl Entity for User {
    fn is_saved(&self) -> bool {
        self.id != 0
    }
}

/// Parse a path segment as a user id (base-10, signed 64-bit).
pub fn parse_user_id(raw: &str) -> DomainResult<UserId> {
    raw.parse::<UserId>()
        .map_err(|e| DomainError::invalid_id(format!("'{raw}': {e}")))
}
