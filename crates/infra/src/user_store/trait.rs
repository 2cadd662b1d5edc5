use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use userhub_core::{User, UserId};

/// Machine-checkable classification of a [`StoreError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    NotFound,
    Conflict,
    Invalid,
    Internal,
}

/// User store operation error.
///
/// Callers branch on [`StoreError::kind`]; the message text is for logs only.
///
/// ## Error Categories
///
/// - **NotFound**: no record has the requested id
/// - **Conflict**: another record already owns the email
/// - **Invalid**: the store rejected the record itself (bad data)
/// - **Internal**: connectivity, decoding, or any other backend failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(UserId),

    #[error("email '{0}' is already in use")]
    Conflict(String),

    #[error("invalid user: {0}")]
    Invalid(String),

    #[error("storage failure in {operation}: {message}")]
    Internal { operation: String, message: String },
}

impl StoreError {
    pub fn internal(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::NotFound(_) => StoreErrorKind::NotFound,
            StoreError::Conflict(_) => StoreErrorKind::Conflict,
            StoreError::Invalid(_) => StoreErrorKind::Invalid,
            StoreError::Internal { .. } => StoreErrorKind::Internal,
        }
    }
}

/// Persistence capability for `User` records.
///
/// ## Semantics
///
/// - `create_user` assigns and returns a fresh non-zero id; the input id is ignored.
///   A duplicate email is `Conflict`.
/// - `get_user_by_id` is `NotFound` for unknown ids.
/// - `get_all_users` returns every record ordered by ascending id; an empty store
///   yields an empty vector.
/// - `update_user` replaces name/email of the record at `user.id`. Unknown id is
///   `NotFound`; an email owned by a *different* record is `Conflict`.
/// - `delete_user` removes the record; unknown id is `NotFound`.
///
/// Every returned `User` is an owned copy; mutating it never touches the store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<UserId, StoreError>;

    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError>;

    async fn get_all_users(&self) -> Result<Vec<User>, StoreError>;

    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn create_user(&self, user: &User) -> Result<UserId, StoreError> {
        (**self).create_user(user).await
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        (**self).get_user_by_id(id).await
    }

    async fn get_all_users(&self) -> Result<Vec<User>, StoreError> {
        (**self).get_all_users().await
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        (**self).update_user(user).await
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        (**self).delete_user(id).await
    }
}
