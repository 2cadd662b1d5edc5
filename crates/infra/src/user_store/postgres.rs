//! Postgres-backed user store.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Email already owned by another row |
//! | Database (not-null / check violation) | `23502`, `23514` | `Invalid` | Row rejected by a column constraint |
//! | Database (string too long) | `22001` | `Invalid` | Value exceeds a length-limited column on an older table |
//! | Database (other) | Any other | `Internal` | Other database errors |
//! | RowNotFound | N/A | `NotFound` | Point lookup matched nothing |
//! | PoolClosed / Io / other | N/A | `Internal` | Network errors, connection failures, etc. |
//!
//! Zero affected rows on `UPDATE`/`DELETE` is also reported as `NotFound`.
//!
//! ## Thread Safety
//!
//! `PostgresUserStore` is `Send + Sync`; the SQLx pool handles connection sharing.
//! Every operation is one statement, so there is no cross-request atomicity
//! beyond what a single statement gives.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool, Row};
use tracing::{info, instrument};

use userhub_core::{User, UserId};

use super::r#trait::{StoreError, StoreErrorKind, UserStore};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Postgres-backed user store.
///
/// Email uniqueness is enforced by the `UNIQUE` constraint on `users.email`.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    /// Create a new PostgresUserStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `users` table if it does not exist. Idempotent.
    ///
    /// Meant to run once at startup, not per request.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        info!("users table verified");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self, user), fields(email = %user.email), err)]
    async fn create_user(&self, user: &User) -> Result<UserId, StoreError> {
        let row = sqlx::query("INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id")
            .bind(&user.name)
            .bind(&user.email)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(user.email.clone())
                } else {
                    map_sqlx_error("create_user", e)
                }
            })?;

        row.try_get::<i64, _>("id")
            .map_err(|e| StoreError::internal("create_user", format!("failed to read id: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let row = sqlx::query("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user_by_id", e))?
            .ok_or(StoreError::NotFound(id))?;

        UserRow::from_row(&row)
            .map(Into::into)
            .map_err(|e| StoreError::internal("get_user_by_id", format!("failed to decode row: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn get_all_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT id, name, email FROM users ORDER BY id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_all_users", e))?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            let user = UserRow::from_row(&row).map_err(|e| {
                StoreError::internal("get_all_users", format!("failed to decode row: {e}"))
            })?;
            users.push(user.into());
        }
        Ok(users)
    }

    #[instrument(skip(self, user), fields(id = user.id), err)]
    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET name = $1, email = $2 WHERE id = $3")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.id)
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(user.email.clone())
                } else {
                    map_sqlx_error("update_user", e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(user.id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error: {}", db_err.message());
            match db_err.code().as_deref().map(sqlstate_kind) {
                Some(StoreErrorKind::Conflict) => StoreError::Conflict(msg),
                Some(StoreErrorKind::Invalid) => StoreError::Invalid(msg),
                _ => StoreError::internal(operation, msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::internal(operation, "connection pool closed"),
        _ => StoreError::internal(operation, err.to_string()),
    }
}

/// Classify a PostgreSQL SQLSTATE. Only client-caused codes leave `Internal`.
fn sqlstate_kind(code: &str) -> StoreErrorKind {
    match code {
        "23505" => StoreErrorKind::Conflict,
        "23502" | "23514" | "22001" => StoreErrorKind::Invalid,
        _ => StoreErrorKind::Internal,
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}
