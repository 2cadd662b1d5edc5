//! User handlers.
//!
//! Each handler takes the store plus the already-extracted request parts and
//! returns a finished response, so they can be driven directly in tests.

use axum::{
    http::{Method, StatusCode},
    response::IntoResponse,
    Json,
};

use userhub_core::{parse_user_id, User};
use userhub_infra::UserStore;

use crate::app::errors;

fn decode_user(body: &[u8]) -> Result<User, axum::response::Response> {
    serde_json::from_slice::<User>(body).map_err(|e| {
        tracing::debug!(error = %e, "rejecting malformed user payload");
        errors::json_error(StatusCode::BAD_REQUEST, "invalid request body")
    })
}

fn required_id(id: Option<&str>) -> Result<i64, axum::response::Response> {
    let raw = id.ok_or_else(|| errors::json_error(StatusCode::BAD_REQUEST, "user id is required"))?;
    parse_user_id(raw).map_err(errors::domain_error_to_response)
}

pub async fn create_user(store: &dyn UserStore, method: &Method, body: &[u8]) -> axum::response::Response {
    if *method != Method::POST {
        return errors::method_not_allowed();
    }

    let user = match decode_user(body) {
        Ok(u) => u,
        Err(res) => return res,
    };
    if let Err(e) = user.validate() {
        return errors::domain_error_to_response(e);
    }

    match store.create_user(&user).await {
        Ok(id) => {
            let created = user.with_id(id);
            tracing::info!(user_id = id, "user created");
            (StatusCode::CREATED, Json(created)).into_response()
        }
        Err(e) => errors::store_error_to_response("create_user", e),
    }
}

/// Collection read without an id, point lookup with one.
pub async fn read_users(store: &dyn UserStore, method: &Method, id: Option<&str>) -> axum::response::Response {
    if *method != Method::GET {
        return errors::method_not_allowed();
    }

    let Some(raw) = id else {
        return match store.get_all_users().await {
            Ok(users) => (StatusCode::OK, Json(users)).into_response(),
            Err(e) => errors::store_error_to_response("get_all_users", e),
        };
    };

    let id = match parse_user_id(raw) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match store.get_user_by_id(id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::store_error_to_response("get_user_by_id", e),
    }
}

pub async fn update_user(
    store: &dyn UserStore,
    method: &Method,
    id: Option<&str>,
    body: &[u8],
) -> axum::response::Response {
    if *method != Method::PUT {
        return errors::method_not_allowed();
    }

    let id = match required_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    // The path id always wins over whatever the payload carries.
    let user = match decode_user(body) {
        Ok(u) => u.with_id(id),
        Err(res) => return res,
    };
    if let Err(e) = user.validate() {
        return errors::domain_error_to_response(e);
    }

    match store.update_user(&user).await {
        Ok(()) => {
            tracing::info!(user_id = id, "user updated");
            (StatusCode::OK, Json(user)).into_response()
        }
        Err(e) => errors::store_error_to_response("update_user", e),
    }
}

pub async fn delete_user(store: &dyn UserStore, method: &Method, id: Option<&str>) -> axum::response::Response {
    if *method != Method::DELETE {
        return errors::method_not_allowed();
    }

    let id = match required_id(id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match store.delete_user(id).await {
        Ok(()) => {
            tracing::info!(user_id = id, "user deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::store_error_to_response("delete_user", e),
    }
}
