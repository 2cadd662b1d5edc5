use axum::http::StatusCode;
use axum::response::Response;

use crate::app::errors;

/// Liveness check; does not touch storage.
pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> Response {
    errors::method_not_allowed()
}
