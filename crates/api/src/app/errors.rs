use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::BoxError;
use serde_json::json;

use userhub_core::DomainError;
use userhub_infra::{StoreError, StoreErrorKind};

/// Render `{"error": message}` with `status`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}

pub fn method_not_allowed() -> axum::response::Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

/// Turn failures from fallible tower layers (the request timeout) into JSON errors.
pub async fn handle_middleware_error(err: BoxError) -> axum::response::Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        return json_error(StatusCode::REQUEST_TIMEOUT, "request timed out");
    }
    tracing::error!(error = %err, "unhandled middleware error");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

/// Map a classified storage failure to a response.
///
/// Internal failures are logged with the operation name; their details never
/// reach the client.
pub fn store_error_to_response(operation: &'static str, err: StoreError) -> axum::response::Response {
    match err.kind() {
        StoreErrorKind::NotFound => json_error(StatusCode::NOT_FOUND, err.to_string()),
        StoreErrorKind::Conflict => json_error(StatusCode::CONFLICT, err.to_string()),
        StoreErrorKind::Invalid => json_error(StatusCode::BAD_REQUEST, err.to_string()),
        StoreErrorKind::Internal => {
            tracing::error!(operation, error = %err, "storage operation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

/// Domain failures are always the client's input, hence 400.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match err {
        DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
    };
    json_error(status, err.to_string())
}
