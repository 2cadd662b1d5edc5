use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{Method, StatusCode},
    response::Response,
};
use tower::ServiceExt;

use crate::app::{errors, AppState};

pub mod dispatch;
pub mod system;
pub mod users;

use dispatch::{dispatch, Route};

/// Upper bound on accepted request bodies.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Single entrypoint for everything except `/health`.
///
/// User routes are resolved by [`dispatch`]; anything outside the user prefix
/// falls through to the static file tree when one is configured.
pub async fn handle_request(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().clone();
    let route = dispatch(&method, req.uri().path());
    let store = state.store.as_ref();

    match route {
        Route::ListUsers => users::read_users(store, &method, None).await,
        Route::GetUser(id) => users::read_users(store, &method, Some(&id)).await,
        Route::CreateUser => match read_body(req).await {
            Ok(body) => users::create_user(store, &method, &body).await,
            Err(res) => res,
        },
        Route::UpdateUser(id) => match read_body(req).await {
            Ok(body) => users::update_user(store, &method, Some(&id), &body).await,
            Err(res) => res,
        },
        Route::DeleteUser(id) => users::delete_user(store, &method, Some(&id)).await,
        Route::MethodNotAllowed => errors::method_not_allowed(),
        Route::BadRequest(msg) => errors::json_error(StatusCode::BAD_REQUEST, msg),
        Route::NotFound => serve_static(&state, req).await,
    }
}

async fn read_body(req: Request) -> Result<Bytes, Response> {
    axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "failed to read request body");
            errors::json_error(StatusCode::BAD_REQUEST, "unreadable request body")
        })
}

async fn serve_static(state: &AppState, req: Request) -> Response {
    let Some(files) = state.static_files.clone() else {
        return errors::json_error(StatusCode::NOT_FOUND, "not found");
    };
    if !matches!(*req.method(), Method::GET | Method::HEAD) {
        return errors::json_error(StatusCode::NOT_FOUND, "not found");
    }

    let res = match files.oneshot(req).await {
        Ok(res) => res,
        Err(never) => match never {},
    };
    if res.status() == StatusCode::NOT_FOUND {
        return errors::json_error(StatusCode::NOT_FOUND, "not found");
    }
    res.map(Body::new)
}

