//! HTTP API application wiring (Axum router + shared state).
//!
//! - `routes/dispatch.rs`: method + path → intended operation (pure)
//! - `routes/users.rs`: per-operation handlers
//! - `errors.rs`: consistent error responses

use std::path::Path;
use std::sync::Arc;

use axum::{error_handling::HandleErrorLayer, routing::get, Router};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{services::ServeDir, trace::TraceLayer};

use userhub_infra::UserStore;

use crate::config::ApiConfig;

pub mod errors;
pub mod routes;

/// State shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub static_files: Option<ServeDir>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, static_dir: Option<&Path>) -> Self {
        Self {
            store,
            static_files: static_dir.map(ServeDir::new),
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(store: Arc<dyn UserStore>, config: &ApiConfig) -> Router {
    let state = AppState::new(store, config.static_dir.as_deref());

    Router::new()
        .route(
            "/health",
            get(routes::system::health).fallback(routes::system::method_not_allowed),
        )
        .fallback(routes::handle_request)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(errors::handle_middleware_error))
                .layer(TimeoutLayer::new(config.request_timeout)),
        )
}
