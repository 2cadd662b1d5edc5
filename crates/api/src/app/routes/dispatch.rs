//! Request dispatch: `(method, path)` → the operation a request intends.
//!
//! Pure and state-free so it can be exercised without a server. Handlers
//! still re-check the method they receive.

use axum::http::Method;

/// Every user route lives under this prefix.
pub const USERS_PREFIX: &str = "/api/v1/users";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ListUsers,
    GetUser(String),
    CreateUser,
    UpdateUser(String),
    DeleteUser(String),
    MethodNotAllowed,
    BadRequest(&'static str),
    NotFound,
}

/// Resolve a request line to a [`Route`].
///
/// The segment after the prefix (surrounding slashes trimmed) is the id, and
/// it is handed over unparsed. `/api/v1/usersX` is not under the prefix.
pub fn dispatch(method: &Method, path: &str) -> Route {
    let Some(rest) = path.strip_prefix(USERS_PREFIX) else {
        return Route::NotFound;
    };
    if !rest.is_empty() && !rest.starts_with('/') {
        return Route::NotFound;
    }

    let id = rest.trim_matches('/');
    let id = (!id.is_empty()).then(|| id.to_string());

    match (method.as_str(), id) {
        ("GET", None) => Route::ListUsers,
        ("GET", Some(id)) => Route::GetUser(id),
        ("POST", None) => Route::CreateUser,
        ("POST", Some(_)) => Route::MethodNotAllowed,
        ("PUT", Some(id)) => Route::UpdateUser(id),
        ("PUT", None) => Route::BadRequest("user id is required"),
        ("DELETE", Some(id)) => Route::DeleteUser(id),
        ("DELETE", None) => Route::BadRequest("user id is required"),
        _ => Route::MethodNotAllowed,
    }
}
