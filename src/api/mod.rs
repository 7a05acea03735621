//! HTTP API: login, logout, registration and session status

mod cookie;
mod errors;
pub mod handlers;

pub use cookie::{
    authenticate_request, clear_session_cookie, extract_session_token, session_cookie,
};
pub use errors::ApiError;
pub use handlers::{AppState, StatusResponse};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the application router.
///
/// Routes:
///   GET  /health             - liveness
///   POST /api/register/user  - create a user
///   POST /api/login          - verify credentials, set SESSIONID cookie
///   POST /api/login/status   - 200 if the SESSIONID cookie is a live session
///   POST /api/logout         - end the session, clear the cookie
pub fn router(state: Arc<AppState>) -> Router {
    // Routes that require an authenticated session
    let protected = Router::new()
        .route("/api/login/status", post(handlers::login_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_session,
        ));

    Router::new()
        .merge(protected)
        .route("/health", get(handlers::health_check))
        .route("/api/register/user", post(handlers::register_user))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .with_state(state)
}
