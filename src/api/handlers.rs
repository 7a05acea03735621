//! Authentication request handlers

use super::cookie::{
    authenticate_request, clear_session_cookie, extract_session_token, session_cookie,
};
use super::errors::ApiError;
use crate::auth::{generate_token, AuthError, Authenticator, SALT_LEN};
use crate::credentials::{check_credentials, CredentialError, CredentialStore, UserRecord};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    pub auth: Arc<dyn Authenticator>,
    pub credentials: Arc<dyn CredentialStore>,
}

/// JSON body of every response.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "OK".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "ERROR".to_string(),
            message: Some(message.into()),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.username.is_empty() {
            return Err(ApiError::BadRequest("username must be provided".to_string()));
        }
        if self.password.is_empty() {
            return Err(ApiError::BadRequest("password must be provided".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
}

impl RegisterUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.username.is_empty() {
            return Err(ApiError::BadRequest("username is not provided".to_string()));
        }
        if self.password.is_empty() {
            return Err(ApiError::BadRequest("password is not provided".to_string()));
        }
        Ok(())
    }
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    ApiError::Internal(format!("hashing task failed: {}", e))
}

/// GET /health
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK".to_string(),
        message: None,
    })
}

/// POST /api/register/user - store a new user with a fresh salt.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(body) = body?;
    body.validate()?;

    let salt = generate_token(SALT_LEN).map_err(AuthError::from)?;

    // PBKDF2 is deliberately slow; keep it off the async workers.
    let auth = state.auth.clone();
    let (password, task_salt) = (body.password, salt.clone());
    let hash = tokio::task::spawn_blocking(move || auth.hash_password(&password, &task_salt))
        .await
        .map_err(join_error)?;

    state
        .credentials
        .register(UserRecord {
            username: body.username.clone(),
            fullname: body.fullname,
            email: body.email,
            salt,
            hash,
            disabled: false,
        })
        .map_err(|e| match e {
            CredentialError::AlreadyExists(name) => {
                ApiError::Conflict(format!("user '{}' already exists", name))
            }
            other => ApiError::Internal(other.to_string()),
        })?;

    info!("Registered user '{}'", body.username);
    Ok(Json(StatusResponse::ok(format!(
        "Successfully registered user with '{}' username",
        body.username
    ))))
}

/// POST /api/login - verify credentials, set session cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    body.validate()?;
    let LoginRequest { username, password } = body;

    let task_state = state.clone();
    let task_username = username.clone();
    let checked = tokio::task::spawn_blocking(move || {
        check_credentials(
            task_state.auth.as_ref(),
            task_state.credentials.as_ref(),
            &task_username,
            &password,
        )
    })
    .await
    .map_err(join_error)?;

    if let Err(e) = checked {
        warn!("Login failed for user '{}'", username);
        return Err(e.into());
    }

    let token = state.auth.create_session()?;
    let cookie = HeaderValue::from_str(&session_cookie(&token))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);

    info!("User '{}' logged in", username);
    Ok((
        StatusCode::OK,
        headers,
        Json(StatusResponse::ok(format!(
            "Successfully logged in user with '{}' username",
            username
        ))),
    )
        .into_response())
}

/// POST /api/login/status - reached only through [`require_session`].
pub async fn login_status() -> Json<StatusResponse> {
    Json(StatusResponse::ok("Session is active"))
}

/// POST /api/logout - end the session if any and clear the cookie.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = extract_session_token(&headers) {
        state.auth.end_session(&token);
    }

    let mut resp_headers = HeaderMap::new();
    if let Ok(cookie) = HeaderValue::from_str(&clear_session_cookie()) {
        resp_headers.insert(header::SET_COOKIE, cookie);
    }

    (
        StatusCode::OK,
        resp_headers,
        Json(StatusResponse::ok("Successfully logged out")),
    )
}

/// Middleware rejecting requests without a live session.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    match authenticate_request(state.auth.as_ref(), &headers) {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}
