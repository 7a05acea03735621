//! HTTP-facing error type

use super::handlers::StatusResponse;
use crate::auth::AuthError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

/// API errors.
///
/// Every authentication or credential failure becomes `Unauthorized` with one
/// fixed body, so clients cannot tell an expired session from an unknown one,
/// or a wrong password from an unknown user.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref detail) = self {
            error!("Internal error: {}", detail);
        }
        let status = self.status_code();
        (status, Json(StatusResponse::error(self.to_string()))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Entropy(e) => {
                warn!("Secure random source failed: {}", e);
                ApiError::Internal(e.to_string())
            }
            AuthError::Authentication(_) | AuthError::CredentialMismatch => ApiError::Unauthorized,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthFailure, EntropyError};

    #[test]
    fn test_auth_failures_are_indistinguishable() {
        let causes = [
            AuthError::Authentication(AuthFailure::MissingToken),
            AuthError::Authentication(AuthFailure::UnknownToken),
            AuthError::Authentication(AuthFailure::Expired),
            AuthError::CredentialMismatch,
        ];
        for cause in causes {
            let api: ApiError = cause.into();
            assert!(matches!(api, ApiError::Unauthorized));
            assert_eq!(api.to_string(), "unauthorized");
        }
    }

    #[test]
    fn test_entropy_failure_is_internal_and_opaque() {
        let api: ApiError = AuthError::from(EntropyError::new("getrandom: ENOSYS")).into();
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.to_string().contains("getrandom"));
    }
}
