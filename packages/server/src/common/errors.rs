use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors surfaced by the identity core.
///
/// Credential failures deliberately collapse into `InvalidChallenge` /
/// `Unauthorized`: a caller must not be able to tell a wrong code from
/// an expired one, or a near-miss admin contact from a random string.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Too many verification codes requested")]
    RateLimited,

    #[error("Failed to deliver verification code")]
    DeliveryFailed,

    #[error("Invalid or expired verification code")]
    InvalidChallenge,

    #[error("This WhatsApp number is already registered")]
    DuplicateIdentity,

    #[error("This site name is already in use")]
    DuplicateSlug,

    #[error("Not found")]
    NotFound,

    #[error("Not authorized")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::DeliveryFailed => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidChallenge => StatusCode::UNAUTHORIZED,
            AuthError::DuplicateIdentity | AuthError::DuplicateSlug => StatusCode::BAD_REQUEST,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Unauthorized => StatusCode::FORBIDDEN,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs, never in the response body.
        let message = match &self {
            AuthError::Internal(e) => {
                tracing::error!(error = %e, "Internal error in identity core");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AuthError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::InvalidChallenge.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::DuplicateSlug.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_is_opaque() {
        let err = AuthError::Internal(anyhow::anyhow!("connection refused to db at 10.0.0.1"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
