pub mod identity;
pub mod jwt;
pub mod password;

use axum::http::StatusCode;
use axum::{response::IntoResponse, Json};
use log::{error, warn};

use crate::core::shared::error::StorageError;

pub use identity::{Identity, Role};
pub use jwt::JwtManager;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or malformed authorization header")]
    MissingToken,
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("invalid login or password")]
    InvalidCredentials,
    #[error("password reset required")]
    PasswordResetRequired,
    #[error("invalid or expired code")]
    InvalidCode,
    #[error("{0}")]
    WeakPassword(String),
    #[error("access denied for this role")]
    Forbidden,
    #[error("account no longer exists")]
    UnknownAccount,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let status = match self {
            Self::Storage(e) => return e.into_response(),
            Self::MissingToken | Self::InvalidCredentials | Self::UnknownAccount => {
                StatusCode::UNAUTHORIZED
            }
            Self::Token(e) => {
                warn!("Rejected token: {}", e);
                StatusCode::UNAUTHORIZED
            }
            Self::PasswordResetRequired => StatusCode::CONFLICT,
            Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden | Self::InvalidCode => StatusCode::FORBIDDEN,
            Self::Hash(detail) => {
                error!("Password hashing failed: {}", detail);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "internal error" })),
                )
                    .into_response();
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::PasswordResetRequired.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::InvalidCode.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::WeakPassword("too short".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
