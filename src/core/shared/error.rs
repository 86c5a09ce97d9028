use axum::http::StatusCode;
use axum::{response::IntoResponse, Json};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::error;

use crate::classifier::ClassifierError;
use crate::security::AuthError;
use crate::tickets::TicketError;

/// Uniform failure of the relational store. Callers treat it as fatal for
/// the current request.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Connection pool error: {0}")]
    Pool(String),
    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Corrupt row: {0}")]
    Corrupt(String),
    #[error("Blocking task failed: {0}")]
    Task(String),
}

impl IntoResponse for StorageError {
    fn into_response(self) -> axum::response::Response {
        error!("Storage failure: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "internal storage error" })),
        )
            .into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Ticket(#[from] TicketError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Maps constraint violations from an insert or update to client errors.
    pub fn from_write(err: StorageError) -> Self {
        match err {
            StorageError::Query(DieselError::DatabaseError(kind, info)) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::Conflict(
                    info.constraint_name()
                        .map(|c| format!("duplicate value violates {c}"))
                        .unwrap_or_else(|| "duplicate value".to_string()),
                ),
                DatabaseErrorKind::ForeignKeyViolation => {
                    Self::Validation("referenced record does not exist".to_string())
                }
                DatabaseErrorKind::CheckViolation => {
                    Self::Validation("value out of range".to_string())
                }
                other => {
                    Self::Storage(StorageError::Query(DieselError::DatabaseError(other, info)))
                }
            },
            other => Self::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            Self::Auth(e) => return e.into_response(),
            Self::Ticket(e) => return e.into_response(),
            Self::Storage(e) => return e.into_response(),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Classifier(e) => {
                error!("Classifier request failed: {}", e);
                (StatusCode::BAD_GATEWAY, "classifier unavailable".to_string())
            }
            Self::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
