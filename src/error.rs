use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::tree::otp::OtpError;

/// Error type shared by services and handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Otp(#[from] OtpError),

    /// Email gateway unreachable or not configured.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return match db_err.constraint() {
                    Some("uq_users_email") => Self::Conflict("Email already in use".into()),
                    Some("uq_trees_owner_id") => {
                        Self::Conflict("A tree already exists for this account".into())
                    }
                    _ => Self::Conflict("Resource already exists".into()),
                };
            }
        }
        Self::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Otp(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Upstream(detail) => {
                error!(error = %detail, "upstream failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Email delivery failed".to_string(),
                )
            }
            AppError::Database(e) => {
                error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        (status, Json(json!({ "ok": false, "error": message }))).into_response()
    }
}
