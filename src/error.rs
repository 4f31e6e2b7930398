use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

/// Failure talking to a session store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session expired")]
    Expired,

    #[error("invalid session cookie: {0}")]
    InvalidCookie(String),

    #[error("session store error: {0}")]
    Store(#[from] StoreError),

    /// Create could not write the session; nothing was cached.
    #[error("session could not be persisted: {0}")]
    Persistence(#[source] StoreError),
}

impl SessionError {
    /// Whether the error means "the caller is not authenticated" as opposed
    /// to an infrastructure failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            SessionError::NotFound | SessionError::Expired | SessionError::InvalidCookie(_)
        )
    }
}

/// Route registration mistakes. Always fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("root handler already registered")]
    DuplicateRoot,

    #[error("not found handler already registered")]
    DuplicateNotFound,

    #[error("pattern {0:?} already registered")]
    DuplicateRoute(String),

    #[error("pattern {0:?} must start with '/'")]
    InvalidPattern(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Routing error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration failed: {}", err))
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
            }
            AppError::Session(err) if err.is_auth_failure() => {
                (StatusCode::UNAUTHORIZED, err.to_string())
            }
            AppError::Session(err) => {
                tracing::error!("❌ {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Session store unavailable".to_string())
            }
            AppError::Database(err) => {
                tracing::error!("❌ Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Crypto(msg)
            | AppError::Config(msg)
            | AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Dispatch(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
