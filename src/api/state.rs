use std::sync::Arc;

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::db::{Session, SessionRepository};
use crate::error::{AppError, SessionError};
use crate::session::{cookie, SessionManager};

/// Context handed to every handler by the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub sessions: Arc<SessionManager>,
    pub session_store: SessionRepository,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: Arc<Config>) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(config.session_config())),
            session_store: SessionRepository::new(db.clone()),
            db,
            config,
        }
    }

    /// The gate for protected handlers.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Session, AuthRejection> {
        self.sessions
            .validate(&self.session_store, headers)
            .await
            .map_err(|error| AuthRejection {
                clear: matches!(error, SessionError::Expired).then(|| self.clear_cookie().ok()).flatten(),
                error,
            })
    }

    pub fn session_cookie(&self, session: &Session) -> Result<HeaderValue, AppError> {
        let config = self.sessions.config();
        cookie::session_cookie(&config.cookie_name, session, config.secure_cookie)
            .map_err(|e| AppError::Internal(format!("Invalid session cookie: {}", e)))
    }

    pub fn clear_cookie(&self) -> Result<HeaderValue, AppError> {
        let config = self.sessions.config();
        cookie::clear_cookie(&config.cookie_name, config.secure_cookie)
            .map_err(|e| AppError::Internal(format!("Invalid session cookie: {}", e)))
    }
}

/// A failed session check. Expired sessions also clear the client cookie.
#[derive(Debug)]
pub struct AuthRejection {
    pub error: SessionError,
    clear: Option<HeaderValue>,
}

impl AuthRejection {
    pub fn clear_cookie(&self) -> Option<&HeaderValue> {
        self.clear.as_ref()
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let mut response = AppError::Session(self.error).into_response();
        if let Some(value) = self.clear {
            response.headers_mut().append(SET_COOKIE, value);
        }
        response
    }
}
