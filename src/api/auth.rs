use axum::extract::Request;
use axum::http::header::SET_COOKIE;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::crypto::{derive_token, verify_password};
use crate::db::UserRepository;
use crate::error::AppError;
use crate::session::cookie;

const MAX_LOGIN_BODY: usize = 16 * 1024;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// POST /auth
pub async fn login(request: Request, state: AppState) -> Result<Response, AppError> {
    // An already valid session just gets its cookie refreshed
    if let Ok(session) = state.authenticate(request.headers()).await {
        tracing::debug!(user_id = session.user_id, "Session already valid");
        let cookie = state.session_cookie(&session)?;
        return Ok((StatusCode::ACCEPTED, [(SET_COOKIE, cookie)]).into_response());
    }

    if request.method() != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let body = axum::body::to_bytes(request.into_body(), MAX_LOGIN_BODY)
        .await
        .map_err(|e| AppError::BadRequest(format!("Unreadable body: {}", e)))?;
    let req: LoginRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid login payload: {}", e)))?;

    let user = UserRepository::get_by_login(&state.db, req.login.trim())
        .await?
        .ok_or_else(|| AppError::Auth("Invalid credentials".to_string()))?;

    // Argon2 is deliberately slow; keep it off the async workers
    let password = req.password.clone();
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password check aborted: {}", e)))??;

    if !verified {
        tracing::info!(user_id = user.id, "Incorrect password");
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    let token = derive_token(&req.password);
    let session = state
        .sessions
        .create(&state.session_store, token, user.id, None)
        .await?;

    tracing::info!(user_id = user.id, "✅ User logged in");

    let cookie = state.session_cookie(&session)?;
    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            user_id: session.user_id,
            expires_at: session.expires_at,
        }),
    )
        .into_response())
}

/// POST /logout
pub async fn logout(request: Request, state: AppState) -> Result<Response, AppError> {
    if request.method() != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    match cookie::extract_token(request.headers(), &state.sessions.config().cookie_name) {
        Ok(token) => {
            state.sessions.delete(&state.session_store, &token).await?;
        }
        Err(_) => tracing::debug!("Logout without a session cookie"),
    }

    let cookie = state.clear_cookie()?;
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]).into_response())
}
