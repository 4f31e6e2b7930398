use std::path::Path;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use crate::api::state::AppState;
use crate::dispatch::Handler;
use crate::error::AppError;

async fn page(static_dir: &str, file: &str) -> Result<Html<String>, AppError> {
    let html = tokio::fs::read_to_string(Path::new(static_dir).join(file)).await?;
    Ok(Html(html))
}

/// Auth failures bounce to the login page; store failures stay a 500.
fn to_login(state: &AppState, rejection: crate::api::AuthRejection) -> Response {
    if !rejection.error.is_auth_failure() {
        return rejection.into_response();
    }

    tracing::debug!(reason = %rejection.error, "Redirecting to login");
    let location = state.config.login_url.clone();
    match rejection.clear_cookie() {
        Some(clear) => (
            StatusCode::FOUND,
            [(LOCATION, location)],
            [(SET_COOKIE, clear.clone())],
        )
            .into_response(),
        None => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
    }
}

/// GET /
pub async fn root(request: Request, state: AppState) -> Response {
    if request.method() != Method::GET {
        return AppError::MethodNotAllowed.into_response();
    }

    match state.authenticate(request.headers()).await {
        Ok(_) => page(&state.config.static_dir, "app.html").await.into_response(),
        Err(rejection) => to_login(&state, rejection),
    }
}

/// GET /login
pub async fn login_page(request: Request, state: AppState) -> Response {
    if state.authenticate(request.headers()).await.is_ok() {
        return (StatusCode::FOUND, [(LOCATION, "/")]).into_response();
    }
    page(&state.config.static_dir, "login.html").await.into_response()
}

pub struct NotFound;

#[async_trait]
impl Handler<AppState> for NotFound {
    async fn serve(&self, request: Request, _state: AppState) -> Response {
        tracing::debug!(path = %request.uri().path(), "No route");
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Not found" })),
        )
            .into_response()
    }
}
