pub mod auth;
pub mod files;
pub mod pages;
pub mod state;

pub use state::{AppState, AuthRejection};

use std::path::PathBuf;
use std::time::Duration;

use axum::extract::Request;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::dispatch::Dispatcher;
use crate::error::DispatchError;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Result<Router, DispatchError> {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let static_dir = PathBuf::from(&state.config.static_dir);

    let mut dispatcher = Dispatcher::new(state);
    dispatcher
        // Pages
        .handle_fn("/", pages::root)?
        .handle_fn("/login", pages::login_page)?
        // Authentication endpoints
        .handle_fn("/auth", auth::login)?
        .handle_fn("/logout", auth::logout)?
        // Archive
        .handle_fn("/saved", files::saved)?
        .handle_fn("/health", health)?
        // Assets
        .serve_dir("/css", static_dir.join("css"))?
        .serve_dir("/js", static_dir.join("js"))?
        .not_found(pages::NotFound)?;

    Ok(dispatcher
        .into_router()
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http()))
}

async fn health(_request: Request, _state: AppState) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Method, StatusCode};
    use axum::response::Response;
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::crypto::{derive_token, hash_password};
    use crate::db::{self, FileRepository, UserRepository};

    const PASSWORD: &str = "hunter2hunter2";

    async fn setup() -> (AppState, i64) {
        let pool = db::test_pool().await;
        let hash = hash_password(PASSWORD).unwrap();
        let user = UserRepository::create(&pool, "alice", "alice@example.com", &hash)
            .await
            .unwrap();
        FileRepository::create(&pool, "cat.gif").await.unwrap();
        FileRepository::create(&pool, "dog.png").await.unwrap();

        let state = AppState::new(pool, Arc::new(Config::default()));
        (state, user.id)
    }

    async fn send(state: &AppState, method: Method, path: &str, cookie: Option<&str>, body: Body) -> Response {
        let mut builder = axum::http::Request::builder()
            .method(method)
            .uri(path)
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        create_router(state.clone())
            .unwrap()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn login(state: &AppState, login: &str, password: &str) -> Response {
        let body = serde_json::json!({ "login": login, "password": password }).to_string();
        send(state, Method::POST, "/auth", None, Body::from(body)).await
    }

    /// `name=value` part of the response's Set-Cookie header.
    fn cookie_pair(response: &Response) -> String {
        let raw = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_unlocks_saved() {
        let (state, user_id) = setup().await;

        let response = login(&state, "alice", PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = cookie_pair(&response);
        assert!(cookie.starts_with("memegrab="));
        assert_eq!(json(response).await["user_id"], user_id);

        let response = send(&state, Method::GET, "/saved", Some(&cookie), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let files = json(response).await;
        assert_eq!(files.as_array().unwrap().len(), 2);
        assert_eq!(files[0]["file_name"], "cat.gif");
    }

    #[tokio::test]
    async fn test_login_by_email() {
        let (state, _) = setup().await;
        let response = login(&state, "alice@example.com", PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (state, _) = setup().await;

        assert_eq!(login(&state, "alice", "wrong").await.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(login(&state, "bob", PASSWORD).await.status(), StatusCode::UNAUTHORIZED);

        let response = send(&state, Method::POST, "/auth", None, Body::from("{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_with_valid_session_is_accepted() {
        let (state, _) = setup().await;
        let cookie = cookie_pair(&login(&state, "alice", PASSWORD).await);

        let response = send(&state, Method::POST, "/auth", Some(&cookie), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(cookie_pair(&response), cookie);
    }

    #[tokio::test]
    async fn test_auth_requires_post() {
        let (state, _) = setup().await;
        let response = send(&state, Method::GET, "/auth", None, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_saved_without_cookie_is_unauthorized() {
        let (state, _) = setup().await;
        let response = send(&state, Method::GET, "/saved", None, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&state, Method::GET, "/saved", Some("memegrab=bogus"), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_session_clears_cookie() {
        let (state, user_id) = setup().await;
        let token = derive_token(PASSWORD);
        let past = Utc::now() - chrono::Duration::hours(1);
        state
            .sessions
            .create(&state.session_store, token.clone(), user_id, Some(past))
            .await
            .unwrap();

        let cookie = format!("memegrab={}", token);
        let response = send(&state, Method::GET, "/saved", Some(&cookie), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
        assert_eq!(state.sessions.cached_len().await, 0);
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let (state, _) = setup().await;
        let cookie = cookie_pair(&login(&state, "alice", PASSWORD).await);

        let response = send(&state, Method::POST, "/logout", Some(&cookie), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(cookie_pair(&response).starts_with("memegrab="));

        let response = send(&state, Method::GET, "/saved", Some(&cookie), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Repeating it is harmless
        let response = send(&state, Method::POST, "/logout", Some(&cookie), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_root_redirects_to_login_without_session() {
        let (state, _) = setup().await;
        let response = send(&state, Method::GET, "/", None, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_root_serves_app_with_session() {
        let (state, _) = setup().await;
        let cookie = cookie_pair(&login(&state, "alice", PASSWORD).await);
        let response = send(&state, Method::GET, "/", Some(&cookie), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_store_outage_is_server_error() {
        let (state, _) = setup().await;
        state.db.close().await;

        let response = send(&state, Method::GET, "/saved", Some("memegrab=abc"), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_path_and_health() {
        let (state, _) = setup().await;

        let response = send(&state, Method::GET, "/nope", None, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&state, Method::GET, "/health", None, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "healthy");
    }
}
