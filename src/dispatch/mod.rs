//! Context-carrying route registry on top of axum.
//!
//! Every handler receives the same application context `C` alongside the
//! request, so handlers never reach for globals. The root path and the
//! not-found fallback are singletons; registering either twice is a startup
//! error.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tower_http::services::ServeDir;

use crate::error::DispatchError;

const ROOT: &str = "/";

#[async_trait]
pub trait Handler<C>: Send + Sync + 'static {
    async fn serve(&self, request: Request, context: C) -> Response;
}

/// Adapts an async fn `(Request, C) -> impl IntoResponse` into a [`Handler`].
pub struct HandlerFn<F>(pub F);

#[async_trait]
impl<C, F, Fut, R> Handler<C> for HandlerFn<F>
where
    C: Send + 'static,
    F: Fn(Request, C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
{
    async fn serve(&self, request: Request, context: C) -> Response {
        (self.0)(request, context).await.into_response()
    }
}

type SharedHandler<C> = Arc<dyn Handler<C>>;

pub struct Dispatcher<C> {
    context: C,
    routes: Vec<(String, SharedHandler<C>)>,
    patterns: HashSet<String>,
    static_dirs: Vec<(String, ServeDir)>,
    root: Option<SharedHandler<C>>,
    not_found: Option<SharedHandler<C>>,
}

impl<C> Dispatcher<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn new(context: C) -> Self {
        Self {
            context,
            routes: Vec::new(),
            patterns: HashSet::new(),
            static_dirs: Vec::new(),
            root: None,
            not_found: None,
        }
    }

    /// Register `handler` for `pattern`. `"/"` registers the root handler.
    pub fn handle<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, DispatchError>
    where
        H: Handler<C>,
    {
        if !pattern.starts_with('/') {
            return Err(DispatchError::InvalidPattern(pattern.to_string()));
        }

        if pattern == ROOT {
            if self.root.is_some() {
                return Err(DispatchError::DuplicateRoot);
            }
            self.root = Some(Arc::new(handler));
            return Ok(self);
        }

        if !self.patterns.insert(pattern.to_string()) {
            return Err(DispatchError::DuplicateRoute(pattern.to_string()));
        }
        self.routes.push((pattern.to_string(), Arc::new(handler)));
        Ok(self)
    }

    pub fn handle_fn<F, Fut, R>(&mut self, pattern: &str, f: F) -> Result<&mut Self, DispatchError>
    where
        F: Fn(Request, C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.handle(pattern, HandlerFn(f))
    }

    pub fn not_found<H>(&mut self, handler: H) -> Result<&mut Self, DispatchError>
    where
        H: Handler<C>,
    {
        if self.not_found.is_some() {
            return Err(DispatchError::DuplicateNotFound);
        }
        self.not_found = Some(Arc::new(handler));
        Ok(self)
    }

    pub fn not_found_fn<F, Fut, R>(&mut self, f: F) -> Result<&mut Self, DispatchError>
    where
        F: Fn(Request, C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.not_found(HandlerFn(f))
    }

    /// Serve files under `dir` at `prefix` (e.g. `/css`). No context involved.
    pub fn serve_dir(&mut self, prefix: &str, dir: impl AsRef<Path>) -> Result<&mut Self, DispatchError> {
        if !prefix.starts_with('/') || prefix == ROOT {
            return Err(DispatchError::InvalidPattern(prefix.to_string()));
        }
        if !self.patterns.insert(prefix.to_string()) {
            return Err(DispatchError::DuplicateRoute(prefix.to_string()));
        }
        self.static_dirs
            .push((prefix.to_string(), ServeDir::new(dir.as_ref())));
        Ok(self)
    }

    pub fn into_router(self) -> Router {
        let Dispatcher {
            context,
            routes,
            static_dirs,
            root,
            not_found,
            ..
        } = self;

        let mut router = Router::new();

        for (pattern, handler) in routes {
            router = router.route(&pattern, adapt(Some(handler), context.clone(), None));
        }

        for (prefix, dir) in static_dirs {
            router = router.nest_service(&prefix, dir);
        }

        // "/" falls through to not-found when no root handler exists
        router = router.route(ROOT, adapt(root, context.clone(), not_found.clone()));

        let fallback = not_found;
        router.fallback(move |request: Request| {
            let handler = fallback.clone();
            let context = context.clone();
            async move { serve_or_404(handler, request, context).await }
        })
    }
}

/// Turn a context-aware handler into an axum method router.
fn adapt<C>(
    handler: Option<SharedHandler<C>>,
    context: C,
    fallback: Option<SharedHandler<C>>,
) -> axum::routing::MethodRouter
where
    C: Clone + Send + Sync + 'static,
{
    any(move |request: Request| {
        let handler = handler.clone().or_else(|| fallback.clone());
        let context = context.clone();
        async move { serve_or_404(handler, request, context).await }
    })
}

async fn serve_or_404<C>(handler: Option<SharedHandler<C>>, request: Request, context: C) -> Response
where
    C: Send + Sync + 'static,
{
    match handler {
        Some(handler) => handler.serve(request, context).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
