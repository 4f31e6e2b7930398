use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memegrab::{
    api::{create_router, AppState},
    config::Config,
    db,
    error::AppError,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,memegrab=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting memegrab v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded");

    let connect_options: SqliteConnectOptions = config.database_url.parse()?;
    let db = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options.create_if_missing(true))
        .await?;

    tracing::info!("✅ Database connected: {}", config.database_url);

    db::migrate(&db).await?;
    tracing::info!("✅ Database migrations completed");

    let state = AppState::new(db, config.clone());
    tracing::info!(
        lifetime_hours = config.session_lifetime_hours,
        sliding = config.session_sliding_expiry,
        "✅ Session manager ready"
    );

    // Spawn background task for session cleanup
    {
        let sessions = state.sessions.clone();
        let store = state.session_store.clone();
        let every = Duration::from_secs(config.session_sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                match sessions.purge_expired(&store).await {
                    Ok(removed) => tracing::debug!(removed, "🧹 Expired sessions cleaned up"),
                    Err(e) => tracing::error!("❌ Session cleanup failed: {}", e),
                }
            }
        });
        tracing::info!("✅ Session cleanup task started (every {:?})", every);
    }

    // Build router; a bad registration aborts startup
    let app = create_router(state)?;

    // Bind and serve
    let addr = config.server_address();
    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("🏥 Health check: http://{}/health", addr);
    tracing::info!("");
    tracing::info!("📚 Endpoints:");
    tracing::info!("  GET  /        - Archive page (requires auth)");
    tracing::info!("  GET  /login   - Login page");
    tracing::info!("  POST /auth    - Log in with username or email");
    tracing::info!("  POST /logout  - End the current session");
    tracing::info!("  GET  /saved   - List saved files (requires auth)");
    tracing::info!("");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
