pub mod files;
pub mod models;
pub mod sessions;
pub mod users;

pub use files::FileRepository;
pub use models::{Credentials, FileInfo, Session};
pub use sessions::SessionRepository;
pub use users::UserRepository;

use sqlx::{Pool, Sqlite};

use crate::error::AppError;

/// Apply the embedded schema migrations.
pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn test_pool() -> Pool<Sqlite> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
