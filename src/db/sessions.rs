use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::db::models::Session;
use crate::error::StoreError;
use crate::session::SessionStore;

/// SQLite-backed session table. Cheap to clone; shares the pool.
#[derive(Clone)]
pub struct SessionRepository {
    pool: Pool<Sqlite>,
}

impl SessionRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn upsert(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO sessions (user_id, token, created, expires)
VALUES (?, ?, ?, ?)
ON CONFLICT (user_id) DO UPDATE
    SET token = excluded.token,
        created = excluded.created,
        expires = excluded.expires
            "#,
        )
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT user_id, token, created, expires FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("No session row to delete");
        }
        Ok(())
    }

    async fn extend(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE sessions SET expires = ? WHERE token = ?")
            .bind(expires_at)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        // Timestamps are stored as RFC 3339 text; julianday() parses them.
        let result = sqlx::query("DELETE FROM sessions WHERE julianday(expires) < julianday(?)")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
