use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::Session;
use crate::error::StoreError;

/// Durable home of sessions. The source of truth on a cache miss.
///
/// Implementations must be safe to share between request tasks.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert, or replace the row already held for `session.user_id`.
    async fn upsert(&self, session: &Session) -> Result<(), StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Deleting an absent token is not an error.
    async fn delete(&self, token: &str) -> Result<(), StoreError>;

    async fn extend(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove every session already dead at `now`. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
