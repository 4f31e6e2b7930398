//! The session manager: single authority over session lifecycle.
//!
//! Sessions live in two places. The [`SessionStore`] holds the durable row
//! and wins whenever the cache has nothing to say; the in-memory cache keeps
//! the common path (a known token) off the database.
//!
//! ```text
//! create() ──→ [Active] ──→ validate() past expires_at ──→ [Expired]
//!                 │
//!                 ├──→ delete() ──────────────────────────→ [Deleted]
//!                 └──→ create() same user (upsert) ───────→ [Deleted]
//! ```
//!
//! The cache sits behind one `RwLock`. Guards are dropped before any store
//! call so a slow database never blocks other request tasks on the lock.

use std::collections::HashMap;
use std::future::Future;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::db::models::Session;
use crate::error::{SessionError, StoreError};
use crate::session::{cookie, SessionConfig, SessionStore};

#[derive(Default)]
struct SessionCache {
    by_token: HashMap<String, Session>,
    by_user: HashMap<i64, String>,
    /// Bumped on every removal. A store read that started before a bump
    /// may have seen a row that is gone now.
    removals: u64,
}

impl SessionCache {
    fn get(&self, token: &str) -> Option<Session> {
        self.by_token.get(token).cloned()
    }

    /// Cache `session`, evicting any older token held for the same user.
    /// A session older than the one already cached for its user is ignored.
    fn insert(&mut self, session: Session) {
        if let Some(current) = self.by_user.get(&session.user_id) {
            if let Some(existing) = self.by_token.get(current) {
                if existing.created_at > session.created_at {
                    return;
                }
            }
            if *current != session.token {
                let stale = current.clone();
                self.by_token.remove(&stale);
            }
        }

        self.by_user.insert(session.user_id, session.token.clone());
        self.by_token.insert(session.token.clone(), session);
    }

    fn generation(&self) -> u64 {
        self.removals
    }

    /// Cache a session read from the store, unless something was removed
    /// since `seen` was taken.
    fn insert_unless_removed(&mut self, session: Session, seen: u64) -> bool {
        if self.removals != seen {
            return false;
        }
        self.insert(session);
        true
    }

    /// Move the expiry of a cached entry. Tokens not cached stay uncached.
    fn touch(&mut self, token: &str, expires_at: DateTime<Utc>) {
        if let Some(session) = self.by_token.get_mut(token) {
            session.expires_at = expires_at;
        }
    }

    fn remove(&mut self, token: &str) -> Option<Session> {
        self.removals += 1;
        let session = self.by_token.remove(token)?;
        if self.by_user.get(&session.user_id).map(String::as_str) == Some(token) {
            self.by_user.remove(&session.user_id);
        }
        Some(session)
    }

    fn retain_live(&mut self, now: DateTime<Utc>) -> usize {
        self.removals += 1;
        let before = self.by_token.len();
        self.by_token.retain(|_, session| !session.is_expired_at(now));
        let by_token = &self.by_token;
        self.by_user.retain(|_, token| by_token.contains_key(token));
        before - self.by_token.len()
    }
}

pub struct SessionManager {
    config: SessionConfig,
    cache: RwLock<SessionCache>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(SessionCache::default()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run a store call under the configured timeout.
    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.config.store_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.config.store_timeout))?
    }

    /// Start a session for a verified user.
    ///
    /// `token` comes from the password hasher. Without `requested_expiry`
    /// the session lives for `default_lifetime`. The row replaces whatever
    /// the store held for `user_id`.
    ///
    /// # Errors
    /// [`SessionError::Persistence`] when the store write fails. The session
    /// is not cached in that case.
    pub async fn create<S>(
        &self,
        store: &S,
        token: String,
        user_id: i64,
        requested_expiry: Option<DateTime<Utc>>,
    ) -> Result<Session, SessionError>
    where
        S: SessionStore + ?Sized,
    {
        let now = Utc::now();
        let expires_at = requested_expiry.unwrap_or(now + self.config.default_lifetime);
        // created_at < expires_at even for an expiry already in the past
        let created_at = now.min(expires_at - chrono::Duration::seconds(1));

        let session = Session {
            user_id,
            token,
            created_at,
            expires_at,
        };

        if let Err(err) = self.bounded(store.upsert(&session)).await {
            tracing::error!(user_id, error = %err, "❌ Failed to persist session");
            return Err(SessionError::Persistence(err));
        }

        self.cache.write().await.insert(session.clone());
        tracing::info!(user_id, expires_at = %session.expires_at, "Session created");
        Ok(session)
    }

    /// Gate for protected handlers: the session behind the request cookie.
    ///
    /// Detecting expiry deletes the session from store and cache.
    pub async fn validate<S>(&self, store: &S, headers: &HeaderMap) -> Result<Session, SessionError>
    where
        S: SessionStore + ?Sized,
    {
        let token = cookie::extract_token(headers, &self.config.cookie_name)?;
        self.validate_token(store, &token).await
    }

    pub async fn validate_token<S>(&self, store: &S, token: &str) -> Result<Session, SessionError>
    where
        S: SessionStore + ?Sized,
    {
        let (cached, seen) = {
            let cache = self.cache.read().await;
            (cache.get(token), cache.generation())
        };
        let from_cache = cached.is_some();

        let session = match cached {
            Some(session) => session,
            None => {
                tracing::debug!("Session cache miss, consulting store");
                self.read(store, token).await?
            }
        };

        if session.is_expired() {
            self.expire(store, &session).await;
            return Err(SessionError::Expired);
        }

        if !from_cache
            && !self
                .cache
                .write()
                .await
                .insert_unless_removed(session.clone(), seen)
        {
            tracing::debug!(user_id = session.user_id, "Session removed mid-lookup, not cached");
        }

        if self.config.sliding_expiry {
            return Ok(self.slide(store, session).await);
        }

        Ok(session)
    }

    /// Look a token up in the store only. Never touches the cache.
    pub async fn read<S>(&self, store: &S, token: &str) -> Result<Session, SessionError>
    where
        S: SessionStore + ?Sized,
    {
        self.bounded(store.find_by_token(token))
            .await?
            .ok_or(SessionError::NotFound)
    }

    /// Remove a session from the cache and the store. Absent tokens are fine.
    pub async fn delete<S>(&self, store: &S, token: &str) -> Result<(), SessionError>
    where
        S: SessionStore + ?Sized,
    {
        // Store first: a lookup racing this call either misses the row or
        // sees the cache removal below and skips caching it.
        let deleted = self.bounded(store.delete(token)).await;
        let removed = self.cache.write().await.remove(token);
        deleted?;

        if let Some(session) = removed {
            tracing::info!(user_id = session.user_id, "Session deleted");
        }
        Ok(())
    }

    /// Drop every expired session from store and cache.
    pub async fn purge_expired<S>(&self, store: &S) -> Result<u64, SessionError>
    where
        S: SessionStore + ?Sized,
    {
        let now = Utc::now();
        let evicted = self.cache.write().await.retain_live(now);
        let removed = self.bounded(store.delete_expired(now)).await?;

        tracing::debug!(evicted, removed, "Expired sessions purged");
        Ok(removed)
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.by_token.len()
    }

    async fn expire<S>(&self, store: &S, session: &Session)
    where
        S: SessionStore + ?Sized,
    {
        let deleted = self.bounded(store.delete(&session.token)).await;
        self.cache.write().await.remove(&session.token);

        // The session is already dead to the caller; a failed delete only
        // leaves a row the next validation or sweep retries.
        match deleted {
            Ok(()) => tracing::info!(user_id = session.user_id, "Session expired, removed"),
            Err(err) => tracing::warn!(
                user_id = session.user_id,
                error = %err,
                "Session expired but the store delete failed"
            ),
        }
    }

    async fn slide<S>(&self, store: &S, mut session: Session) -> Session
    where
        S: SessionStore + ?Sized,
    {
        let expires_at = Utc::now() + self.config.default_lifetime;

        match self.bounded(store.extend(&session.token, expires_at)).await {
            Ok(()) => {
                session.expires_at = expires_at;
                self.cache.write().await.touch(&session.token, expires_at);
            }
            Err(err) => tracing::warn!(
                user_id = session.user_id,
                error = %err,
                "Could not extend session"
            ),
        }
        session
    }
}
