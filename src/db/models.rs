use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Login record. Read-only for the session layer.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Session {
    pub user_id: i64,
    pub token: String,
    #[sqlx(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "expires")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// No grace period: a session is dead strictly after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: i64,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_expiring_at(expires_at: DateTime<Utc>) -> Session {
        Session {
            user_id: 1,
            token: "t".into(),
            created_at: expires_at - Duration::hours(1),
            expires_at,
        }
    }

    #[test]
    fn test_expiry_is_monotonic() {
        let now = Utc::now();
        let session = session_expiring_at(now + Duration::seconds(10));

        assert!(!session.is_expired_at(now));
        assert!(!session.is_expired_at(session.expires_at));
        assert!(session.is_expired_at(session.expires_at + Duration::milliseconds(1)));
        // once past the deadline it stays dead
        assert!(session.is_expired_at(now + Duration::days(365)));
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let session = session_expiring_at(Utc::now() - Duration::seconds(1));
        assert!(session.is_expired());
    }
}
