use sqlx::{Pool, Sqlite};

use crate::db::models::Credentials;
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Credentials, AppError> {
        let user = sqlx::query_as::<_, Credentials>(
            r#"
INSERT INTO users (username, email, password_hash)
VALUES (?, ?, ?)
RETURNING id, username, email, password_hash
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Look up a user by username or email.
    pub async fn get_by_login(
        pool: &Pool<Sqlite>,
        login: &str,
    ) -> Result<Option<Credentials>, AppError> {
        let user = sqlx::query_as::<_, Credentials>(
            "SELECT id, username, email, password_hash FROM users WHERE username = ? OR email = ?",
        )
        .bind(login)
        .bind(login)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_lookup_by_username_or_email() {
        let pool = test_pool().await;
        let created = UserRepository::create(&pool, "alice", "alice@example.com", "$hash")
            .await
            .unwrap();

        let by_name = UserRepository::get_by_login(&pool, "alice").await.unwrap().unwrap();
        let by_mail = UserRepository::get_by_login(&pool, "alice@example.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(by_name.id, created.id);
        assert_eq!(by_mail.id, created.id);
        assert!(UserRepository::get_by_login(&pool, "bob").await.unwrap().is_none());
    }
}
