use sqlx::{Pool, Sqlite};

use crate::db::models::FileInfo;
use crate::error::AppError;

pub struct FileRepository;

impl FileRepository {
    pub async fn create(pool: &Pool<Sqlite>, file_name: &str) -> Result<FileInfo, AppError> {
        let file = sqlx::query_as::<_, FileInfo>(
            "INSERT INTO saved (file_name) VALUES (?) RETURNING id, file_name",
        )
        .bind(file_name)
        .fetch_one(pool)
        .await?;

        Ok(file)
    }

    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<FileInfo>, AppError> {
        let files = sqlx::query_as::<_, FileInfo>("SELECT id, file_name FROM saved ORDER BY id")
            .fetch_all(pool)
            .await?;

        Ok(files)
    }
}
