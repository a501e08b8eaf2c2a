use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::auth::repo_types::{StoreError, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, total_hours, created_at";

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with a zero hour count.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, total_hours, created_at)
            VALUES (?1, ?2, ?3, 0, ?4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateUser
            }
            other => StoreError::Database(other),
        })?;
        Ok(user)
    }

    /// Persist the mutable columns of `user`. `id` and `created_at` never change.
    pub async fn update(db: &SqlitePool, user: &User) -> anyhow::Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET username = ?1, email = ?2, total_hours = ?3
             WHERE id = ?4
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.total_hours)
        .bind(user.id)
        .execute(db)
        .await?;
        anyhow::ensure!(result.rows_affected() == 1, "user {} not found", user.id);
        Ok(())
    }
}
