use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;

/// User record in the `login."user"` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

impl User {
    /// Insert a new user. A unique-index violation on username or email
    /// surfaces as `Duplicate` through the sqlx error mapping.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO login."user" (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM login."user"
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i32) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM login."user"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn email_exists(db: &PgPool, email: &str) -> Result<bool, ApiError> {
        let found: Option<(i32,)> =
            sqlx::query_as(r#"SELECT id FROM login."user" WHERE email = $1"#)
                .bind(email)
                .fetch_optional(db)
                .await?;
        Ok(found.is_some())
    }

    /// True when another user (self excluded) already owns the username.
    pub async fn username_taken_by_other(
        db: &PgPool,
        username: &str,
        self_id: i32,
    ) -> Result<bool, ApiError> {
        let found: Option<(i32,)> =
            sqlx::query_as(r#"SELECT id FROM login."user" WHERE username = $1 AND id <> $2"#)
                .bind(username)
                .bind(self_id)
                .fetch_optional(db)
                .await?;
        Ok(found.is_some())
    }

    pub async fn email_taken_by_other(
        db: &PgPool,
        email: &str,
        self_id: i32,
    ) -> Result<bool, ApiError> {
        let found: Option<(i32,)> =
            sqlx::query_as(r#"SELECT id FROM login."user" WHERE email = $1 AND id <> $2"#)
                .bind(email)
                .bind(self_id)
                .fetch_optional(db)
                .await?;
        Ok(found.is_some())
    }

    pub async fn list(db: &PgPool, skip: i64, limit: i64) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM login."user"
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Partial update; absent fields keep their stored value. Always
    /// refreshes `updated_at`.
    pub async fn update(
        db: &PgPool,
        id: i32,
        username: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE login."user"
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: i32) -> Result<(), ApiError> {
        let result = sqlx::query(r#"DELETE FROM login."user" WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("user not found".into()));
        }
        Ok(())
    }
}
