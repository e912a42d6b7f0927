use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;

/// Customer record in the `sales.customer` table. Customers carry no
/// ownership link to a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub update: Option<OffsetDateTime>,
}

impl Customer {
    pub async fn create(
        db: &PgPool,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<Customer, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO sales.customer (first_name, last_name, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING customer_id, first_name, last_name, phone, address, created_at, "update"
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(address)
        .fetch_one(db)
        .await?;
        Ok(customer)
    }

    pub async fn list(db: &PgPool, skip: i64, limit: i64) -> Result<Vec<Customer>, ApiError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, first_name, last_name, phone, address, created_at, "update"
            FROM sales.customer
            ORDER BY customer_id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(customers)
    }

    pub async fn find_by_id(db: &PgPool, id: i32) -> Result<Option<Customer>, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, first_name, last_name, phone, address, created_at, "update"
            FROM sales.customer
            WHERE customer_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(customer)
    }

    /// Partial update; sets the `"update"` timestamp. Callers skip this
    /// entirely for an empty update set.
    pub async fn update(
        db: &PgPool,
        id: i32,
        first_name: Option<&str>,
        last_name: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<Customer, ApiError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE sales.customer
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                "update" = NOW()
            WHERE customer_id = $1
            RETURNING customer_id, first_name, last_name, phone, address, created_at, "update"
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(address)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("customer not found".into()))?;
        Ok(customer)
    }

    pub async fn delete(db: &PgPool, id: i32) -> Result<(), ApiError> {
        let result = sqlx::query(r#"DELETE FROM sales.customer WHERE customer_id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("customer not found".into()));
        }
        Ok(())
    }
}
