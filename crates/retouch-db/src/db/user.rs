//! Repository for user credit balances
//!
//! Users themselves are provisioned by the identity provider's webhook; this
//! repository only reads and adjusts the credit counter.

use retouch_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %user_id))]
    pub async fn get_credit_balance(&self, user_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<Postgres, i64>("SELECT credit_balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Add `fee` (usually negative) to the balance and return the new balance.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %user_id))]
    pub async fn update_credits(&self, user_id: Uuid, fee: i64) -> Result<i64, AppError> {
        let balance = sqlx::query_scalar::<Postgres, i64>(
            r#"
            UPDATE users
            SET credit_balance = credit_balance + $1, updated_at = NOW()
            WHERE id = $2
            RETURNING credit_balance
            "#,
        )
        .bind(fee)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::debug!(user_id = %user_id, fee, balance, "Credits updated");
        Ok(balance)
    }
}
