//! Payments repository for database operations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::PaymentStatus,
        payment::Payment,
    },
};

/// New payment row for a deposit or remainder charge
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub processed_by: Option<Uuid>,
}

#[derive(Clone)]
pub struct PaymentsRepository {
    pool: Pool<Postgres>,
}

impl PaymentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get payment by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment with id {} not found", id)))
    }

    /// Get payments for a booking, oldest first (deposit before remainder)
    pub async fn list_by_booking(&self, booking_id: Uuid) -> AppResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    /// Get payment by gateway transaction id
    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Payment with transaction id {} not found",
                    transaction_id
                ))
            })
    }

    /// Get payment by gateway transaction id with a row lock. Used by the
    /// callback path so concurrent duplicate deliveries serialize.
    pub async fn get_by_transaction_id_for_update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        transaction_id: &str,
    ) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE transaction_id = $1 FOR UPDATE",
        )
        .bind(transaction_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Payment with transaction id {} not found",
                transaction_id
            ))
        })
    }

    /// Insert a new payment in PENDING
    pub async fn insert(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        new: &NewPayment,
    ) -> AppResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (booking_id, amount, payment_method, status, processed_by)
            VALUES ($1, $2, 'MOMO', 'PENDING', $3)
            RETURNING *
            "#,
        )
        .bind(new.booking_id)
        .bind(new.amount)
        .bind(new.processed_by)
        .fetch_one(&mut **tx)
        .await?;
        Ok(payment)
    }

    /// Stamp the gateway order id once the gateway accepts the request
    pub async fn set_transaction_id(&self, id: Uuid, transaction_id: &str) -> AppResult<()> {
        sqlx::query("UPDATE payments SET transaction_id = $1 WHERE id = $2")
            .bind(transaction_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark a payment FAILED after a gateway rejection
    pub async fn mark_failed(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE payments SET status = $1 WHERE id = $2")
            .bind(PaymentStatus::Failed)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark a payment FAILED inside a callback transaction
    pub async fn mark_failed_tx(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("UPDATE payments SET status = $1 WHERE id = $2")
            .bind(PaymentStatus::Failed)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Settle a payment: status advanced, paid_at stamped
    pub async fn mark_settled(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
        status: PaymentStatus,
        paid_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE payments SET status = $1, paid_at = $2 WHERE id = $3")
            .bind(status)
            .bind(paid_at)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
