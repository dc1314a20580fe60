//! Payment reconciliation against gateway callbacks.
//!
//! Callbacks arrive asynchronously, possibly duplicated, possibly out of
//! order with the local persistence of the outgoing charge. Application is
//! idempotent on the transaction id: a payment that already settled is
//! never credited twice.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        enums::PaymentStatus,
        payment::{MomoCallback, Payment},
    },
    repository::Repository,
    services::gateway::PaymentGateway,
};

/// What a verified callback should do to the located payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackAction {
    /// Duplicate delivery for an already-settled payment; no state change
    Ignore,
    /// Deposit settled: payment PARTIALLY_PAID, booking credited
    SettleDeposit,
    /// Remainder settled: payment PAID, booking payment status PAID
    SettleRemainder,
    /// Gateway reported failure; booking payment status untouched
    Fail,
}

fn decide(
    status: PaymentStatus,
    paid_at: Option<DateTime<Utc>>,
    result_code: &str,
    is_deposit: bool,
) -> CallbackAction {
    if status.is_settled() && paid_at.is_some() {
        return CallbackAction::Ignore;
    }
    if result_code != "0" {
        return CallbackAction::Fail;
    }
    if is_deposit {
        CallbackAction::SettleDeposit
    } else {
        CallbackAction::SettleRemainder
    }
}

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentsService {
    pub fn new(repository: Repository, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { repository, gateway }
    }

    /// Verify and apply a gateway callback.
    ///
    /// Signature mismatch rejects the callback before any lookup. An
    /// unknown order id is a NotFound; the gateway's own retry policy
    /// covers the window where the outgoing charge is not yet visible.
    /// The payment row is locked for the duration so concurrent duplicate
    /// deliveries serialize and the second one sees the settled state.
    pub async fn process_callback(&self, callback: MomoCallback) -> AppResult<()> {
        tracing::info!(
            "Processing gateway callback - orderId: {}, resultCode: {}",
            callback.order_id,
            callback.result_code
        );

        self.gateway.verify_callback(&callback)?;

        let mut tx = self.repository.begin().await?;
        let payment = self
            .repository
            .payments
            .get_by_transaction_id_for_update(&mut tx, &callback.order_id)
            .await?;

        match decide(
            payment.status,
            payment.paid_at,
            &callback.result_code,
            callback.is_deposit(),
        ) {
            CallbackAction::Ignore => {
                tracing::info!(
                    "Duplicate callback for settled payment - orderId: {}, transId: {}",
                    callback.order_id,
                    callback.trans_id
                );
                return Ok(());
            }
            CallbackAction::SettleDeposit => {
                let now = Utc::now();
                self.repository
                    .payments
                    .mark_settled(&mut tx, payment.id, PaymentStatus::PartiallyPaid, now)
                    .await?;
                let booking = self
                    .repository
                    .bookings
                    .apply_deposit(&mut tx, payment.booking_id, payment.amount)
                    .await?;
                tracing::info!(
                    "Deposit settled - booking: {}, amount: {}",
                    booking.booking_code,
                    payment.amount
                );
            }
            CallbackAction::SettleRemainder => {
                let now = Utc::now();
                self.repository
                    .payments
                    .mark_settled(&mut tx, payment.id, PaymentStatus::Paid, now)
                    .await?;
                let booking = self
                    .repository
                    .bookings
                    .set_payment_status(&mut tx, payment.booking_id, PaymentStatus::Paid)
                    .await?;
                tracing::info!(
                    "Remainder settled - booking: {}, amount: {}",
                    booking.booking_code,
                    payment.amount
                );
            }
            CallbackAction::Fail => {
                self.repository.payments.mark_failed_tx(&mut tx, payment.id).await?;
                tracing::warn!(
                    "Payment failed - orderId: {}, resultCode: {}, message: {}",
                    callback.order_id,
                    callback.result_code,
                    callback.message
                );
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get payment by ID
    pub async fn get_by_id(&self, payment_id: Uuid) -> AppResult<Payment> {
        self.repository.payments.get_by_id(payment_id).await
    }

    /// Get payments for a booking
    pub async fn list_by_booking(&self, booking_id: Uuid) -> AppResult<Vec<Payment>> {
        self.repository.bookings.get_by_id(booking_id).await?;
        self.repository.payments.list_by_booking(booking_id).await
    }

    /// Get payment by gateway transaction id
    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> AppResult<Payment> {
        self.repository.payments.get_by_transaction_id(transaction_id).await
    }
}
