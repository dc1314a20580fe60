//! Payment endpoints and the gateway IPN callback

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::payment::{MomoCallback, Payment},
};

use super::AuthenticatedUser;

/// Gateway IPN callback. Unauthenticated: trust comes from the HMAC
/// signature, verified before any state is touched.
#[utoipa::path(
    post,
    path = "/payments/momo/callback",
    tag = "payments",
    request_body = MomoCallback,
    responses(
        (status = 204, description = "Callback applied or duplicate ignored"),
        (status = 400, description = "Invalid signature"),
        (status = 404, description = "Unknown order id")
    )
)]
pub async fn momo_callback(
    State(state): State<crate::AppState>,
    Json(callback): Json<MomoCallback>,
) -> AppResult<StatusCode> {
    state.services.payments.process_callback(callback).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment detail", body = Payment),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn get_payment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    let payment = state.services.payments.get_by_id(payment_id).await?;
    Ok(Json(payment))
}

/// Get the payments of a booking (deposit first, then remainder)
#[utoipa::path(
    get,
    path = "/bookings/{id}/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Payments for the booking", body = Vec<Payment>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking_payments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Vec<Payment>>> {
    let payments = state.services.payments.list_by_booking(booking_id).await?;
    Ok(Json(payments))
}

/// Get a payment by gateway transaction id
#[utoipa::path(
    get,
    path = "/payments/transaction/{transaction_id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("transaction_id" = String, Path, description = "Gateway transaction ID")),
    responses(
        (status = 200, description = "Payment detail", body = Payment),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn get_payment_by_transaction(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(transaction_id): Path<String>,
) -> AppResult<Json<Payment>> {
    let payment = state
        .services
        .payments
        .get_by_transaction_id(&transaction_id)
        .await?;
    Ok(Json(payment))
}
