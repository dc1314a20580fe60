//! Booking model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enums::{BookingStatus, PaymentStatus};
use super::payment::GatewayResponse;

/// Booking model from database.
///
/// `total_amount == base_price + deposit_paid + extra_fee` holds after
/// every mutation. `actual_end_time` is immutable once set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub renter_id: Uuid,
    pub vehicle_id: Uuid,
    pub station_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub expected_end_time: DateTime<Utc>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    pub checked_out_by: Uuid,
    pub checked_in_by: Option<Uuid>,
    pub base_price: Decimal,
    pub deposit_paid: Decimal,
    pub extra_fee: Decimal,
    pub total_amount: Decimal,
    pub pickup_note: Option<String>,
    pub return_note: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create booking request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub station_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub expected_end_time: DateTime<Utc>,
    #[validate(length(max = 2000))]
    pub pickup_note: Option<String>,
}

/// Partial booking update (staff/admin). `extra_fee` changes recompute the
/// total; `actual_end_time` cannot be overwritten once set.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub expected_end_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub extra_fee: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub pickup_note: Option<String>,
    #[validate(length(max = 2000))]
    pub return_note: Option<String>,
}

/// New booking row, validated and priced, ready for insertion
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_code: String,
    pub renter_id: Uuid,
    pub vehicle_id: Uuid,
    pub station_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub expected_end_time: DateTime<Utc>,
    pub checked_out_by: Uuid,
    pub base_price: Decimal,
    pub total_amount: Decimal,
    pub pickup_note: Option<String>,
}

/// Booking together with the gateway response for the charge issued during
/// the operation. `gateway` is None when the charge could not be submitted
/// (unknown outcome, payment left pending).
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingWithPayment {
    #[serde(flatten)]
    pub booking: Booking,
    pub gateway: Option<GatewayResponse>,
}
