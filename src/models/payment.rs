//! Payment model and MoMo gateway wire types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{PaymentMethod, PaymentStatus};

/// Payment model from database. A booking owns at most two payments over
/// its lifetime: the deposit, then the remainder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    /// Gateway order id; None until the gateway accepts the request
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Identity that triggered the charge (renter or staff)
    pub processed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Response body from the MoMo payment-creation endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    /// "0" means the charge request was accepted
    pub result_code: String,
    pub message: Option<String>,
    pub pay_url: Option<String>,
    pub order_id: String,
    pub amount: Option<i64>,
    pub response_time: Option<i64>,
}

impl GatewayResponse {
    pub fn is_accepted(&self) -> bool {
        self.result_code == "0"
    }
}

/// Signed IPN callback from the MoMo gateway.
///
/// `extra_data` echoes the deposit flag threaded through the creation
/// request; it is the only way the callback path can tell which payment
/// position (deposit vs remainder) the order settles.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MomoCallback {
    pub partner_code: String,
    pub order_id: String,
    pub request_id: String,
    pub amount: i64,
    pub order_info: String,
    pub order_type: String,
    pub trans_id: i64,
    pub result_code: String,
    pub message: String,
    pub pay_type: String,
    pub response_time: i64,
    #[serde(default)]
    pub extra_data: Option<String>,
    pub signature: String,
}

impl MomoCallback {
    /// Deposit flag carried through the gateway's opaque extraData field
    pub fn is_deposit(&self) -> bool {
        self.extra_data
            .as_deref()
            .map(|d| d.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}
