//! Vehicle model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{FuelType, VehicleStatus};

/// Vehicle model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vehicle {
    pub id: Uuid,
    pub station_id: Uuid,
    pub license_plate: String,
    pub name: String,
    pub brand: Option<String>,
    pub fuel_type: FuelType,
    pub rating: Option<Decimal>,
    pub capacity: Option<i32>,
    pub rent_count: i32,
    pub status: VehicleStatus,
    pub hourly_rate: Decimal,
    pub daily_rate: Decimal,
    pub deposit_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Query parameters for the truly-available vehicle search
#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailableVehiclesQuery {
    pub station_id: Uuid,
    pub fuel_type: Option<FuelType>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
