//! Vehicles repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{FuelType, VehicleStatus},
        vehicle::Vehicle,
    },
};

#[derive(Clone)]
pub struct VehiclesRepository {
    pool: Pool<Postgres>,
}

impl VehiclesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get vehicle by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle with id {} not found", id)))
    }

    /// Get vehicle by ID with a row lock, serializing concurrent booking
    /// attempts on the same vehicle within the enclosing transaction.
    pub async fn get_by_id_for_update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
    ) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle with id {} not found", id)))
    }

    /// Set vehicle status inside the transaction of the booking transition
    /// that causes it.
    pub async fn set_status(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
        status: VehicleStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE vehicles SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Release a vehicle at checkout: back to AVAILABLE, rent count bumped
    pub async fn release_after_rental(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE vehicles SET status = $1, rent_count = rent_count + 1, updated_at = NOW() WHERE id = $2",
        )
        .bind(VehicleStatus::Available)
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Vehicles at a station with no booking whose active window overlaps
    /// `[start_time, end_time)`. Ordered by rating (nulls last), then by
    /// historical rent count.
    pub async fn find_truly_available(
        &self,
        station_id: Uuid,
        fuel_type: Option<FuelType>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT v.*
            FROM vehicles v
            WHERE v.station_id = $1
              AND ($2::fuel_type IS NULL OR v.fuel_type = $2)
              AND NOT EXISTS (
                  SELECT 1
                  FROM bookings b
                  WHERE b.vehicle_id = v.id
                    AND b.status NOT IN ('CANCELLED', 'COMPLETED')
                    AND b.start_time < $4
                    AND b.expected_end_time > $3
              )
            ORDER BY v.rating DESC NULLS LAST, v.rent_count DESC
            "#,
        )
        .bind(station_id)
        .bind(fuel_type)
        .bind(start_time)
        .bind(end_time)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }
}
