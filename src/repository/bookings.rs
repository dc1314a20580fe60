//! Bookings repository for database operations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, NewBooking},
        enums::{BookingStatus, PaymentStatus},
    },
};

/// Postgres error codes that signal the storage-level booking-overlap
/// guard fired: the exclusion constraint on active booking windows, or the
/// unique booking code.
const EXCLUSION_VIOLATION: &str = "23P01";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get booking by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    /// Get booking by ID with a row lock inside a transition transaction
    pub async fn get_by_id_for_update(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
    ) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    /// Get booking by its human-readable code
    pub async fn get_by_code(&self, code: &str) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with code {} not found", code)))
    }

    /// Get bookings for a renter, newest first
    pub async fn list_by_renter(&self, renter_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE renter_id = $1 ORDER BY created_at DESC",
        )
        .bind(renter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Get bookings in a given status
    pub async fn list_by_status(&self, status: BookingStatus) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Get bookings for a vehicle
    pub async fn list_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE vehicle_id = $1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Get bookings at a station
    pub async fn list_by_station(&self, station_id: Uuid) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE station_id = $1 ORDER BY created_at DESC",
        )
        .bind(station_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Whether an active booking on the vehicle overlaps `[start, end)`.
    /// Half-open semantics: `b.start < end AND b.expected_end > start`.
    /// CANCELLED and COMPLETED bookings have freed their window.
    pub async fn has_conflict(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        vehicle_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM bookings
                WHERE vehicle_id = $1
                  AND status NOT IN ('CANCELLED', 'COMPLETED')
                  AND start_time < $3
                  AND expected_end_time > $2
            )
            "#,
        )
        .bind(vehicle_id)
        .bind(start_time)
        .bind(end_time)
        .fetch_one(&mut **tx)
        .await?;
        Ok(exists)
    }

    /// Insert a new booking in PENDING. The advisory conflict check runs
    /// before this inside the same transaction; the exclusion constraint
    /// on active windows is the hard backstop, surfaced as StateConflict.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        new: &NewBooking,
    ) -> AppResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                booking_code, renter_id, vehicle_id, station_id,
                start_time, expected_end_time, status, checked_out_by,
                base_price, deposit_paid, extra_fee, total_amount,
                pickup_note, payment_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING', $7, $8, 0, 0, $9, $10, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(&new.booking_code)
        .bind(new.renter_id)
        .bind(new.vehicle_id)
        .bind(new.station_id)
        .bind(new.start_time)
        .bind(new.expected_end_time)
        .bind(new.checked_out_by)
        .bind(new.base_price)
        .bind(new.total_amount)
        .bind(new.pickup_note.as_deref())
        .fetch_one(&mut **tx)
        .await
        .map_err(map_overlap_error)?;

        Ok(booking)
    }

    /// Move a booking to a new status
    pub async fn set_status(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
        status: BookingStatus,
    ) -> AppResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(booking)
    }

    /// Close out a booking at checkout: COMPLETED, actual end stamped,
    /// settlement figures written, staff identity recorded.
    #[allow(clippy::too_many_arguments)]
    pub async fn complete(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
        actual_end_time: DateTime<Utc>,
        checked_in_by: Uuid,
        extra_fee: Decimal,
        total_amount: Decimal,
        return_note: Option<&str>,
    ) -> AppResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'COMPLETED',
                actual_end_time = $2,
                checked_in_by = $3,
                extra_fee = $4,
                total_amount = $5,
                return_note = COALESCE($6, return_note),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(actual_end_time)
        .bind(checked_in_by)
        .bind(extra_fee)
        .bind(total_amount)
        .bind(return_note)
        .fetch_one(&mut **tx)
        .await?;
        Ok(booking)
    }

    /// Record a settled deposit on the booking: deposit amount credited,
    /// total recomputed, payment status advanced.
    pub async fn apply_deposit(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
        deposit_paid: Decimal,
    ) -> AppResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET deposit_paid = $2,
                total_amount = base_price + $2 + extra_fee,
                payment_status = 'PARTIALLY_PAID',
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(deposit_paid)
        .fetch_one(&mut **tx)
        .await?;
        Ok(booking)
    }

    /// Advance the booking's payment summary status
    pub async fn set_payment_status(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> AppResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET payment_status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(payment_status)
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(booking)
    }

    /// Staff patch of booking fields. `extra_fee` changes recompute the
    /// total; `actual_end_time` is only written if still unset.
    pub async fn update_fields(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
        start_time: Option<DateTime<Utc>>,
        expected_end_time: Option<DateTime<Utc>>,
        actual_end_time: Option<DateTime<Utc>>,
        extra_fee: Option<Decimal>,
        pickup_note: Option<&str>,
        return_note: Option<&str>,
    ) -> AppResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET start_time = COALESCE($2, start_time),
                expected_end_time = COALESCE($3, expected_end_time),
                actual_end_time = COALESCE(actual_end_time, $4),
                extra_fee = COALESCE($5, extra_fee),
                total_amount = base_price + deposit_paid + COALESCE($5, extra_fee),
                pickup_note = COALESCE($6, pickup_note),
                return_note = COALESCE($7, return_note),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(start_time)
        .bind(expected_end_time)
        .bind(actual_end_time)
        .bind(extra_fee)
        .bind(pickup_note)
        .bind(return_note)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_overlap_error)?;
        Ok(booking)
    }

    /// Administrative delete; payments cascade in the schema
    pub async fn delete(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

/// Translate the storage-level overlap/uniqueness guards into the typed
/// state-conflict error the caller expects.
fn map_overlap_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        match db_err.code().as_deref() {
            Some(EXCLUSION_VIOLATION) => {
                return AppError::StateConflict(
                    "Vehicle already has a booking overlapping this window".to_string(),
                )
            }
            Some(UNIQUE_VIOLATION) => {
                return AppError::StateConflict("Booking code already exists".to_string())
            }
            _ => {}
        }
    }
    AppError::Database(e)
}
