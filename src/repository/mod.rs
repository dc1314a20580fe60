//! Repository layer for database operations

pub mod bookings;
pub mod payments;
pub mod stations;
pub mod users;
pub mod vehicles;

use sqlx::{Pool, Postgres, Transaction};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub vehicles: vehicles::VehiclesRepository,
    pub bookings: bookings::BookingsRepository,
    pub payments: payments::PaymentsRepository,
    pub users: users::UsersRepository,
    pub stations: stations::StationsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            vehicles: vehicles::VehiclesRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            payments: payments::PaymentsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            stations: stations::StationsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open a transaction scope. Every booking transition runs its local
    /// writes inside one of these; gateway calls happen after commit.
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Round-trip to the database, for the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
