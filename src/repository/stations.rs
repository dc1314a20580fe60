//! Stations repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::station::Station,
};

#[derive(Clone)]
pub struct StationsRepository {
    pool: Pool<Postgres>,
}

impl StationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get station by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Station> {
        sqlx::query_as::<_, Station>("SELECT * FROM stations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Station with id {} not found", id)))
    }
}
