//! Vehicle availability service

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::FuelType,
        vehicle::Vehicle,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct VehiclesService {
    repository: Repository,
}

impl VehiclesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get vehicle by ID
    pub async fn get_by_id(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        self.repository.vehicles.get_by_id(vehicle_id).await
    }

    /// Vehicles at a station free of conflicting bookings over the window
    pub async fn find_truly_available(
        &self,
        station_id: Uuid,
        fuel_type: Option<FuelType>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> AppResult<Vec<Vehicle>> {
        if start_time >= end_time {
            return Err(AppError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }
        self.repository.stations.get_by_id(station_id).await?;
        self.repository
            .vehicles
            .find_truly_available(station_id, fuel_type, start_time, end_time)
            .await
    }
}
