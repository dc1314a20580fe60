//! Vehicle availability endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::vehicle::{AvailableVehiclesQuery, Vehicle},
};

use super::AuthenticatedUser;

/// Get a vehicle by ID
#[utoipa::path(
    get,
    path = "/vehicles/{id}",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle detail", body = Vehicle),
        (status = 404, description = "Vehicle not found")
    )
)]
pub async fn get_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<Json<Vehicle>> {
    let vehicle = state.services.vehicles.get_by_id(vehicle_id).await?;
    Ok(Json(vehicle))
}

/// Vehicles at a station with no booking conflicting with the window,
/// best-rated first
#[utoipa::path(
    get,
    path = "/vehicles/available",
    tag = "vehicles",
    params(
        ("station_id" = Uuid, Query, description = "Station ID"),
        ("fuel_type" = Option<String>, Query, description = "Fuel type filter"),
        ("start_time" = String, Query, description = "Window start (RFC 3339)"),
        ("end_time" = String, Query, description = "Window end (RFC 3339)")
    ),
    responses(
        (status = 200, description = "Available vehicles", body = Vec<Vehicle>),
        (status = 400, description = "Invalid window"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn available_vehicles(
    State(state): State<crate::AppState>,
    Query(query): Query<AvailableVehiclesQuery>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let vehicles = state
        .services
        .vehicles
        .find_truly_available(
            query.station_id,
            query.fuel_type,
            query.start_time,
            query.end_time,
        )
        .await?;
    Ok(Json(vehicles))
}
