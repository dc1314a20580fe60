//! Booking lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, BookingWithPayment, CreateBookingRequest, UpdateBookingRequest},
        enums::BookingStatus,
        payment::GatewayResponse,
    },
};

use super::{require_admin, require_staff, AuthenticatedUser};

/// Booking list filter
#[derive(Deserialize, ToSchema)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub vehicle_id: Option<Uuid>,
    pub station_id: Option<Uuid>,
}

/// Complete-booking request body
#[derive(Deserialize, Validate, ToSchema)]
pub struct CompleteBookingRequest {
    #[validate(length(max = 2000))]
    pub return_note: Option<String>,
}

/// Create a new booking with its deposit charge
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingWithPayment),
        (status = 400, description = "Missing license or invalid time window"),
        (status = 409, description = "Vehicle unavailable or window conflict")
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(request): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingWithPayment>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let booking = state.services.bookings.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Get a booking by ID
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking detail", body = Booking),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.get_by_id(booking_id).await?;
    Ok(Json(booking))
}

/// Get a booking by its human-readable code
#[utoipa::path(
    get,
    path = "/bookings/code/{code}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Booking code")),
    responses(
        (status = 200, description = "Booking detail", body = Booking),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking_by_code(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.get_by_code(&code).await?;
    Ok(Json(booking))
}

/// Get the caller's bookings
#[utoipa::path(
    get,
    path = "/bookings/my",
    tag = "bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's bookings", body = Vec<Booking>)
    )
)]
pub async fn my_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = state.services.bookings.my_bookings(&caller).await?;
    Ok(Json(bookings))
}

/// List bookings filtered by status, vehicle or station (staff)
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<BookingStatus>, Query, description = "Filter by status"),
        ("vehicle_id" = Option<Uuid>, Query, description = "Filter by vehicle"),
        ("station_id" = Option<Uuid>, Query, description = "Filter by station")
    ),
    responses(
        (status = 200, description = "Matching bookings", body = Vec<Booking>)
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    require_staff(&caller)?;

    let bookings = if let Some(vehicle_id) = query.vehicle_id {
        state.services.bookings.list_by_vehicle(vehicle_id).await?
    } else if let Some(station_id) = query.station_id {
        state.services.bookings.list_by_station(station_id).await?
    } else if let Some(status) = query.status {
        state.services.bookings.list_by_status(status).await?
    } else {
        return Err(AppError::BadRequest(
            "One of status, vehicle_id or station_id is required".to_string(),
        ));
    };
    Ok(Json(bookings))
}

/// Confirm a pending booking (staff)
#[utoipa::path(
    post,
    path = "/bookings/{id}/confirm",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking confirmed", body = Booking),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not pending")
    )
)]
pub async fn confirm_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    require_staff(&caller)?;
    let booking = state.services.bookings.confirm(booking_id).await?;
    Ok(Json(booking))
}

/// Start a confirmed booking, marking the vehicle RENTED (staff)
#[utoipa::path(
    post,
    path = "/bookings/{id}/start",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking started", body = Booking),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not confirmed")
    )
)]
pub async fn start_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    require_staff(&caller)?;
    let booking = state.services.bookings.start(booking_id).await?;
    Ok(Json(booking))
}

/// Complete an ongoing booking and request the remainder charge (staff)
#[utoipa::path(
    post,
    path = "/bookings/{id}/complete",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = CompleteBookingRequest,
    responses(
        (status = 200, description = "Booking completed", body = BookingWithPayment),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not ongoing")
    )
)]
pub async fn complete_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CompleteBookingRequest>,
) -> AppResult<Json<BookingWithPayment>> {
    require_staff(&caller)?;
    let booking = state
        .services
        .bookings
        .complete(&caller, booking_id, request.return_note, Utc::now())
        .await?;
    Ok(Json(booking))
}

/// Cancel a booking from any non-terminal state
#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking already completed or cancelled")
    )
)]
pub async fn cancel_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.cancel(booking_id).await?;
    Ok(Json(booking))
}

/// Deferred remainder settlement by the booking's renter
#[utoipa::path(
    post,
    path = "/bookings/{id}/pay-remainder",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Charge requested", body = GatewayResponse),
        (status = 202, description = "Charge outcome pending"),
        (status = 403, description = "Caller is not the renter"),
        (status = 409, description = "Booking is not completed")
    )
)]
pub async fn pay_remainder(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Option<GatewayResponse>>)> {
    let response = state
        .services
        .bookings
        .pay_remainder(&caller, booking_id, Utc::now())
        .await?;

    // An unknown gateway outcome is accepted-pending, not a failure
    let status = if response.is_some() {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    Ok((status, Json(response)))
}

/// Patch booking fields (staff)
#[utoipa::path(
    put,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking updated", body = Booking),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn update_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateBookingRequest>,
) -> AppResult<Json<Booking>> {
    require_staff(&caller)?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let booking = state.services.bookings.update(booking_id, request).await?;
    Ok(Json(booking))
}

/// Delete a booking, releasing its vehicle (admin)
#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&caller)?;
    state.services.bookings.delete(booking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
