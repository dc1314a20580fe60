//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{bookings, health, payments, vehicles};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EV Rental API",
        version = "1.0.0",
        description = "Electric vehicle rental backend REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Bookings
        bookings::create_booking,
        bookings::get_booking,
        bookings::get_booking_by_code,
        bookings::my_bookings,
        bookings::list_bookings,
        bookings::confirm_booking,
        bookings::start_booking,
        bookings::complete_booking,
        bookings::cancel_booking,
        bookings::pay_remainder,
        bookings::update_booking,
        bookings::delete_booking,
        // Payments
        payments::momo_callback,
        payments::get_payment,
        payments::get_booking_payments,
        payments::get_payment_by_transaction,
        // Vehicles
        vehicles::get_vehicle,
        vehicles::available_vehicles,
    ),
    components(
        schemas(
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingWithPayment,
            crate::models::booking::CreateBookingRequest,
            crate::models::booking::UpdateBookingRequest,
            bookings::BookingListQuery,
            bookings::CompleteBookingRequest,
            // Payments
            crate::models::payment::Payment,
            crate::models::payment::GatewayResponse,
            crate::models::payment::MomoCallback,
            // Vehicles
            crate::models::vehicle::Vehicle,
            crate::models::vehicle::AvailableVehiclesQuery,
            crate::models::station::Station,
            crate::models::user::User,
            // Enums
            crate::models::enums::BookingStatus,
            crate::models::enums::PaymentStatus,
            crate::models::enums::VehicleStatus,
            crate::models::enums::FuelType,
            crate::models::enums::PaymentMethod,
            crate::models::enums::UserRole,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "bookings", description = "Booking lifecycle management"),
        (name = "payments", description = "Payments and gateway callbacks"),
        (name = "vehicles", description = "Vehicle availability")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
