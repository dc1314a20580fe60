//! EV Rental Server - Vehicle Rental Backend
//!
//! REST API server for electric vehicle rental with MoMo payments.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evrental_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("evrental_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting EV Rental Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services =
        Services::new(repository, config.momo.clone()).expect("Failed to create services");

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Bookings
        .route("/bookings", get(api::bookings::list_bookings))
        .route("/bookings", post(api::bookings::create_booking))
        .route("/bookings/my", get(api::bookings::my_bookings))
        .route("/bookings/code/:code", get(api::bookings::get_booking_by_code))
        .route("/bookings/:id", get(api::bookings::get_booking))
        .route("/bookings/:id", put(api::bookings::update_booking))
        .route("/bookings/:id", delete(api::bookings::delete_booking))
        .route("/bookings/:id/confirm", post(api::bookings::confirm_booking))
        .route("/bookings/:id/start", post(api::bookings::start_booking))
        .route("/bookings/:id/complete", post(api::bookings::complete_booking))
        .route("/bookings/:id/cancel", post(api::bookings::cancel_booking))
        .route("/bookings/:id/pay-remainder", post(api::bookings::pay_remainder))
        .route("/bookings/:id/payments", get(api::payments::get_booking_payments))
        // Payments
        .route("/payments/momo/callback", post(api::payments::momo_callback))
        .route(
            "/payments/transaction/:transaction_id",
            get(api::payments::get_payment_by_transaction),
        )
        .route("/payments/:id", get(api::payments::get_payment))
        // Vehicles
        .route("/vehicles/available", get(api::vehicles::available_vehicles))
        .route("/vehicles/:id", get(api::vehicles::get_vehicle))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
