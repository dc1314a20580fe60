//! Business logic services

pub mod bookings;
pub mod gateway;
pub mod payments;
pub mod vehicles;

use std::sync::Arc;

use crate::{config::MomoConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub bookings: bookings::BookingsService,
    pub payments: payments::PaymentsService,
    pub vehicles: vehicles::VehiclesService,
    /// Kept for cross-cutting probes (readiness check)
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository and gateway config
    pub fn new(repository: Repository, momo_config: MomoConfig) -> AppResult<Self> {
        let gateway: Arc<dyn gateway::PaymentGateway> =
            Arc::new(gateway::MomoGateway::new(momo_config)?);

        Ok(Self {
            bookings: bookings::BookingsService::new(repository.clone(), gateway.clone()),
            payments: payments::PaymentsService::new(repository.clone(), gateway),
            vehicles: vehicles::VehiclesService::new(repository.clone()),
            repository,
        })
    }
}
