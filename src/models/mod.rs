//! Domain models and DTOs

pub mod booking;
pub mod enums;
pub mod payment;
pub mod station;
pub mod user;
pub mod vehicle;
