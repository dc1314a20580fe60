//! Shared domain enums

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Ongoing,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Statuses that keep a vehicle's time window occupied. CANCELLED and
    /// COMPLETED bookings free the window.
    pub fn occupies_vehicle(self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Whether a forward transition to `next` is legal. Status moves only
    /// forward, except into CANCELLED from any non-terminal state.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match (self, next) {
            (Pending, Confirmed) => true,
            (Confirmed, Ongoing) => true,
            (Ongoing, Completed) => true,
            (Pending | Confirmed | Ongoing, Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Ongoing => "ONGOING",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// PaymentStatus
// ---------------------------------------------------------------------------

/// Payment state, shared by Payment rows and the Booking payment summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    PartiallyPaid,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// A settled payment has already been credited; applying the same
    /// gateway callback again must be a no-op.
    pub fn is_settled(self) -> bool {
        matches!(self, PaymentStatus::PartiallyPaid | PaymentStatus::Paid)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::PartiallyPaid => "PARTIALLY_PAID",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// VehicleStatus
// ---------------------------------------------------------------------------

/// Vehicle fleet status. RENTED is maintained by booking transitions, not
/// derived live from bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "vehicle_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
    Charging,
    Unavailable,
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::Rented => "RENTED",
            VehicleStatus::Maintenance => "MAINTENANCE",
            VehicleStatus::Charging => "CHARGING",
            VehicleStatus::Unavailable => "UNAVAILABLE",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// FuelType
// ---------------------------------------------------------------------------

/// Vehicle fuel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "fuel_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Electric,
    Hybrid,
    Gasoline,
}

// ---------------------------------------------------------------------------
// PaymentMethod
// ---------------------------------------------------------------------------

/// Payment method. Only the MoMo wallet gateway is wired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Momo,
}

// ---------------------------------------------------------------------------
// UserRole
// ---------------------------------------------------------------------------

/// Caller role carried in JWT claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Renter,
    Staff,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Ongoing));
        assert!(BookingStatus::Ongoing.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Pending));
        assert!(!BookingStatus::Ongoing.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Ongoing));
    }

    #[test]
    fn test_cancel_reachable_from_non_terminal_only() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Ongoing.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn test_occupying_statuses() {
        assert!(BookingStatus::Pending.occupies_vehicle());
        assert!(BookingStatus::Confirmed.occupies_vehicle());
        assert!(BookingStatus::Ongoing.occupies_vehicle());
        assert!(!BookingStatus::Completed.occupies_vehicle());
        assert!(!BookingStatus::Cancelled.occupies_vehicle());
    }

    #[test]
    fn test_settled_payment_statuses() {
        assert!(PaymentStatus::Paid.is_settled());
        assert!(PaymentStatus::PartiallyPaid.is_settled());
        assert!(!PaymentStatus::Pending.is_settled());
        assert!(!PaymentStatus::Failed.is_settled());
    }
}
