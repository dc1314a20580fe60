//! Pricing and settlement calculator.
//!
//! Pure, deterministic, no I/O. All monetary values are fixed-point
//! [`Decimal`]; floats never enter the arithmetic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Multiplier applied to the hourly rate for every whole hour of lateness
const LATE_FEE_MULTIPLIER: Decimal = dec!(1.5);

/// Whole hours between two instants. Fractions of an hour are dropped.
pub fn rental_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_hours()
}

/// Base rental price for the window `[start, expected_end)`.
///
/// Up to 24 whole hours the hourly rate applies; beyond that, full days
/// are billed at the daily rate and the remaining hours at the hourly
/// rate.
pub fn base_price(
    hourly_rate: Decimal,
    daily_rate: Decimal,
    start: DateTime<Utc>,
    expected_end: DateTime<Utc>,
) -> Decimal {
    let hours = rental_hours(start, expected_end);
    if hours <= 24 {
        hourly_rate * Decimal::from(hours)
    } else {
        let days = hours / 24;
        let remainder = hours % 24;
        daily_rate * Decimal::from(days) + hourly_rate * Decimal::from(remainder)
    }
}

/// Late-return fee: `hourly_rate * whole_late_hours * 1.5`.
///
/// Zero when the vehicle is back on time or less than one whole hour
/// late.
pub fn late_fee(
    hourly_rate: Decimal,
    expected_end: DateTime<Utc>,
    actual_end: DateTime<Utc>,
) -> Decimal {
    if actual_end <= expected_end {
        return Decimal::ZERO;
    }
    let late_hours = (actual_end - expected_end).num_hours();
    if late_hours <= 0 {
        return Decimal::ZERO;
    }
    hourly_rate * Decimal::from(late_hours) * LATE_FEE_MULTIPLIER
}

/// Booking total: base price plus the deposit already collected plus all
/// accumulated extra fees.
pub fn total_amount(base_price: Decimal, deposit_paid: Decimal, extra_fee: Decimal) -> Decimal {
    base_price + deposit_paid + extra_fee
}

/// Settlement figures for closing out a booking.
///
/// Both `complete` and the deferred `pay_remainder` path derive their
/// charges from this one computation so the fee formula cannot drift
/// between the two call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Fee for whole hours of lateness, zero if on time
    pub late_fee: Decimal,
    /// Extra fee after the late fee is folded in
    pub extra_fee_after: Decimal,
    /// Booking total after the late fee is folded in
    pub total_after: Decimal,
    /// Remainder charge target at checkout: base plus extra fees. The
    /// deposit was charged separately and is not collected again here.
    pub remaining_amount: Decimal,
    /// Deferred settlement charge: base plus late fee, net of the deposit
    /// already paid.
    pub net_settlement: Decimal,
}

impl Settlement {
    pub fn compute(
        hourly_rate: Decimal,
        base_price: Decimal,
        deposit_paid: Decimal,
        extra_fee_before: Decimal,
        expected_end: DateTime<Utc>,
        actual_end: DateTime<Utc>,
    ) -> Self {
        let fee = late_fee(hourly_rate, expected_end, actual_end);
        let extra_fee_after = extra_fee_before + fee;
        Self {
            late_fee: fee,
            extra_fee_after,
            total_after: total_amount(base_price, deposit_paid, extra_fee_after),
            remaining_amount: base_price + extra_fee_after,
            net_settlement: (base_price + fee) - deposit_paid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_base_price_within_24_hours() {
        let start = at(2025, 6, 1, 8, 0);
        let end = at(2025, 6, 1, 18, 0);
        assert_eq!(
            base_price(dec!(50000), dec!(400000), start, end),
            dec!(500000)
        );
    }

    #[test]
    fn test_base_price_thirty_hours() {
        // 30 hours: one day at the daily rate plus 6 hours at the hourly
        let start = at(2025, 6, 1, 8, 0);
        let end = at(2025, 6, 2, 14, 0);
        let base = base_price(dec!(50000), dec!(400000), start, end);
        assert_eq!(base, dec!(700000));
        assert_eq!(total_amount(base, dec!(200000), Decimal::ZERO), dec!(900000));
    }

    #[test]
    fn test_base_price_exactly_24_hours() {
        let start = at(2025, 6, 1, 8, 0);
        let end = at(2025, 6, 2, 8, 0);
        assert_eq!(
            base_price(dec!(50000), dec!(400000), start, end),
            dec!(1200000)
        );
    }

    #[test]
    fn test_late_fee_on_time_is_zero() {
        let expected = at(2025, 6, 2, 10, 0);
        assert_eq!(late_fee(dec!(50000), expected, expected), Decimal::ZERO);
        assert_eq!(
            late_fee(dec!(50000), expected, at(2025, 6, 2, 9, 0)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_late_fee_under_one_hour_is_zero() {
        let expected = at(2025, 6, 2, 10, 0);
        let actual = at(2025, 6, 2, 10, 59);
        assert_eq!(late_fee(dec!(50000), expected, actual), Decimal::ZERO);
    }

    #[test]
    fn test_late_fee_three_hours_twenty_minutes() {
        // 3h20m late counts as 3 whole hours: 50,000 * 3 * 1.5
        let expected = at(2025, 6, 2, 10, 0);
        let actual = at(2025, 6, 2, 13, 20);
        assert_eq!(late_fee(dec!(50000), expected, actual), dec!(225000));
    }

    #[test]
    fn test_total_amount_invariant() {
        assert_eq!(
            total_amount(dec!(700000), dec!(200000), dec!(225000)),
            dec!(1125000)
        );
    }

    #[test]
    fn test_settlement_on_time() {
        let expected = at(2025, 6, 2, 10, 0);
        let s = Settlement::compute(
            dec!(50000),
            dec!(700000),
            dec!(200000),
            Decimal::ZERO,
            expected,
            expected,
        );
        assert_eq!(s.late_fee, Decimal::ZERO);
        assert_eq!(s.remaining_amount, dec!(700000));
        assert_eq!(s.total_after, dec!(900000));
        assert_eq!(s.net_settlement, dec!(500000));
    }

    #[test]
    fn test_settlement_late_return() {
        let expected = at(2025, 6, 2, 10, 0);
        let actual = at(2025, 6, 2, 13, 20);
        let s = Settlement::compute(
            dec!(50000),
            dec!(700000),
            dec!(200000),
            Decimal::ZERO,
            expected,
            actual,
        );
        assert_eq!(s.late_fee, dec!(225000));
        assert_eq!(s.extra_fee_after, dec!(225000));
        // Remainder excludes the deposit already collected
        assert_eq!(s.remaining_amount, dec!(925000));
        assert_eq!(s.total_after, dec!(1125000));
        assert_eq!(s.net_settlement, dec!(725000));
    }

    #[test]
    fn test_settlement_keeps_prior_extra_fee() {
        let expected = at(2025, 6, 2, 10, 0);
        let actual = at(2025, 6, 2, 12, 0);
        let s = Settlement::compute(
            dec!(50000),
            dec!(700000),
            dec!(200000),
            dec!(30000),
            expected,
            actual,
        );
        assert_eq!(s.late_fee, dec!(150000));
        assert_eq!(s.extra_fee_after, dec!(180000));
        assert_eq!(s.remaining_amount, dec!(880000));
        assert_eq!(s.total_after, dec!(1080000));
    }
}
