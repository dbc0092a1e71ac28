//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod location_repository;
pub mod repository_provider;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

use crate::domain::DomainError;

// ── Shared conversion helpers ───────────────────────────────────

pub(crate) fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

/// Constraint class of a failed statement, if any
pub(crate) enum Violation {
    Unique,
    ForeignKey,
}

pub(crate) fn violation(e: &DbErr) -> Option<Violation> {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Some(Violation::Unique),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => Some(Violation::ForeignKey),
        _ => None,
    }
}

pub(crate) fn parse_id(entity: &'static str, raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw)
        .map_err(|_| DomainError::Storage(format!("{entity} row has a malformed id: {raw}")))
}

/// Money is stored in the smallest currency unit. Values that would lose
/// precision are refused rather than rounded.
pub(crate) fn to_minor(amount: Decimal) -> Result<i64, DomainError> {
    if amount.normalize().scale() > 2 {
        return Err(DomainError::Validation(format!(
            "{amount} has more than two decimal places"
        )));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| DomainError::Validation(format!("{amount} is out of range")))
}

pub(crate) fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Stored counters are clamped into `u32`; negative values read as 0.
pub(crate) fn to_count(raw: i32) -> u32 {
    u32::try_from(raw).unwrap_or(0)
}

pub(crate) fn from_count(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_uses_minor_units() {
        assert_eq!(to_minor(Decimal::new(4050, 2)).unwrap(), 4050);
        assert_eq!(to_minor(Decimal::from(40)).unwrap(), 4000);
        assert_eq!(to_minor(Decimal::new(12_3500, 4)).unwrap(), 1235);
        assert_eq!(from_minor(4050), Decimal::new(4050, 2));
        assert_eq!(from_minor(to_minor(Decimal::from(85)).unwrap()), Decimal::from(85));
    }

    #[test]
    fn money_that_would_round_is_refused() {
        assert!(matches!(
            to_minor(Decimal::new(12345, 3)),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            to_minor(Decimal::MAX),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn corrupted_counters_read_as_zero() {
        assert_eq!(to_count(-5), 0);
        assert_eq!(to_count(7), 7);
    }
}
