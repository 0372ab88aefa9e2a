//! Engine-wide constants.

use rust_decimal::Decimal;

/// Minimum USD value for a fetched balance to create a holding.
/// Anything below is dust and is never written (existing rows are kept).
pub fn dust_value_threshold() -> Decimal {
    Decimal::ONE
}

/// Minimum units of a stable asset for promotion to a cash balance.
pub fn cash_materiality_threshold() -> Decimal {
    Decimal::ONE
}

/// Environment variable holding the vault's base64 encryption key.
pub const SECRET_KEY_ENV: &str = "FINFOLIO_SECRET_KEY";
