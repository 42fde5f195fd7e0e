//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize the
//! validation done at the store boundary so every entity is mapped with the
//! same invariants.

use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::CurrencyMismatch(format!("invalid currency: {value}")))
}

/// Ledger amounts are stored strictly positive; the sign lives in the entry
/// kind (income vs outcome, transfer direction).
pub(crate) fn validate_entry_amount(amount_minor: i64) -> ResultEngine<i64> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(amount_minor)
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Ensure an entry currency matches the wallet currency.
pub(crate) fn ensure_wallet_currency(
    wallet_currency: Currency,
    actual: Currency,
) -> ResultEngine<()> {
    if wallet_currency != actual {
        return Err(EngineError::CurrencyMismatch(format!(
            "wallet currency is {}, got {}",
            wallet_currency.code(),
            actual.code()
        )));
    }
    Ok(())
}
