use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, ResultEngine};

/// Signed money amount represented as an integer number of **minor units**.
///
/// Use this type for all monetary values crossing the engine boundary
/// (balances, entry amounts) to avoid floating-point drift. The value is
/// signed: positive = income / increase, negative = outcome / decrease.
///
/// How many minor units make up one major unit depends on the
/// [`Currency`], which is why parsing and formatting take one.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::parse("10,5", Currency::Eur).unwrap();
/// assert_eq!(amount.minor(), 1050);
/// assert_eq!(amount.format(Currency::Eur), "10.50 EUR");
/// assert!(Money::parse("12.345", Currency::Eur).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and rejects more fraction
    /// digits than the currency carries.
    pub fn parse(input: &str, currency: Currency) -> ResultEngine<Money> {
        let trimmed = input.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut parts = rest.splitn(2, ['.', ',']);
        let whole = parts.next().unwrap_or_default();
        let frac = parts.next().unwrap_or_default();

        let scale = usize::from(currency.minor_units());
        if frac.len() > scale {
            return Err(EngineError::InvalidAmount(format!(
                "{} supports at most {scale} fraction digits",
                currency.code()
            )));
        }
        if whole.is_empty() && frac.is_empty() {
            return Err(EngineError::InvalidAmount(format!("empty amount: {input:?}")));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(EngineError::InvalidAmount(format!(
                "not a decimal amount: {input:?}"
            )));
        }

        let factor = 10_i64.pow(currency.minor_units() as u32);
        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| EngineError::InvalidAmount(format!("amount out of range: {input:?}")))?
        };
        let frac_padded = format!("{frac:0<scale$}");
        let frac_value: i64 = if frac_padded.is_empty() {
            0
        } else {
            frac_padded
                .parse()
                .map_err(|_| EngineError::InvalidAmount(format!("amount out of range: {input:?}")))?
        };

        let minor = whole_value
            .checked_mul(factor)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(|| EngineError::InvalidAmount(format!("amount out of range: {input:?}")))?;

        Ok(Money(if negative { -minor } else { minor }))
    }

    /// Formats the amount in major units with the currency code appended.
    #[must_use]
    pub fn format(self, currency: Currency) -> String {
        let scale = usize::from(currency.minor_units());
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        if scale == 0 {
            return format!("{sign}{abs} {}", currency.code());
        }
        let factor = 10_u64.pow(currency.minor_units() as u32);
        let major = abs / factor;
        let frac = abs % factor;
        format!("{sign}{major}.{frac:0scale$} {}", currency.code())
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_major_units() {
        assert_eq!(Money::parse("10", Currency::Eur).unwrap().minor(), 1000);
        assert_eq!(Money::parse("10.5", Currency::Eur).unwrap().minor(), 1050);
        assert_eq!(Money::parse("10,05", Currency::Usd).unwrap().minor(), 1005);
        assert_eq!(Money::parse("-3.20", Currency::Gbp).unwrap().minor(), -320);
        assert_eq!(Money::parse(".5", Currency::Eur).unwrap().minor(), 50);
    }

    #[test]
    fn parses_zero_decimal_currency() {
        assert_eq!(Money::parse("120", Currency::Jpy).unwrap().minor(), 120);
        assert!(Money::parse("120.5", Currency::Jpy).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(Money::parse("", Currency::Eur).is_err());
        assert!(Money::parse("12.345", Currency::Eur).is_err());
        assert!(Money::parse("12a", Currency::Eur).is_err());
        assert!(Money::parse("--3", Currency::Eur).is_err());
    }

    #[test]
    fn formats_with_currency() {
        assert_eq!(Money::from_minor(1050).format(Currency::Eur), "10.50 EUR");
        assert_eq!(Money::from_minor(-305).format(Currency::Usd), "-3.05 USD");
        assert_eq!(Money::from_minor(120).format(Currency::Jpy), "120 JPY");
        assert_eq!(Money::ZERO.format(Currency::Eur), "0.00 EUR");
    }
}
