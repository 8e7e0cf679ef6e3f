//! Money amounts in integer minor units.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// An amount in minor units (cents) with an ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
    currency: String,
}

impl Money {
    /// Creates an amount. Currency must be three ASCII letters; it is upper-cased.
    pub fn new(cents: i64, currency: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            cents,
            currency: normalize_currency(currency)?,
        })
    }

    /// Creates an amount that must be strictly positive.
    pub fn positive(cents: i64, currency: &str) -> Result<Self, ValidationError> {
        if cents <= 0 {
            return Err(ValidationError::invalid_format(
                "amount",
                "amount must be greater than zero",
            ));
        }
        Self::new(cents, currency)
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Two-decimal rendering without currency, e.g. `29.00`.
    pub fn decimal_string(&self) -> String {
        format_cents(self.cents)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.decimal_string(), self.currency)
    }
}

/// Formats minor units as a two-decimal string.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parses a decimal amount such as `"29"`, `"29.5"` or `"29.00"` into cents.
pub fn parse_decimal_amount(field: &str, input: &str) -> Result<i64, ValidationError> {
    let input = input.trim();
    let invalid = || ValidationError::invalid_format(field, "expected a decimal amount with at most two fraction digits");

    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() || fraction.len() > 2 {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };
    let cents = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)?;
    Ok(if negative { -cents } else { cents })
}

fn normalize_currency(currency: &str) -> Result<String, ValidationError> {
    let code = currency.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::invalid_format(
            "currency",
            "expected a three-letter ISO currency code",
        ));
    }
    Ok(code.to_ascii_uppercase())
}
