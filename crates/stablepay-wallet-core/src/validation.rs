//! Client-side form validation.
//!
//! Everything here runs before a request is built, so a failure never
//! reaches the custody service.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::Amount;
use crate::ports::PortError;

/// Which form an amount came from; selects the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    Deposit,
    Approval,
    Transfer,
}

impl AmountField {
    fn missing_message(&self) -> &'static str {
        match self {
            AmountField::Deposit => "Please enter an amount to deposit.",
            AmountField::Approval => "Please enter an amount to approve.",
            AmountField::Transfer => "Please enter an amount to transfer.",
        }
    }

    fn invalid_message(&self) -> &'static str {
        match self {
            AmountField::Deposit => "Deposit amount must be a positive number.",
            AmountField::Approval => "Please enter a valid positive number for approval.",
            AmountField::Transfer => "Please enter a valid amount to transfer.",
        }
    }
}

pub fn parse_positive_amount(input: &str, field: AmountField) -> Result<Amount, PortError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PortError::Validation(field.missing_message().to_owned()));
    }
    let value = parse_decimal(trimmed)
        .ok_or_else(|| PortError::Validation(field.invalid_message().to_owned()))?;
    if value <= Decimal::ZERO {
        return Err(PortError::Validation(field.invalid_message().to_owned()));
    }
    Ok(Amount::new(value))
}

pub fn require_non_empty(input: &str, message: &str) -> Result<String, PortError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PortError::Validation(message.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// Reads a balance the way the backend reports it: a decimal string, a JSON
/// number, or nothing at all (zero).
pub fn parse_amount_value(value: &Value) -> Amount {
    let parsed = match value {
        Value::String(s) => parse_decimal(s.trim()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(|f| Decimal::try_from(f).ok())
            }
        }
        _ => None,
    };
    parsed.map(Amount::new).unwrap_or(Amount::ZERO)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
