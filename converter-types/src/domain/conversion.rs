//! Validated currency conversion request.

use rust_decimal::Decimal;

use super::{CurrencyCode, Money};
use crate::error::DomainError;

pub const AMOUNT_NOT_POSITIVE: &str = "Amount must be greater than zero.";
pub const CURRENCY_EXCLUDED: &str =
    "Currency conversion is not supported for TRY, PLN, THB, or MXN.";

/// A conversion of `from` into the `to` currency.
///
/// Only obtainable through [`ConversionRequest::create`], which checks the
/// amount first and the excluded currencies second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    from: Money,
    to: CurrencyCode,
}

impl ConversionRequest {
    pub fn create(
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::Validation(AMOUNT_NOT_POSITIVE.into()));
        }

        if from.is_excluded() || to.is_excluded() {
            return Err(DomainError::Validation(CURRENCY_EXCLUDED.into()));
        }

        Ok(Self {
            from: Money::new(amount, from),
            to,
        })
    }

    pub fn from(&self) -> &Money {
        &self.from
    }

    pub fn to(&self) -> &CurrencyCode {
        &self.to
    }
}
