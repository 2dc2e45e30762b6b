//! Monetary types shared by the rate store and the converter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MonetaryError, MonetaryResult};

/// A monetary amount with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// The amount value (high precision decimal).
    pub value: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

impl Amount {
    /// Create a new Amount instance.
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Create from a string value.
    pub fn parse(value: &str, currency: Currency) -> MonetaryResult<Self> {
        let value = value
            .parse()
            .map_err(|_| MonetaryError::InvalidAmount(value.to_string()))?;
        Ok(Self { value, currency })
    }

    /// Relabel the amount in another currency, scaling its value by `rate`.
    ///
    /// Returns `None` when the product does not fit in a `Decimal`.
    pub fn checked_scale(&self, rate: Decimal, currency: &Currency) -> Option<Self> {
        Some(Self {
            value: self.value.checked_mul(rate)?,
            currency: currency.clone(),
        })
    }

    /// Round to the currency's standard decimal places.
    ///
    /// Midpoints round to even, so `0.125 EUR` becomes `0.12 EUR`.
    pub fn round(&self) -> Self {
        let places = self.currency.decimal_places();
        Self {
            value: self.value.round_dp(places),
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// A net/gross pair of amounts sharing one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    net: Amount,
    gross: Amount,
}

impl Price {
    /// Create a price, rejecting legs in different currencies.
    pub fn new(net: Amount, gross: Amount) -> MonetaryResult<Self> {
        if net.currency != gross.currency {
            return Err(MonetaryError::CurrencyMismatch {
                expected: net.currency,
                actual: gross.currency,
            });
        }
        Ok(Self { net, gross })
    }

    pub fn net(&self) -> &Amount {
        &self.net
    }

    pub fn gross(&self) -> &Amount {
        &self.gross
    }

    pub fn currency(&self) -> &Currency {
        &self.net.currency
    }

    /// Apply `f` to both legs. Callers must keep the legs in one currency.
    pub fn map_legs(&self, f: impl Fn(&Amount) -> Amount) -> Self {
        Self {
            net: f(&self.net),
            gross: f(&self.gross),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net {}, gross {}", self.net, self.gross)
    }
}

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self.0.as_str() {
            "JPY" | "KRW" | "VND" | "ISK" | "CLP" | "UGX" | "XAF" | "XOF" => 0,
            "BHD" | "KWD" | "OMR" | "JOD" | "TND" | "IQD" | "LYD" => 3,
            _ => 2,
        }
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}
