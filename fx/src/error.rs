//! FX engine error types.

use ratekeeper_common::{Currency, MonetaryError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the FX engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// No rate record exists for the requested currency.
    #[error("No conversion rate for {0}")]
    RateNotAvailable(Currency),

    /// A conversion needed the base currency but none is configured.
    #[error("Base currency is not configured (set BASE_CURRENCY)")]
    BaseCurrencyNotConfigured,

    /// The persistent rate store could not be read or written.
    #[error("Rate store unavailable: {0}")]
    StoreAccess(String),

    /// Rates must be strictly positive.
    #[error("Invalid rate {rate} for {currency}")]
    InvalidRate { currency: Currency, rate: Decimal },

    /// The converted value does not fit in a `Decimal`.
    #[error("Conversion into {currency} overflows")]
    Overflow { currency: Currency },

    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Rates were quoted against a different base than the configured one.
    #[error("Base currency mismatch: expected {expected}, got {actual}")]
    BaseCurrencyMismatch { expected: Currency, actual: Currency },

    #[error(transparent)]
    Monetary(#[from] MonetaryError),

    /// Provider payload could not be parsed.
    #[error("Invalid rates snapshot: {0}")]
    Snapshot(String),
}

impl From<sqlx::Error> for FxError {
    fn from(err: sqlx::Error) -> Self {
        FxError::StoreAccess(err.to_string())
    }
}

impl From<serde_json::Error> for FxError {
    fn from(err: serde_json::Error) -> Self {
        FxError::Snapshot(err.to_string())
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
