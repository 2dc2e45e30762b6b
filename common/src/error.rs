//! Error types for monetary values.

use crate::Currency;
use thiserror::Error;

/// Errors raised when building monetary values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonetaryError {
    /// Two amounts that must share a currency do not.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    /// Amount text is not a decimal number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Result type for monetary operations.
pub type MonetaryResult<T> = std::result::Result<T, MonetaryError>;
