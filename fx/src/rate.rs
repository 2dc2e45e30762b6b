//! Stored conversion rates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ratekeeper_common::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// Rate of one unit of the base currency expressed in `to_currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRate {
    /// Currency the rate converts into. Unique per store.
    pub to_currency: Currency,
    /// Strictly positive multiplier.
    pub rate: Decimal,
    /// When the refresh process last wrote this row.
    pub updated_at: DateTime<Utc>,
}

impl ConversionRate {
    /// Create a rate record stamped with the current time.
    pub fn new(to_currency: Currency, rate: Decimal) -> FxResult<Self> {
        validate_rate(&to_currency, rate)?;
        Ok(Self {
            to_currency,
            rate,
            updated_at: Utc::now(),
        })
    }
}

/// Reject zero and negative rates.
pub fn validate_rate(currency: &Currency, rate: Decimal) -> FxResult<()> {
    if rate <= Decimal::ZERO {
        return Err(FxError::InvalidRate {
            currency: currency.clone(),
            rate,
        });
    }
    Ok(())
}

/// All known rates keyed by currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateTable {
    rates: HashMap<Currency, ConversionRate>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, currency: &Currency) -> Option<&ConversionRate> {
        self.rates.get(currency)
    }

    /// Look up the multiplier for `currency`.
    pub fn rate(&self, currency: &Currency) -> FxResult<Decimal> {
        self.rates
            .get(currency)
            .map(|r| r.rate)
            .ok_or_else(|| FxError::RateNotAvailable(currency.clone()))
    }

    pub fn contains(&self, currency: &Currency) -> bool {
        self.rates.contains_key(currency)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Currency codes in the table, sorted.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut codes: Vec<Currency> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversionRate> {
        self.rates.values()
    }
}

impl FromIterator<ConversionRate> for RateTable {
    fn from_iter<I: IntoIterator<Item = ConversionRate>>(iter: I) -> Self {
        Self {
            rates: iter
                .into_iter()
                .map(|r| (r.to_currency.clone(), r))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_conversion_rate_must_be_positive() {
        assert!(ConversionRate::new(Currency::eur(), dec!(2)).is_ok());
        assert!(matches!(
            ConversionRate::new(Currency::eur(), Decimal::ZERO),
            Err(FxError::InvalidRate { .. })
        ));
        assert!(matches!(
            ConversionRate::new(Currency::eur(), dec!(-1)),
            Err(FxError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_rate_table_lookup() {
        let table: RateTable = vec![
            ConversionRate::new(Currency::eur(), dec!(2)).unwrap(),
            ConversionRate::new(Currency::gbp(), dec!(4)).unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rate(&Currency::gbp()).unwrap(), dec!(4));
        assert_eq!(table.currencies(), vec![Currency::eur(), Currency::gbp()]);
        assert!(matches!(
            table.rate(&Currency::jpy()),
            Err(FxError::RateNotAvailable(c)) if c == Currency::jpy()
        ));
    }

    #[test]
    fn test_later_row_wins_for_same_currency() {
        let table: RateTable = vec![
            ConversionRate::new(Currency::eur(), dec!(2)).unwrap(),
            ConversionRate::new(Currency::eur(), dec!(3)).unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rate(&Currency::eur()).unwrap(), dec!(3));
    }
}
