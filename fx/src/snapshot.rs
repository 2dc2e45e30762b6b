//! Rate payloads published by the external rate provider.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ratekeeper_common::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// A "latest rates" payload: every rate is quoted against `base`.
///
/// Fields the provider adds beyond these (disclaimer, license) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesSnapshot {
    pub base: Currency,
    /// Unix timestamp the provider published the rates at.
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub rates: BTreeMap<Currency, Decimal>,
}

impl RatesSnapshot {
    pub fn from_json(payload: &str) -> FxResult<Self> {
        let snapshot: Self = serde_json::from_str(payload)?;
        if snapshot.base.is_empty() {
            return Err(FxError::Snapshot("missing base currency".to_string()));
        }
        Ok(snapshot)
    }

    /// Fail unless the rates are quoted against `expected`.
    pub fn ensure_base(&self, expected: &Currency) -> FxResult<()> {
        if &self.base != expected {
            return Err(FxError::BaseCurrencyMismatch {
                expected: expected.clone(),
                actual: self.base.clone(),
            });
        }
        Ok(())
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Consume the snapshot into `(currency, rate)` rows.
    pub fn into_rates(self) -> impl Iterator<Item = (Currency, Decimal)> {
        self.rates.into_iter()
    }
}
