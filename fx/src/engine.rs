//! Main FX engine implementation.

use std::sync::Arc;

use ratekeeper_common::{Amount, Currency};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::cache::SharedRateCache;
use crate::config::FxEngineConfig;
use crate::conversion::{self, Convertible, CurrencyConversion};
use crate::error::{FxError, FxResult};
use crate::rate::RateTable;
use crate::rate_store::RateStore;
use crate::repository::RateRepository;

/// The main FX engine: converts amounts using the rates in its store.
pub struct FxEngine {
    store: RateStore,
    config: FxEngineConfig,
}

impl FxEngine {
    /// Create a new FX engine reading rates from `repository`.
    pub fn new(repository: Arc<dyn RateRepository>, config: FxEngineConfig) -> Self {
        Self {
            store: RateStore::with_config(repository, &config),
            config,
        }
    }

    /// Create an engine that shares `cache` with other engines or tests.
    pub fn with_cache(
        repository: Arc<dyn RateRepository>,
        cache: SharedRateCache,
        config: FxEngineConfig,
    ) -> Self {
        Self {
            store: RateStore::new(repository, cache, config.cache_ttl),
            config,
        }
    }

    pub fn store(&self) -> &RateStore {
        &self.store
    }

    pub fn config(&self) -> &FxEngineConfig {
        &self.config
    }

    /// Get the configured base currency.
    pub fn base_currency(&self) -> FxResult<&Currency> {
        self.config
            .base_currency
            .as_ref()
            .ok_or(FxError::BaseCurrencyNotConfigured)
    }

    /// Get every known rate, optionally bypassing the cache.
    pub async fn get_rates(&self, force_refresh: bool) -> FxResult<Arc<RateTable>> {
        self.store.get_rates(force_refresh).await
    }

    /// Get the rate for a single currency.
    pub async fn get_rate(&self, currency: &Currency) -> FxResult<Decimal> {
        self.store.get_rate(currency).await
    }

    /// Convert `amount` into `to_currency` using the stored rates.
    ///
    /// Same-currency requests return without reading the store, and so does
    /// any request made while no base currency is configured.
    #[instrument(skip_all, fields(
        from_currency = %amount.source_currency(),
        to_currency = %to_currency
    ))]
    pub async fn exchange_currency<T: Convertible>(
        &self,
        amount: &T,
        to_currency: &Currency,
    ) -> FxResult<T> {
        if to_currency.is_empty() || amount.source_currency() == to_currency {
            return self.exchange_currency_with(amount, to_currency, |c: &Currency| {
                Err(FxError::RateNotAvailable(c.clone()))
            });
        }

        self.base_currency()?;
        let rates = self.store.get_rates(false).await?;
        self.exchange_currency_with(amount, to_currency, |c: &Currency| rates.rate(c))
    }

    /// Convert `amount` with a caller-supplied rate lookup.
    ///
    /// The store is never read; `get_rate` answers every lookup.
    pub fn exchange_currency_with<T, F>(
        &self,
        amount: &T,
        to_currency: &Currency,
        get_rate: F,
    ) -> FxResult<T>
    where
        T: Convertible,
        F: Fn(&Currency) -> FxResult<Decimal>,
    {
        conversion::exchange_currency(
            amount,
            to_currency,
            self.config.base_currency.as_ref(),
            get_rate,
        )
    }

    /// Convert an amount for display in `currency`.
    pub async fn in_currency(&self, amount: &Amount, currency: &Currency) -> FxResult<Amount> {
        let converted = self.exchange_currency(amount, currency).await?;
        debug!(amount = %amount, converted = %converted, "Converted for display");
        Ok(converted)
    }

    /// Resolve the conversion between two currencies from the stored rates.
    pub async fn conversion(&self, from: &Currency, to: &Currency) -> FxResult<CurrencyConversion> {
        if from == to {
            return CurrencyConversion::between(from, to, None, |c: &Currency| {
                Err(FxError::RateNotAvailable(c.clone()))
            });
        }

        let base = self.base_currency()?;
        let rates = self.store.get_rates(false).await?;
        CurrencyConversion::between(from, to, Some(base), |c: &Currency| rates.rate(c))
    }

    /// Store a fresh set of rates and refresh the cache.
    pub async fn update_rates<I>(&self, rates: I) -> FxResult<usize>
    where
        I: IntoIterator<Item = (Currency, Decimal)>,
    {
        self.store.update_rates(rates).await
    }
}
