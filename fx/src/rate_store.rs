//! Cached access to the persisted conversion rates.

use std::sync::Arc;

use chrono::Duration;
use ratekeeper_common::Currency;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::cache::{RateCache, SharedRateCache, CACHE_KEY};
use crate::config::FxEngineConfig;
use crate::error::FxResult;
use crate::rate::{validate_rate, RateTable};
use crate::repository::RateRepository;

/// Reads the full rate table from a repository, caching it under
/// [`CACHE_KEY`] for `cache_ttl`.
pub struct RateStore {
    repository: Arc<dyn RateRepository>,
    cache: SharedRateCache,
    cache_ttl: Duration,
    use_cache: bool,
}

impl RateStore {
    /// Create a store around an existing cache handle.
    pub fn new(repository: Arc<dyn RateRepository>, cache: SharedRateCache, cache_ttl: Duration) -> Self {
        Self {
            repository,
            cache,
            cache_ttl,
            use_cache: true,
        }
    }

    /// Create a store with a private cache configured from `config`.
    pub fn with_config(repository: Arc<dyn RateRepository>, config: &FxEngineConfig) -> Self {
        Self {
            repository,
            cache: Arc::new(RateCache::new()),
            cache_ttl: config.cache_ttl,
            use_cache: config.use_cache,
        }
    }

    pub fn cache(&self) -> &SharedRateCache {
        &self.cache
    }

    pub fn repository(&self) -> &Arc<dyn RateRepository> {
        &self.repository
    }

    /// Get every known rate.
    ///
    /// A warm cache is returned as-is unless `force_refresh` is set. Otherwise
    /// the repository is read once and the cache written once.
    #[instrument(skip(self), fields(repository = self.repository.name()))]
    pub async fn get_rates(&self, force_refresh: bool) -> FxResult<Arc<RateTable>> {
        if self.use_cache && !force_refresh {
            if let Some(cached) = self.cache.get(CACHE_KEY) {
                debug!("Using cached rates");
                return Ok(cached);
            }
        }

        let rows = self.repository.fetch_all().await?;
        let table: Arc<RateTable> = Arc::new(rows.into_iter().collect());

        if self.use_cache {
            self.cache.set(CACHE_KEY, table.clone(), self.cache_ttl);
        }

        debug!(currencies = table.len(), "Loaded rates from repository");
        Ok(table)
    }

    /// Get the rate for a single currency.
    pub async fn get_rate(&self, currency: &Currency) -> FxResult<Decimal> {
        self.get_rates(false).await?.rate(currency)
    }

    /// Write a fresh set of rates and refresh the cache.
    ///
    /// Every rate is validated before the first write, so a rejected batch
    /// leaves the repository untouched. A write failing partway drops the
    /// cached table, since the rows written before it are already live.
    #[instrument(skip(self, rates))]
    pub async fn update_rates<I>(&self, rates: I) -> FxResult<usize>
    where
        I: IntoIterator<Item = (Currency, Decimal)>,
    {
        let rates: Vec<(Currency, Decimal)> = rates.into_iter().collect();

        for (currency, rate) in &rates {
            if let Err(e) = validate_rate(currency, *rate) {
                warn!(currency = %currency, rate = %rate, "Rejecting rate batch");
                return Err(e);
            }
        }

        for (currency, rate) in &rates {
            if let Err(e) = self.repository.upsert(currency, *rate).await {
                warn!(currency = %currency, error = %e, "Rate write failed, dropping cached table");
                self.invalidate();
                return Err(e);
            }
        }

        let table = self.get_rates(true).await?;

        info!(
            written = rates.len(),
            currencies = table.len(),
            "Conversion rates updated"
        );

        Ok(rates.len())
    }

    /// Drop the cached table so the next read hits the repository.
    pub fn invalidate(&self) {
        self.cache.remove(CACHE_KEY);
    }
}
