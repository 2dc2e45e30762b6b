//! FX engine configuration.

use chrono::Duration;
use ratekeeper_common::Currency;

use crate::cache::CACHE_TIME_SECS;

/// Configuration for the FX engine.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Reference currency all stored rates are quoted against.
    ///
    /// Left unset, conversions that need it fail with
    /// `FxError::BaseCurrencyNotConfigured`.
    pub base_currency: Option<Currency>,
    /// Lifetime of the cached rate table.
    pub cache_ttl: Duration,
    /// Whether to use the cached table.
    pub use_cache: bool,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            base_currency: None,
            cache_ttl: Duration::seconds(CACHE_TIME_SECS),
            use_cache: true,
        }
    }
}

impl FxEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(code) = lookup("BASE_CURRENCY") {
            if !code.trim().is_empty() {
                config.base_currency = Some(Currency::new(code));
            }
        }

        if let Some(secs) = lookup("RATES_CACHE_TTL_SECS") {
            if let Some(ttl) = secs.parse().ok().and_then(Duration::try_seconds) {
                config.cache_ttl = ttl;
            }
        }

        if let Some(flag) = lookup("RATES_USE_CACHE") {
            if let Ok(flag) = flag.parse() {
                config.use_cache = flag;
            }
        }

        config
    }

    pub fn with_base_currency(mut self, currency: Currency) -> Self {
        self.base_currency = Some(currency);
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_ttl <= Duration::zero() {
            return Err("Rate cache TTL must be positive".to_string());
        }

        if matches!(&self.base_currency, Some(c) if c.is_empty()) {
            return Err("Base currency code cannot be empty".to_string());
        }

        Ok(())
    }
}
