//! Ratekeeper FX Engine
//!
//! Converts amounts between currencies using conversion rates kept in a
//! persistent store and cached in memory.
//!
//! # Features
//!
//! - Rate store with a TTL-bound, injectable cache
//! - Base, inverse and cross-rate conversion with minor-unit rounding
//! - Caller-supplied rate lookups that bypass the store
//! - Postgres-backed rate repository and provider snapshot parsing
//!
//! # Example
//!
//! ```rust,ignore
//! use ratekeeper_fx::{FxEngine, FxEngineConfig, PgRateRepository};
//! use ratekeeper_common::{Amount, Currency};
//!
//! let repository = PgRateRepository::connect(&database_url, 5).await?;
//! let engine = FxEngine::new(Arc::new(repository), FxEngineConfig::from_env());
//!
//! let usd = Amount::parse("1000.00", Currency::usd())?;
//! let eur = engine.exchange_currency(&usd, &Currency::eur()).await?;
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod postgres;
pub mod rate;
pub mod rate_store;
pub mod repository;
pub mod snapshot;

pub use cache::{RateCache, SharedRateCache, CACHE_KEY, CACHE_TIME_SECS};
pub use config::FxEngineConfig;
pub use conversion::{exchange_currency, Convertible, CurrencyConversion};
pub use engine::FxEngine;
pub use error::{FxError, FxResult};
pub use postgres::PgRateRepository;
pub use rate::{ConversionRate, RateTable};
pub use rate_store::RateStore;
pub use repository::RateRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use repository::InMemoryRateRepository;
pub use snapshot::RatesSnapshot;
