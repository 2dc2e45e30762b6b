//! Persistent rate store traits and implementations.

use async_trait::async_trait;
use ratekeeper_common::Currency;
use rust_decimal::Decimal;

use crate::error::FxResult;
use crate::rate::ConversionRate;

/// Trait for persistent conversion rate stores.
///
/// Rows are keyed by `to_currency`; an upsert replaces the previous rate.
#[async_trait]
pub trait RateRepository: Send + Sync {
    /// Get the repository name.
    fn name(&self) -> &str;

    /// Read every stored rate.
    async fn fetch_all(&self) -> FxResult<Vec<ConversionRate>>;

    /// Insert or replace the rate for `to_currency`.
    async fn upsert(&self, to_currency: &Currency, rate: Decimal) -> FxResult<ConversionRate>;
}

/// In-memory repository for tests and local tooling.
#[cfg(any(test, feature = "test-utils"))]
pub use in_memory::InMemoryRateRepository;

#[cfg(any(test, feature = "test-utils"))]
mod in_memory {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::RwLock;
    use ratekeeper_common::Currency;
    use rust_decimal::Decimal;

    use super::RateRepository;
    use crate::error::{FxError, FxResult};
    use crate::rate::ConversionRate;

    pub struct InMemoryRateRepository {
        name: String,
        rates: RwLock<BTreeMap<Currency, ConversionRate>>,
        reads: AtomicUsize,
        unreachable: AtomicBool,
        upserts_left: AtomicUsize,
    }

    impl InMemoryRateRepository {
        /// Create a new empty repository.
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                rates: RwLock::new(BTreeMap::new()),
                reads: AtomicUsize::new(0),
                unreachable: AtomicBool::new(false),
                upserts_left: AtomicUsize::new(usize::MAX),
            }
        }

        /// Create a repository seeded with `rates`.
        pub fn with_rates<I>(name: impl Into<String>, rates: I) -> FxResult<Self>
        where
            I: IntoIterator<Item = (Currency, Decimal)>,
        {
            let repository = Self::new(name);
            {
                let mut table = repository.rates.write();
                for (currency, rate) in rates {
                    table.insert(currency.clone(), ConversionRate::new(currency, rate)?);
                }
            }
            Ok(repository)
        }

        /// Number of `fetch_all` calls served so far.
        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        /// Make every call fail as if the backing store were down.
        pub fn set_unreachable(&self, unreachable: bool) {
            self.unreachable.store(unreachable, Ordering::SeqCst);
        }

        /// Accept `writes` more upserts, then fail every further one.
        pub fn fail_upserts_after(&self, writes: usize) {
            self.upserts_left.store(writes, Ordering::SeqCst);
        }

        fn check_reachable(&self) -> FxResult<()> {
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(FxError::StoreAccess(format!(
                    "{} is unreachable",
                    self.name
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RateRepository for InMemoryRateRepository {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_all(&self) -> FxResult<Vec<ConversionRate>> {
            self.check_reachable()?;
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.rates.read().values().cloned().collect())
        }

        async fn upsert(&self, to_currency: &Currency, rate: Decimal) -> FxResult<ConversionRate> {
            self.check_reachable()?;
            let row = ConversionRate::new(to_currency.clone(), rate)?;
            if self
                .upserts_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_err()
            {
                return Err(FxError::StoreAccess(format!(
                    "{} rejected the write for {}",
                    self.name, to_currency
                )));
            }
            self.rates.write().insert(to_currency.clone(), row.clone());
            Ok(row)
        }
    }
}
