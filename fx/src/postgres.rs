//! Postgres-backed rate repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratekeeper_common::Currency;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};

use crate::error::FxResult;
use crate::rate::{validate_rate, ConversionRate};
use crate::repository::RateRepository;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS conversion_rates (
    to_currency TEXT PRIMARY KEY,
    rate NUMERIC NOT NULL CHECK (rate > 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

const SELECT_ALL: &str =
    "SELECT to_currency, rate, updated_at FROM conversion_rates ORDER BY to_currency";

const UPSERT: &str = "INSERT INTO conversion_rates (to_currency, rate, updated_at)
    VALUES ($1, $2, now())
    ON CONFLICT (to_currency) DO UPDATE
    SET rate = EXCLUDED.rate, updated_at = EXCLUDED.updated_at
    RETURNING to_currency, rate, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct RateRow {
    to_currency: String,
    rate: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<RateRow> for ConversionRate {
    fn from(row: RateRow) -> Self {
        Self {
            to_currency: Currency::new(row.to_currency),
            rate: row.rate,
            updated_at: row.updated_at,
        }
    }
}

/// Conversion rates stored in the `conversion_rates` table.
pub struct PgRateRepository {
    pool: PgPool,
}

impl PgRateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> FxResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the rates table if it does not exist yet.
    pub async fn migrate(&self) -> FxResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!("conversion_rates table ready");
        Ok(())
    }
}

#[async_trait]
impl RateRepository for PgRateRepository {
    fn name(&self) -> &str {
        "postgres"
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self) -> FxResult<Vec<ConversionRate>> {
        let rows = sqlx::query_as::<_, RateRow>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ConversionRate::from).collect())
    }

    #[instrument(skip(self, to_currency), fields(currency = %to_currency))]
    async fn upsert(&self, to_currency: &Currency, rate: Decimal) -> FxResult<ConversionRate> {
        validate_rate(to_currency, rate)?;
        let row = sqlx::query_as::<_, RateRow>(UPSERT)
            .bind(to_currency.code())
            .bind(rate)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }
}
