//! Currency conversion types and operations.

use std::fmt;

use ratekeeper_common::{Amount, Currency, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Values a [`CurrencyConversion`] can be applied to.
pub trait Convertible: Clone {
    /// Currency every leg of the value is held in.
    fn source_currency(&self) -> &Currency;

    /// Multiply every leg by `rate` and relabel it as `to`.
    fn rescale(&self, rate: Decimal, to: &Currency) -> FxResult<Self>;

    /// Round every leg to its currency's minor unit.
    fn rounded(&self) -> Self;
}

impl Convertible for Amount {
    fn source_currency(&self) -> &Currency {
        &self.currency
    }

    fn rescale(&self, rate: Decimal, to: &Currency) -> FxResult<Self> {
        self.checked_scale(rate, to)
            .ok_or_else(|| FxError::Overflow { currency: to.clone() })
    }

    fn rounded(&self) -> Self {
        self.round()
    }
}

impl Convertible for Price {
    fn source_currency(&self) -> &Currency {
        self.currency()
    }

    fn rescale(&self, rate: Decimal, to: &Currency) -> FxResult<Self> {
        let net = self.net().rescale(rate, to)?;
        let gross = self.gross().rescale(rate, to)?;
        Ok(Price::new(net, gross)?)
    }

    fn rounded(&self) -> Self {
        self.map_legs(Amount::round)
    }
}

/// A single conversion from `base_currency` into `to_currency`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConversion {
    pub base_currency: Currency,
    pub to_currency: Currency,
    /// Multiplier applied to values in `base_currency`.
    pub rate: Decimal,
}

impl CurrencyConversion {
    pub fn new(base_currency: Currency, to_currency: Currency, rate: Decimal) -> Self {
        Self {
            base_currency,
            to_currency,
            rate,
        }
    }

    /// Resolve the conversion from `from` to `to`.
    ///
    /// Stored rates are quoted against `base`, so converting out of the base
    /// uses the target's rate, converting into it uses the inverse of the
    /// source's rate, and any other pair goes through the cross rate.
    pub fn between<F>(
        from: &Currency,
        to: &Currency,
        base: Option<&Currency>,
        get_rate: F,
    ) -> FxResult<Self>
    where
        F: Fn(&Currency) -> FxResult<Decimal>,
    {
        if from == to {
            return Ok(Self::new(from.clone(), to.clone(), Decimal::ONE));
        }

        let base = base.ok_or(FxError::BaseCurrencyNotConfigured)?;

        let rate = if from == base {
            positive_rate(&get_rate, to)?
        } else if to == base {
            let from_rate = positive_rate(&get_rate, from)?;
            invert(from, from_rate)?
        } else {
            let to_rate = positive_rate(&get_rate, to)?;
            let from_rate = positive_rate(&get_rate, from)?;
            to_rate.checked_div(from_rate).ok_or(FxError::InvalidRate {
                currency: from.clone(),
                rate: from_rate,
            })?
        };

        Ok(Self::new(from.clone(), to.clone(), rate))
    }

    /// Apply the conversion without rounding.
    ///
    /// Fails with [`FxError::Overflow`] when a leg leaves the `Decimal` range.
    pub fn apply<T: Convertible>(&self, value: &T) -> FxResult<T> {
        value.rescale(self.rate, &self.to_currency)
    }
}

impl fmt::Debug for CurrencyConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CurrencyConversion('{}', '{}', rate=Decimal('{}'))",
            self.base_currency,
            self.to_currency,
            self.rate.normalize()
        )
    }
}

impl fmt::Display for CurrencyConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn positive_rate<F>(get_rate: &F, currency: &Currency) -> FxResult<Decimal>
where
    F: Fn(&Currency) -> FxResult<Decimal>,
{
    let rate = get_rate(currency)?;
    if rate <= Decimal::ZERO {
        return Err(FxError::InvalidRate {
            currency: currency.clone(),
            rate,
        });
    }
    Ok(rate)
}

fn invert(currency: &Currency, rate: Decimal) -> FxResult<Decimal> {
    Decimal::ONE
        .checked_div(rate)
        .ok_or_else(|| FxError::InvalidRate {
            currency: currency.clone(),
            rate,
        })
}

/// Convert `amount` into `to_currency`, rounding to the target's minor unit.
///
/// Same-currency requests return the amount unchanged without consulting
/// `get_rate` or the base currency.
pub fn exchange_currency<T, F>(
    amount: &T,
    to_currency: &Currency,
    base_currency: Option<&Currency>,
    get_rate: F,
) -> FxResult<T>
where
    T: Convertible,
    F: Fn(&Currency) -> FxResult<Decimal>,
{
    if to_currency.is_empty() {
        return Err(FxError::InvalidCurrency(to_currency.code().to_string()));
    }

    let from = amount.source_currency();
    if from == to_currency {
        return Ok(amount.clone());
    }

    let conversion = CurrencyConversion::between(from, to_currency, base_currency, get_rate)?;
    debug!(conversion = %conversion, "Converting");

    Ok(conversion.apply(amount)?.rounded())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn rates() -> HashMap<Currency, Decimal> {
        HashMap::from([
            (Currency::eur(), dec!(2)),
            (Currency::gbp(), dec!(4)),
            (Currency::new("BTC"), dec!(10)),
        ])
    }

    fn lookup(table: &HashMap<Currency, Decimal>) -> impl Fn(&Currency) -> FxResult<Decimal> + '_ {
        move |currency| {
            table
                .get(currency)
                .copied()
                .ok_or_else(|| FxError::RateNotAvailable(currency.clone()))
        }
    }

    fn usd(value: Decimal) -> Amount {
        Amount::new(value, Currency::usd())
    }

    #[test]
    fn test_repr() {
        let conversion = CurrencyConversion::new(Currency::usd(), Currency::eur(), dec!(0.5));
        assert_eq!(
            format!("{:?}", conversion),
            "CurrencyConversion('USD', 'EUR', rate=Decimal('0.5'))"
        );
        assert_eq!(conversion.to_string(), format!("{:?}", conversion));
    }

    #[test]
    fn test_repr_of_derived_rate_drops_trailing_zeros() {
        let table = rates();
        let conversion = CurrencyConversion::between(
            &Currency::gbp(),
            &Currency::eur(),
            Some(&Currency::usd()),
            lookup(&table),
        )
        .unwrap();

        assert_eq!(conversion.rate, dec!(0.5));
        assert_eq!(
            format!("{:?}", conversion),
            "CurrencyConversion('GBP', 'EUR', rate=Decimal('0.5'))"
        );

        let inverse = CurrencyConversion::new(Currency::eur(), Currency::usd(), dec!(0.2500));
        assert_eq!(
            inverse.to_string(),
            "CurrencyConversion('EUR', 'USD', rate=Decimal('0.25'))"
        );
    }

    #[test]
    fn test_currency_conversion_apply_for_amount() {
        let conversion = CurrencyConversion::new(Currency::usd(), Currency::eur(), dec!(2));
        let amount = usd(dec!(10));

        let converted = conversion.apply(&amount).unwrap();

        assert_eq!(converted.currency, Currency::eur());
        assert_eq!(converted.value, dec!(20));
        assert_eq!(amount, usd(dec!(10)));
    }

    #[test]
    fn test_currency_conversion_apply_for_price() {
        let conversion = CurrencyConversion::new(Currency::usd(), Currency::eur(), dec!(2));
        let price = Price::new(usd(dec!(10)), usd(dec!(12))).unwrap();

        let converted = conversion.apply(&price).unwrap();

        assert_eq!(converted.net().currency, Currency::eur());
        assert_eq!(converted.net().value, dec!(20));
        assert_eq!(converted.gross().currency, Currency::eur());
        assert_eq!(converted.gross().value, dec!(24));
    }

    #[test]
    fn test_the_same_currency_uses_no_conversion() {
        let amount = usd(dec!(10));
        let converted = exchange_currency(&amount, &Currency::usd(), None, |c: &Currency| {
            Err(FxError::RateNotAvailable(c.clone()))
        })
        .unwrap();
        assert_eq!(converted, amount);
    }

    #[test]
    fn test_base_currency_to_another() {
        let table = rates();
        let converted =
            exchange_currency(&usd(dec!(10)), &Currency::eur(), Some(&Currency::usd()), lookup(&table))
                .unwrap();
        assert_eq!(converted, Amount::new(dec!(20), Currency::eur()));
    }

    #[test]
    fn test_convert_another_to_base_currency() {
        let table = HashMap::from([(Currency::eur(), dec!(3))]);
        let amount = Amount::new(dec!(10), Currency::eur());

        let converted =
            exchange_currency(&amount, &Currency::usd(), Some(&Currency::usd()), lookup(&table))
                .unwrap();

        assert_eq!(converted, usd(dec!(3.33)));
    }

    #[test]
    fn test_convert_two_non_base_currencies() {
        let table = rates();
        let amount = Amount::new(dec!(10), Currency::eur());

        let converted =
            exchange_currency(&amount, &Currency::gbp(), Some(&Currency::usd()), lookup(&table))
                .unwrap();

        assert_eq!(converted, Amount::new(dec!(20), Currency::gbp()));
    }

    #[test]
    fn test_rounds_to_target_precision() {
        let table = rates();
        let amount = usd(dec!(1.23456789));

        let converted =
            exchange_currency(&amount, &Currency::eur(), Some(&Currency::usd()), lookup(&table))
                .unwrap();

        assert_eq!(converted, Amount::new(dec!(2.47), Currency::eur()));
    }

    #[test]
    fn test_rounds_to_zero_decimal_currency() {
        let table = HashMap::from([(Currency::jpy(), dec!(151.237))]);

        let converted =
            exchange_currency(&usd(dec!(3)), &Currency::jpy(), Some(&Currency::usd()), lookup(&table))
                .unwrap();

        assert_eq!(converted, Amount::new(dec!(454), Currency::jpy()));
    }

    #[test]
    fn test_price_conversion_keeps_legs_in_one_currency() {
        let table = rates();
        let price = Price::new(usd(dec!(10)), usd(dec!(12.345))).unwrap();

        let converted =
            exchange_currency(&price, &Currency::gbp(), Some(&Currency::usd()), lookup(&table))
                .unwrap();

        assert_eq!(converted.currency(), &Currency::gbp());
        assert_eq!(converted.net(), &Amount::new(dec!(40), Currency::gbp()));
        assert_eq!(converted.gross(), &Amount::new(dec!(49.38), Currency::gbp()));
    }

    #[test]
    fn test_missing_rate() {
        let table = rates();
        let result =
            exchange_currency(&usd(dec!(10)), &Currency::jpy(), Some(&Currency::usd()), lookup(&table));
        assert!(matches!(result, Err(FxError::RateNotAvailable(c)) if c == Currency::jpy()));
    }

    #[test]
    fn test_empty_rates_is_lookup_error() {
        let table = HashMap::new();
        let result =
            exchange_currency(&usd(dec!(10)), &Currency::eur(), Some(&Currency::usd()), lookup(&table));
        assert!(matches!(result, Err(FxError::RateNotAvailable(_))));
    }

    #[test]
    fn test_missing_base_currency() {
        let table = rates();
        let result = exchange_currency(&usd(dec!(10)), &Currency::eur(), None, lookup(&table));
        assert!(matches!(result, Err(FxError::BaseCurrencyNotConfigured)));
    }

    #[test]
    fn test_empty_target_currency() {
        let table = rates();
        let result =
            exchange_currency(&usd(dec!(10)), &Currency::new(""), Some(&Currency::usd()), lookup(&table));
        assert!(matches!(result, Err(FxError::InvalidCurrency(_))));
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let table = HashMap::from([(Currency::eur(), Decimal::ZERO)]);
        let amount = Amount::new(dec!(10), Currency::eur());

        let result =
            exchange_currency(&amount, &Currency::usd(), Some(&Currency::usd()), lookup(&table));

        assert!(matches!(result, Err(FxError::InvalidRate { .. })));
    }

    #[test]
    fn test_overflowing_conversion_is_an_error() {
        let table = rates();
        let amount = usd(Decimal::MAX / dec!(2));

        let result =
            exchange_currency(&amount, &Currency::gbp(), Some(&Currency::usd()), lookup(&table));

        assert!(matches!(result, Err(FxError::Overflow { currency }) if currency == Currency::gbp()));
    }

    #[test]
    fn test_overflowing_price_leg_is_an_error() {
        let conversion = CurrencyConversion::new(Currency::usd(), Currency::gbp(), dec!(4));
        let price = Price::new(usd(dec!(10)), usd(Decimal::MAX / dec!(2))).unwrap();

        assert!(matches!(
            conversion.apply(&price),
            Err(FxError::Overflow { .. })
        ));
    }

    #[test]
    fn test_between_resolves_cross_rate() {
        let table = rates();
        let conversion = CurrencyConversion::between(
            &Currency::gbp(),
            &Currency::new("BTC"),
            Some(&Currency::usd()),
            lookup(&table),
        )
        .unwrap();

        assert_eq!(conversion.base_currency, Currency::gbp());
        assert_eq!(conversion.rate, dec!(2.5));
    }

    fn currency_code() -> impl Strategy<Value = Currency> {
        prop::sample::select(vec!["USD", "EUR", "GBP", "CHF", "PLN"]).prop_map(Currency::from)
    }

    proptest! {
        #[test]
        fn prop_same_currency_is_identity(cents in -1_000_000_000i64..1_000_000_000, currency in currency_code()) {
            let amount = Amount::new(Decimal::new(cents, 2), currency.clone());
            let converted = exchange_currency(&amount, &currency, Some(&Currency::usd()), |c: &Currency| {
                Err(FxError::RateNotAvailable(c.clone()))
            }).unwrap();
            prop_assert_eq!(converted, amount);
        }

        #[test]
        fn prop_cross_conversion_composes(
            cents in 0i64..100_000_000,
            eur in 10i64..10_000,
            gbp in 10i64..10_000,
            chf in 10i64..10_000,
        ) {
            let table = HashMap::from([
                (Currency::eur(), Decimal::new(eur, 2)),
                (Currency::gbp(), Decimal::new(gbp, 2)),
                (Currency::new("CHF"), Decimal::new(chf, 2)),
            ]);
            let base = Currency::usd();
            let amount = Amount::new(Decimal::new(cents, 2), Currency::eur());

            let via_gbp = exchange_currency(&amount, &Currency::gbp(), Some(&base), lookup(&table)).unwrap();
            let indirect = exchange_currency(&via_gbp, &Currency::new("CHF"), Some(&base), lookup(&table)).unwrap();
            let direct = exchange_currency(&amount, &Currency::new("CHF"), Some(&base), lookup(&table)).unwrap();

            // Rounding the intermediate GBP leg can move the result by half a
            // cent scaled by the GBP->CHF rate, plus one rounding step.
            let gbp_to_chf = Decimal::new(chf, 2) / Decimal::new(gbp, 2);
            let tolerance = dec!(0.005) * gbp_to_chf + dec!(0.0101);
            prop_assert_eq!(&indirect.currency, &direct.currency);
            prop_assert!((indirect.value - direct.value).abs() <= tolerance);
        }
    }
}
