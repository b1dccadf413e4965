//! Economy model: inflation-adjusted pricing, rates, and the market cycle.

use crate::config::{CatalogItem, EconomyConfig};
use crate::random::RandomSource;
use crate::state::{Economy, MarketTrend};

/// Lowest and highest the market index may drift to.
const INDEX_FLOOR: f64 = 0.2;
const INDEX_CEILING: f64 = 8.0;

/// Catalog price after `month` months of compounding inflation.
///
/// `round(base_price * (1 + inflation_rate) ^ (month / 12))`. The growth
/// factor is clamped at zero, so deflation past -100% prices at 0 instead of
/// producing NaN or a negative number.
pub fn price_for_month(base_price: f64, inflation_rate: f64, month: u32) -> f64 {
    let growth = (1.0 + inflation_rate).max(0.0);
    let price = (base_price * growth.powf(month as f64 / 12.0)).round();
    if price.is_finite() {
        price.max(0.0)
    } else {
        0.0
    }
}

/// Current unit price of a catalog item, including market exposure.
pub fn current_price(item: &CatalogItem, economy: &Economy, month: u32) -> f64 {
    let inflated = price_for_month(item.base_price, economy.inflation_rate, month);
    let exposure = economy.market_index.max(INDEX_FLOOR).powf(item.kind.market_beta());
    let price = (inflated * exposure).round();
    if price.is_finite() {
        price.max(0.0)
    } else {
        0.0
    }
}

/// Monthly income a single unit produces at the given price.
pub fn unit_cash_flow(item: &CatalogItem, unit_price: f64) -> f64 {
    unit_price * item.expected_yield / 12.0
}

/// Transition table: cumulative probabilities for (Stable, Bull, Boom, Bear, Crash).
fn transition_row(trend: MarketTrend) -> [f64; 5] {
    match trend {
        MarketTrend::Stable => [0.60, 0.80, 0.83, 0.98, 1.00],
        MarketTrend::Bull => [0.25, 0.80, 0.90, 0.99, 1.00],
        MarketTrend::Boom => [0.10, 0.45, 0.75, 0.85, 1.00],
        MarketTrend::Bear => [0.35, 0.40, 0.40, 0.90, 1.00],
        MarketTrend::Crash => [0.20, 0.20, 0.20, 0.75, 1.00],
    }
}

const TREND_ORDER: [MarketTrend; 5] = [
    MarketTrend::Stable,
    MarketTrend::Bull,
    MarketTrend::Boom,
    MarketTrend::Bear,
    MarketTrend::Crash,
];

/// Next market trend for a uniform `roll` in `[0, 1)`.
pub fn next_trend(trend: MarketTrend, roll: f64) -> MarketTrend {
    let row = transition_row(trend);
    for (i, &cutoff) in row.iter().enumerate() {
        if roll < cutoff {
            return TREND_ORDER[i];
        }
    }
    TREND_ORDER[TREND_ORDER.len() - 1]
}

/// Expected monthly index drift and noise amplitude for a trend.
pub fn trend_drift(trend: MarketTrend) -> (f64, f64) {
    match trend {
        MarketTrend::Stable => (0.004, 0.02),
        MarketTrend::Bull => (0.015, 0.03),
        MarketTrend::Boom => (0.035, 0.05),
        MarketTrend::Bear => (-0.015, 0.03),
        MarketTrend::Crash => (-0.08, 0.06),
    }
}

/// Step the economy one month.
///
/// Draws exactly four rolls: trend, index noise, inflation, interest.
pub fn advance_economy(
    economy: &Economy,
    config: &EconomyConfig,
    rng: &mut dyn RandomSource,
) -> Economy {
    let mut next = economy.clone();

    next.market_trend = next_trend(economy.market_trend, rng.next_f64());

    if next.recession {
        next.recession_months = next.recession_months.saturating_sub(1);
        if next.recession_months == 0 {
            next.recession = false;
            log::info!("recession ended");
        }
    } else if next.market_trend == MarketTrend::Crash && config.recession_length > 0 {
        next.recession = true;
        next.recession_months = config.recession_length;
        log::info!("recession started for {} months", config.recession_length);
    }

    let (drift, noise) = trend_drift(next.market_trend);
    let shock = (rng.next_f64() - 0.5) * 2.0 * noise;
    next.market_index = (economy.market_index * (1.0 + drift + shock)).clamp(INDEX_FLOOR, INDEX_CEILING);

    let step = config.rate_step;
    let inflation_bias = if next.recession { -step } else { 0.0 };
    next.inflation_rate = (economy.inflation_rate
        + inflation_bias
        + (rng.next_f64() - 0.5) * 2.0 * step)
        .clamp(config.min_inflation_rate, config.max_inflation_rate);

    // Central bank cuts during recessions and leans against inflation otherwise.
    let rate_bias = if next.recession {
        -step
    } else if next.inflation_rate > config.base_inflation_rate {
        step * 0.5
    } else {
        0.0
    };
    next.interest_rate = (economy.interest_rate + rate_bias + (rng.next_f64() - 0.5) * step)
        .clamp(config.min_interest_rate, config.max_interest_rate);

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use crate::state::AssetKind;

    fn economy() -> Economy {
        Economy {
            interest_rate: 0.05,
            inflation_rate: 0.03,
            market_trend: MarketTrend::Stable,
            recession: false,
            recession_months: 0,
            market_index: 1.0,
        }
    }

    fn item(kind: AssetKind) -> CatalogItem {
        CatalogItem {
            id: "x".into(),
            name: "X".into(),
            kind,
            base_price: 1_000.0,
            expected_yield: 0.06,
            can_mortgage: false,
            required_education: None,
        }
    }

    #[test]
    fn price_month_zero_is_base() {
        assert_eq!(price_for_month(1_000.0, 0.03, 0), 1_000.0);
    }

    #[test]
    fn price_after_one_year() {
        assert_eq!(price_for_month(1_000.0, 0.03, 12), 1_030.0);
        assert_eq!(price_for_month(1_000.0, 0.03, 24), 1_061.0);
    }

    #[test]
    fn price_deflation_beyond_minus_100_is_zero() {
        assert_eq!(price_for_month(1_000.0, -1.5, 12), 0.0);
        assert_eq!(price_for_month(1_000.0, -1.0, 12), 0.0);
    }

    #[test]
    fn price_non_finite_input_is_zero() {
        assert_eq!(price_for_month(f64::NAN, 0.03, 12), 0.0);
        assert_eq!(price_for_month(f64::INFINITY, 0.03, 12), 0.0);
    }

    #[test]
    fn bonds_ignore_market_index() {
        let mut eco = economy();
        eco.market_index = 2.0;
        assert_eq!(current_price(&item(AssetKind::Bond), &eco, 0), 1_000.0);
        assert_eq!(current_price(&item(AssetKind::Stock), &eco, 0), 2_000.0);
        assert_eq!(current_price(&item(AssetKind::Crypto), &eco, 0), 4_000.0);
    }

    #[test]
    fn unit_cash_flow_is_monthly_yield() {
        assert!((unit_cash_flow(&item(AssetKind::RealEstate), 1_200.0) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn trend_transitions() {
        assert_eq!(next_trend(MarketTrend::Stable, 0.0), MarketTrend::Stable);
        assert_eq!(next_trend(MarketTrend::Stable, 0.99), MarketTrend::Crash);
        assert_eq!(next_trend(MarketTrend::Bull, 0.85), MarketTrend::Boom);
        assert_eq!(next_trend(MarketTrend::Crash, 0.5), MarketTrend::Bear);
    }

    #[test]
    fn transition_rows_end_at_one() {
        for trend in TREND_ORDER {
            let row = transition_row(trend);
            assert_eq!(row[4], 1.0);
            assert!(row.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn crash_starts_recession() {
        let config = EconomyConfig::default();
        let mut rng = ScriptedRandom::new(vec![0.99, 0.5, 0.5, 0.5]);
        let next = advance_economy(&economy(), &config, &mut rng);
        assert_eq!(next.market_trend, MarketTrend::Crash);
        assert!(next.recession);
        assert_eq!(next.recession_months, config.recession_length);
        assert!(next.market_index < 1.0);
    }

    #[test]
    fn recession_counts_down_and_clears() {
        let config = EconomyConfig::default();
        let mut eco = economy();
        eco.recession = true;
        eco.recession_months = 2;
        let mut rng = ScriptedRandom::constant(0.1);
        let eco = advance_economy(&eco, &config, &mut rng);
        assert!(eco.recession);
        assert_eq!(eco.recession_months, 1);
        let eco = advance_economy(&eco, &config, &mut rng);
        assert!(!eco.recession);
        assert_eq!(eco.recession_months, 0);
    }

    #[test]
    fn rates_stay_in_bounds() {
        let config = EconomyConfig::default();
        let mut eco = economy();
        let mut rng = ScriptedRandom::new(vec![0.99, 0.0, 0.0, 0.0, 0.3, 0.99, 0.99, 0.99]);
        for _ in 0..200 {
            eco = advance_economy(&eco, &config, &mut rng);
            assert!(eco.interest_rate >= config.min_interest_rate);
            assert!(eco.interest_rate <= config.max_interest_rate);
            assert!(eco.inflation_rate >= config.min_inflation_rate);
            assert!(eco.inflation_rate <= config.max_inflation_rate);
            assert!(eco.market_index >= INDEX_FLOOR && eco.market_index <= INDEX_CEILING);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_price_idempotent(base in 0.0f64..1e7, rate in -2.0f64..1.0, month in 0u32..600) {
            prop_assert_eq!(price_for_month(base, rate, month), price_for_month(base, rate, month));
        }

        #[test]
        fn prop_price_never_negative_or_nan(base in 0.0f64..1e7, rate in -5.0f64..1.0, month in 0u32..600) {
            let p = price_for_month(base, rate, month);
            prop_assert!(p.is_finite());
            prop_assert!(p >= 0.0);
        }

        #[test]
        fn prop_price_nondecreasing_with_positive_inflation(
            base in 1.0f64..1e6,
            rate in 0.0f64..0.2,
            month in 0u32..599,
        ) {
            prop_assert!(price_for_month(base, rate, month + 1) >= price_for_month(base, rate, month));
        }
    }
}
