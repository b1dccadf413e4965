//! Auto-invest allocator.

use thiserror::Error;

use crate::config::GameConfig;
use crate::economy::{current_price, unit_cash_flow};
use crate::state::{Asset, AutoInvest, GameState};

/// Highest share of disposable income auto-invest may use.
pub const MAX_PERCENT_CAP: u8 = 50;

#[derive(Debug, Error, PartialEq)]
pub enum AutoInvestError {
    #[error("max percent {0} is above the {MAX_PERCENT_CAP}% cap")]
    MaxPercentTooHigh(u8),
    #[error("allocations add up to {0}%, more than 100%")]
    OverAllocated(u32),
    #[error("unknown item {0}")]
    UnknownItem(String),
    #[error("{0} is bought with a mortgage, not through auto-invest")]
    MortgageableItem(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Purchase {
    pub item_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub cost: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AutoInvestPlan {
    pub purchases: Vec<Purchase>,
    pub total_cost: f64,
}

/// Whole units to buy per allocation, in list order, never spending more
/// than `disposable_income` in total. Unspent budget is not carried over.
pub fn plan(
    settings: &AutoInvest,
    disposable_income: f64,
    price_of: impl Fn(&str) -> Option<f64>,
) -> AutoInvestPlan {
    let mut result = AutoInvestPlan::default();
    if !settings.enabled || !(disposable_income > 0.0) {
        return result;
    }

    let mut remaining = disposable_income;
    for alloc in &settings.allocations {
        let percent = alloc.percent.min(settings.max_percent) as f64;
        let budget = (disposable_income * percent / 100.0).min(remaining);
        let price = match price_of(&alloc.item_id) {
            Some(p) if p > 0.0 && p <= budget => p,
            _ => continue,
        };
        let quantity = (budget / price).floor() as u32;
        if quantity == 0 {
            continue;
        }
        let cost = quantity as f64 * price;
        remaining -= cost;
        result.total_cost += cost;
        result.purchases.push(Purchase {
            item_id: alloc.item_id.clone(),
            quantity,
            unit_price: price,
            cost,
        });
    }
    result
}

/// Replace the auto-invest settings after validating them.
pub fn configure(
    state: &GameState,
    config: &GameConfig,
    settings: AutoInvest,
) -> Result<GameState, AutoInvestError> {
    if settings.max_percent > MAX_PERCENT_CAP {
        return Err(AutoInvestError::MaxPercentTooHigh(settings.max_percent));
    }
    let total: u32 = settings.allocations.iter().map(|a| a.percent as u32).sum();
    if total > 100 {
        return Err(AutoInvestError::OverAllocated(total));
    }
    if let Some(bad) = settings
        .allocations
        .iter()
        .find(|a| config.item(&a.item_id).is_none())
    {
        return Err(AutoInvestError::UnknownItem(bad.item_id.clone()));
    }
    if let Some(bad) = settings
        .allocations
        .iter()
        .find(|a| config.item(&a.item_id).is_some_and(|i| i.can_mortgage))
    {
        return Err(AutoInvestError::MortgageableItem(bad.item_id.clone()));
    }

    let mut next = state.clone();
    next.auto_invest = settings;
    Ok(next)
}

/// Buy the planned positions, returning the new state.
pub fn apply_plan(state: &GameState, config: &GameConfig, plan: &AutoInvestPlan) -> GameState {
    let mut next = state.clone();
    buy_positions(&mut next, config, plan);
    next
}

/// Adds to existing holdings. A purchase the cash no longer covers, or one
/// that would grow a mortgaged position, is skipped.
fn buy_positions(state: &mut GameState, config: &GameConfig, plan: &AutoInvestPlan) {
    for purchase in &plan.purchases {
        let Some(item) = config.item(&purchase.item_id) else {
            continue;
        };
        if purchase.cost > state.cash {
            log::warn!("auto-invest skipped {}: insufficient cash", purchase.item_id);
            continue;
        }
        if state.asset(&item.id).is_some_and(|a| a.mortgage_id.is_some()) {
            log::warn!("auto-invest skipped {}: position carries a mortgage", item.id);
            continue;
        }
        state.cash -= purchase.cost;
        let flow = unit_cash_flow(item, purchase.unit_price) * purchase.quantity as f64;
        match state.assets.iter_mut().find(|a| a.id == purchase.item_id) {
            Some(asset) => {
                asset.quantity += purchase.quantity;
                asset.cost_basis += purchase.cost;
                asset.cash_flow += flow;
                asset.value = purchase.unit_price;
            }
            None => state.assets.push(Asset {
                id: item.id.clone(),
                kind: item.kind,
                quantity: purchase.quantity,
                value: purchase.unit_price,
                cost_basis: purchase.cost,
                cash_flow: flow,
                mortgage_id: None,
            }),
        }
    }
}

/// Plan and execute auto-invest for `disposable_income` at current prices.
pub(crate) fn run(state: &mut GameState, config: &GameConfig, disposable_income: f64) -> f64 {
    let budget = disposable_income.min(state.cash);
    let economy = state.economy.clone();
    let month = state.month;
    let planned = plan(&state.auto_invest, budget, |id| {
        config.item(id).map(|item| current_price(item, &economy, month))
    });
    buy_positions(state, config, &planned);
    if planned.total_cost > 0.0 {
        state.push_event(
            "Auto-invest",
            &format!("Invested {:.2} across {} positions.", planned.total_cost, planned.purchases.len()),
        );
    }
    planned.total_cost
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::state::Allocation;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_plan_never_overspends(
            income in -100.0f64..100_000.0,
            max_percent in 0u8..=100,
            percents in proptest::collection::vec(0u8..=100, 0..6),
            price in 0.5f64..5_000.0,
        ) {
            let settings = AutoInvest {
                enabled: true,
                max_percent,
                allocations: percents
                    .iter()
                    .enumerate()
                    .map(|(i, p)| Allocation { item_id: format!("item{}", i), percent: *p })
                    .collect(),
            };
            let p = plan(&settings, income, |_| Some(price));
            prop_assert!(p.total_cost <= income.max(0.0) + 1e-6);
            for purchase in &p.purchases {
                prop_assert!(purchase.quantity > 0);
            }
        }
    }
}
