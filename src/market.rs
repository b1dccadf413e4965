//! Buying and selling catalog assets, with optional mortgage financing.

use thiserror::Error;

use crate::config::{CatalogItem, GameConfig};
use crate::credit::change_credit;
use crate::economy::{current_price, unit_cash_flow};
use crate::loans::{calculate_loan_payment, offered_rate, refinance, round_cents, LoanError};
use crate::state::{Asset, Education, GameState, Mortgage};

#[derive(Debug, Error, PartialEq)]
pub enum MarketError {
    #[error("unknown item {id}")]
    UnknownItem { id: String },
    #[error("requires {required:?} education (you have {current:?})")]
    EducationRequired { required: Education, current: Education },
    #[error("quantity must be at least one")]
    ZeroQuantity,
    #[error("not enough cash (need {required}, have {available})")]
    InsufficientCash { required: f64, available: f64 },
    #[error("you do not own {id}")]
    NotOwned { id: String },
    #[error("you own {owned} units, cannot sell {requested}")]
    InsufficientQuantity { owned: u32, requested: u32 },
    #[error("{id} cannot be bought with a mortgage")]
    NotMortgageable { id: String },
    #[error("you already own {id}")]
    AlreadyOwned { id: String },
    #[error("a mortgaged position must be sold in full")]
    MortgagedPartialSale { id: String },
    #[error("{id} carries a mortgage; sell it before buying more")]
    MortgagedPosition { id: String },
    #[error("credit score {current} is below the required {required}")]
    CreditTooLow { required: i32, current: i32 },
    #[error("no mortgage with id {id}")]
    UnknownMortgage { id: String },
    #[error(transparent)]
    Loan(#[from] LoanError),
    #[error("the game has ended")]
    GameOver,
}

fn lookup<'a>(config: &'a GameConfig, item_id: &str) -> Result<&'a CatalogItem, MarketError> {
    config
        .item(item_id)
        .ok_or_else(|| MarketError::UnknownItem { id: item_id.to_string() })
}

fn check_education(state: &GameState, item: &CatalogItem) -> Result<(), MarketError> {
    match item.required_education {
        Some(required) if state.education < required => Err(MarketError::EducationRequired {
            required,
            current: state.education,
        }),
        _ => Ok(()),
    }
}

/// Add units to a position, creating it if needed.
fn add_position(state: &mut GameState, item: &CatalogItem, quantity: u32, unit_price: f64, cost: f64) {
    let flow = unit_cash_flow(item, unit_price) * quantity as f64;
    match state.assets.iter_mut().find(|a| a.id == item.id) {
        Some(asset) => {
            asset.quantity += quantity;
            asset.cost_basis += cost;
            asset.cash_flow += flow;
            asset.value = unit_price;
        }
        None => state.assets.push(Asset {
            id: item.id.clone(),
            kind: item.kind,
            quantity,
            value: unit_price,
            cost_basis: cost,
            cash_flow: flow,
            mortgage_id: None,
        }),
    }
}

/// Buy `quantity` units for cash at the current price.
pub fn buy_asset(
    state: &GameState,
    config: &GameConfig,
    item_id: &str,
    quantity: u32,
) -> Result<GameState, MarketError> {
    if state.is_game_over() {
        return Err(MarketError::GameOver);
    }
    let item = lookup(config, item_id)?;
    check_education(state, item)?;
    if quantity == 0 {
        return Err(MarketError::ZeroQuantity);
    }
    if state.asset(item_id).is_some_and(|a| a.mortgage_id.is_some()) {
        return Err(MarketError::MortgagedPosition { id: item_id.to_string() });
    }
    let price = current_price(item, &state.economy, state.month);
    let cost = price * quantity as f64;
    if cost > state.cash {
        return Err(MarketError::InsufficientCash {
            required: cost,
            available: state.cash,
        });
    }

    let mut next = state.clone();
    next.cash -= cost;
    add_position(&mut next, item, quantity, price, cost);
    next.push_event(
        "Purchase",
        &format!("Bought {} x {} for {:.2}.", quantity, item.name, cost),
    );
    log::debug!("bought {} x {} at {:.2}", quantity, item_id, price);
    Ok(next)
}

/// Sell units at the current price. A mortgaged position must be sold in
/// full and its mortgage is repaid out of the proceeds first.
pub fn sell_asset(
    state: &GameState,
    config: &GameConfig,
    item_id: &str,
    quantity: u32,
) -> Result<GameState, MarketError> {
    if state.is_game_over() {
        return Err(MarketError::GameOver);
    }
    let item = lookup(config, item_id)?;
    if quantity == 0 {
        return Err(MarketError::ZeroQuantity);
    }
    let asset = state
        .asset(item_id)
        .ok_or_else(|| MarketError::NotOwned { id: item_id.to_string() })?;
    if quantity > asset.quantity {
        return Err(MarketError::InsufficientQuantity {
            owned: asset.quantity,
            requested: quantity,
        });
    }
    if asset.mortgage_id.is_some() && quantity < asset.quantity {
        return Err(MarketError::MortgagedPartialSale { id: item_id.to_string() });
    }

    let price = current_price(item, &state.economy, state.month);
    let proceeds = price * quantity as f64;
    let payoff = asset
        .mortgage_id
        .as_ref()
        .and_then(|id| state.mortgages.iter().find(|m| &m.id == id))
        .map(|m| m.balance)
        .unwrap_or(0.0);
    if payoff > proceeds + state.cash {
        return Err(MarketError::InsufficientCash {
            required: payoff - proceeds,
            available: state.cash,
        });
    }

    let mut next = state.clone();
    next.cash += proceeds - payoff;
    if let Some(mortgage_id) = asset.mortgage_id.as_ref() {
        next.mortgages.retain(|m| &m.id != mortgage_id);
        change_credit(&mut next, 10, &format!("Paid off mortgage on {}", item.name));
    }

    let remaining = asset.quantity - quantity;
    if remaining == 0 {
        next.assets.retain(|a| a.id != item_id);
    } else if let Some(held) = next.assets.iter_mut().find(|a| a.id == item_id) {
        let share = remaining as f64 / held.quantity as f64;
        held.quantity = remaining;
        held.cost_basis *= share;
        held.cash_flow *= share;
        held.value = price;
    }

    next.push_event(
        "Sale",
        &format!("Sold {} x {} for {:.2}.", quantity, item.name, proceeds),
    );
    Ok(next)
}

/// Buy one unit of a mortgageable property with a down payment.
pub fn buy_with_mortgage(
    state: &GameState,
    config: &GameConfig,
    item_id: &str,
) -> Result<GameState, MarketError> {
    if state.is_game_over() {
        return Err(MarketError::GameOver);
    }
    let item = lookup(config, item_id)?;
    if !item.can_mortgage {
        return Err(MarketError::NotMortgageable { id: item_id.to_string() });
    }
    check_education(state, item)?;
    if state.asset(item_id).is_some() {
        return Err(MarketError::AlreadyOwned { id: item_id.to_string() });
    }
    let terms = &config.mortgage;
    if state.credit_rating < terms.min_credit {
        return Err(MarketError::CreditTooLow {
            required: terms.min_credit,
            current: state.credit_rating,
        });
    }

    let price = current_price(item, &state.economy, state.month);
    let down = round_cents(price * terms.down_payment);
    if down > state.cash {
        return Err(MarketError::InsufficientCash {
            required: down,
            available: state.cash,
        });
    }
    let principal = price - down;
    let rate = offered_rate(state, config, terms.spread);
    let payment = calculate_loan_payment(principal, rate, terms.term_months)?;

    let mut next = state.clone();
    let mortgage_id = next.allocate_loan_id();
    next.cash -= down;
    next.mortgages.push(Mortgage {
        id: mortgage_id.clone(),
        asset_id: item.id.clone(),
        balance: principal,
        interest_rate: rate,
        monthly_payment: payment,
        original_balance: principal,
        term_months: terms.term_months,
    });
    add_position(&mut next, item, 1, price, price);
    if let Some(asset) = next.assets.iter_mut().find(|a| a.id == item.id) {
        asset.mortgage_id = Some(mortgage_id);
    }
    change_credit(&mut next, -5, &format!("Mortgage inquiry: {}", item.name));
    next.push_event(
        "Mortgage approved",
        &format!(
            "{} bought with {:.2} down; {:.2}/month at {:.2}%.",
            item.name,
            down,
            payment,
            rate * 100.0
        ),
    );
    log::info!("mortgage on {}: {:.2} at {:.4}", item_id, principal, rate);
    Ok(next)
}

/// Re-price a mortgage at today's rate over `term_months`.
pub fn refinance_mortgage(
    state: &GameState,
    config: &GameConfig,
    mortgage_id: &str,
    term_months: u32,
) -> Result<GameState, MarketError> {
    if state.is_game_over() {
        return Err(MarketError::GameOver);
    }
    let mortgage = state
        .mortgages
        .iter()
        .find(|m| m.id == mortgage_id)
        .ok_or_else(|| MarketError::UnknownMortgage { id: mortgage_id.to_string() })?;
    if state.credit_rating < config.refinance_min_score {
        return Err(MarketError::CreditTooLow {
            required: config.refinance_min_score,
            current: state.credit_rating,
        });
    }

    let rate = offered_rate(state, config, config.mortgage.spread);
    let updated = refinance(mortgage, rate, term_months)?;
    let old_payment = mortgage.monthly_payment;

    let mut next = state.clone();
    if let Some(slot) = next.mortgages.iter_mut().find(|m| m.id == mortgage_id) {
        *slot = updated.clone();
    }
    next.push_event(
        "Refinanced",
        &format!(
            "Payment {:.2} -> {:.2} at {:.2}% over {} months.",
            old_payment,
            updated.monthly_payment,
            rate * 100.0,
            term_months
        ),
    );
    Ok(next)
}

/// Re-price every position at the current economy and month.
pub(crate) fn revalue_assets(state: &mut GameState, config: &GameConfig) {
    let economy = state.economy.clone();
    let month = state.month;
    for asset in state.assets.iter_mut() {
        if let Some(item) = config.item(&asset.id) {
            asset.value = current_price(item, &economy, month);
            asset.cash_flow = unit_cash_flow(item, asset.value) * asset.quantity as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameStatus;

    fn setup() -> (GameState, GameConfig) {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, 1);
        state.cash = 100_000.0;
        (state, config)
    }

    #[test]
    fn buy_then_sell_round_trip_at_same_price() {
        let (s, config) = setup();
        let bought = buy_asset(&s, &config, "index_fund", 10).unwrap();
        assert_eq!(bought.asset("index_fund").map(|a| a.quantity), Some(10));
        assert!((bought.cash - 99_000.0).abs() < 1e-9);
        let sold = sell_asset(&bought, &config, "index_fund", 10).unwrap();
        assert!(sold.asset("index_fund").is_none());
        assert!((sold.cash - 100_000.0).abs() < 1e-9);
    }

    #[test]
    fn partial_sale_scales_position() {
        let (s, config) = setup();
        let s = buy_asset(&s, &config, "gov_bond", 4).unwrap();
        let flow = s.asset("gov_bond").unwrap().cash_flow;
        let s = sell_asset(&s, &config, "gov_bond", 1).unwrap();
        let held = s.asset("gov_bond").unwrap();
        assert_eq!(held.quantity, 3);
        assert!((held.cash_flow - flow * 0.75).abs() < 1e-9);
    }

    #[test]
    fn buy_rejections() {
        let (mut s, config) = setup();
        assert!(matches!(buy_asset(&s, &config, "nope", 1), Err(MarketError::UnknownItem { .. })));
        assert_eq!(buy_asset(&s, &config, "index_fund", 0), Err(MarketError::ZeroQuantity));
        assert!(matches!(
            buy_asset(&s, &config, "startup_stake", 1),
            Err(MarketError::EducationRequired { required: Education::Master, .. })
        ));
        s.cash = 50.0;
        assert!(matches!(
            buy_asset(&s, &config, "index_fund", 1),
            Err(MarketError::InsufficientCash { .. })
        ));
        s.status = GameStatus::Bankrupt;
        assert_eq!(buy_asset(&s, &config, "index_fund", 1), Err(MarketError::GameOver));
    }

    #[test]
    fn sell_rejections() {
        let (s, config) = setup();
        assert!(matches!(sell_asset(&s, &config, "index_fund", 1), Err(MarketError::NotOwned { .. })));
        let s = buy_asset(&s, &config, "index_fund", 2).unwrap();
        assert_eq!(
            sell_asset(&s, &config, "index_fund", 3),
            Err(MarketError::InsufficientQuantity { owned: 2, requested: 3 })
        );
    }

    #[test]
    fn mortgage_purchase_links_debt() {
        let (s, config) = setup();
        let s = buy_with_mortgage(&s, &config, "condo").unwrap();
        let asset = s.asset("condo").unwrap();
        let mortgage_id = asset.mortgage_id.clone().unwrap();
        let mortgage = s.mortgages.iter().find(|m| m.id == mortgage_id).unwrap();
        assert_eq!(mortgage.asset_id, "condo");
        assert!((mortgage.balance - 120_000.0).abs() < 1e-6);
        assert!((s.cash - 70_000.0).abs() < 1e-6);
        assert!(mortgage.monthly_payment > 0.0);
    }

    #[test]
    fn mortgage_rejections() {
        let (mut s, config) = setup();
        assert!(matches!(
            buy_with_mortgage(&s, &config, "index_fund"),
            Err(MarketError::NotMortgageable { .. })
        ));
        let owned = buy_with_mortgage(&s, &config, "condo").unwrap();
        assert!(matches!(
            buy_with_mortgage(&owned, &config, "condo"),
            Err(MarketError::AlreadyOwned { .. })
        ));
        s.credit_rating = 500;
        assert!(matches!(
            buy_with_mortgage(&s, &config, "condo"),
            Err(MarketError::CreditTooLow { required: 620, .. })
        ));
    }

    #[test]
    fn cash_buy_cannot_grow_mortgaged_position() {
        let (s, config) = setup();
        let mut s = buy_with_mortgage(&s, &config, "condo").unwrap();
        s.cash = 1_000_000.0;
        assert_eq!(
            buy_asset(&s, &config, "condo", 1),
            Err(MarketError::MortgagedPosition { id: "condo".into() })
        );
        assert_eq!(s.asset("condo").map(|a| a.quantity), Some(1));
    }

    #[test]
    fn selling_mortgaged_property_repays_first() {
        let (s, config) = setup();
        let s = buy_with_mortgage(&s, &config, "condo").unwrap();
        assert!(matches!(
            sell_asset(&s, &config, "condo", 0),
            Err(MarketError::ZeroQuantity)
        ));
        let sold = sell_asset(&s, &config, "condo", 1).unwrap();
        assert!(sold.mortgages.is_empty());
        assert!(sold.asset("condo").is_none());
        // 150k sale - 120k payoff on top of 70k cash left after the down payment.
        assert!((sold.cash - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn refinance_needs_score() {
        let (s, config) = setup();
        let mut s = buy_with_mortgage(&s, &config, "condo").unwrap();
        let id = s.mortgages[0].id.clone();
        s.credit_rating = 650;
        assert!(matches!(
            refinance_mortgage(&s, &config, &id, 240),
            Err(MarketError::CreditTooLow { required: 680, .. })
        ));
        s.credit_rating = 760;
        s.economy.interest_rate = 0.03;
        let old = s.mortgages[0].monthly_payment;
        let next = refinance_mortgage(&s, &config, &id, 360).unwrap();
        assert!(next.mortgages[0].monthly_payment < old);
        assert_eq!(next.mortgages[0].balance, s.mortgages[0].balance);
        assert!(matches!(
            refinance_mortgage(&s, &config, "loan-999", 360),
            Err(MarketError::UnknownMortgage { .. })
        ));
    }

    #[test]
    fn revalue_tracks_market_index() {
        let (s, config) = setup();
        let mut s = buy_asset(&s, &config, "index_fund", 10).unwrap();
        s.economy.market_index = 1.5;
        revalue_assets(&mut s, &config);
        let held = s.asset("index_fund").unwrap();
        assert_eq!(held.value, 150.0);
        assert!((held.market_value() - 1_500.0).abs() < 1e-9);
    }
}
