//! Tycoon month advance: pure turn logic (no rendering / IO).

use thiserror::Error;

use crate::actions::{refresh_budget, OVERTIME_SHARE};
use crate::auto_invest;
use crate::config::GameConfig;
use crate::credit::{change_credit, ensure_month_entry};
use crate::economy::{advance_economy, price_for_month};
use crate::loans::{process_monthly_payments, PaymentSummary};
use crate::market::revalue_assets;
use crate::quests::latch_ready;
use crate::random::RandomSource;
use crate::state::{Boosts, GameState, GameStatus, MonthlyReport, Stat};

/// Debt service above this share of gross income hurts credit and mood.
pub const HIGH_DEBT_TO_INCOME: f64 = 0.43;
/// Monthly energy regained from ordinary rest.
pub const ENERGY_RECOVERY: i32 = 10;

pub const ON_TIME_BONUS: i32 = 2;
pub const MISSED_PAYMENT_PENALTY: i32 = 25;
pub const PAID_OFF_BONUS: i32 = 10;
pub const HIGH_DTI_PENALTY: i32 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum TurnError {
    #[error("the game has ended ({status:?})")]
    GameOver { status: GameStatus },
    #[error("resolve the pending decision first")]
    DecisionPending,
    #[error("there is no decision to resolve")]
    NoPendingDecision,
    #[error("option {index} does not exist ({available} available)")]
    InvalidOption { index: usize, available: usize },
}

// ── Advance Month ────────────────────────────────────────────────────

/// Advance the game by one full month. This is the core turn action.
pub fn advance_month(
    state: &GameState,
    config: &GameConfig,
    rng: &mut dyn RandomSource,
) -> Result<GameState, TurnError> {
    if state.is_game_over() {
        return Err(TurnError::GameOver { status: state.status });
    }
    if state.pending_decision.is_some() {
        return Err(TurnError::DecisionPending);
    }

    let mut next = state.clone();
    let boosts = std::mem::take(&mut next.boosts);

    // Income
    let overtime = boosts.overtime_shifts as f64 * OVERTIME_SHARE;
    let salary = next.career.monthly_salary * (1.0 + overtime);
    let side_income = next.side_hustle_income() * (1.0 + boosts.hustle_boost_percent as f64 / 100.0);
    let passive = next.passive_income();
    let income = salary + side_income + passive;
    next.cash += income;

    // Expenses and scheduled debt service
    let living = price_for_month(config.living_expenses, next.economy.inflation_rate, next.month);
    next.cash -= living;
    let payments = process_monthly_payments(&mut next, config);

    let disposable = income - living - payments.paid - payments.late_fees;
    let invested = auto_invest::run(&mut next, config, disposable);

    // New month
    next.month += 1;
    next.economy = advance_economy(&next.economy, &config.economy, rng);
    revalue_assets(&mut next, config);

    let debt_to_income = if salary + side_income > 0.0 {
        next.monthly_debt_service() / (salary + side_income)
    } else if next.monthly_debt_service() > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    apply_stat_drift(&mut next, debt_to_income, disposable);
    apply_credit_policy(&mut next, &payments, debt_to_income);
    ensure_month_entry(&mut next);

    maybe_life_event(&mut next, config, rng);
    refresh_budget(&mut next);
    latch_ready(&mut next, config);

    next.last_report = MonthlyReport {
        salary,
        side_income,
        passive_income: passive,
        living_expenses: living,
        debt_payments: payments.paid,
        missed_payments: payments.missed,
        auto_invested: invested,
        cashflow: disposable,
    };
    next.push_event(
        &format!("Month {}", next.month),
        &format!(
            "Income {:.2}, living {:.2}, debt {:.2} -> cashflow {:.2}",
            income, living, payments.paid, disposable
        ),
    );
    log::info!(
        "month {} closed: cash {:.2}, net worth {:.2}, credit {}",
        next.month,
        next.cash,
        next.net_worth(),
        next.credit_rating
    );

    check_outcome(&mut next, config, passive, living);
    Ok(next)
}

fn apply_stat_drift(state: &mut GameState, debt_to_income: f64, cashflow: f64) {
    state.stats.adjust(Stat::Energy, ENERGY_RECOVERY);

    let stress = if debt_to_income > HIGH_DEBT_TO_INCOME {
        5
    } else if cashflow < 0.0 {
        3
    } else {
        -2
    };
    state.stats.adjust(Stat::Stress, stress);

    let health = if state.stats.stress >= 80 { -4 } else { 1 };
    state.stats.adjust(Stat::Health, health);

    let happiness = if cashflow < 0.0 { -3 } else { 1 };
    state.stats.adjust(Stat::Happiness, happiness);
}

fn apply_credit_policy(state: &mut GameState, payments: &PaymentSummary, debt_to_income: f64) {
    if payments.missed > 0 {
        let penalty = MISSED_PAYMENT_PENALTY.saturating_mul(payments.missed as i32);
        change_credit(state, -penalty, &format!("Missed {} payment(s)", payments.missed));
        state.push_event(
            "Missed payment",
            &format!("{} installment(s) went unpaid; late fees charged.", payments.missed),
        );
    } else if payments.paid > 0.0 {
        change_credit(state, ON_TIME_BONUS, "On-time payments");
    }

    for name in &payments.paid_off {
        change_credit(state, PAID_OFF_BONUS, &format!("Paid off {}", name));
        state.push_event("Debt paid off", &format!("{} is fully repaid.", name));
    }

    if debt_to_income > HIGH_DEBT_TO_INCOME {
        change_credit(state, -HIGH_DTI_PENALTY, "High debt-to-income ratio");
    }
}

/// Roll for a blocking life event. Always consumes exactly one roll, plus
/// one more to pick the event when it fires.
fn maybe_life_event(state: &mut GameState, config: &GameConfig, rng: &mut dyn RandomSource) {
    let roll = rng.next_f64();
    if config.life_events.is_empty() || roll >= config.life_event_chance {
        return;
    }
    let last = (config.life_events.len() - 1) as u32;
    let pick = rng.next_in_range(0, last) as usize;
    if let Some(decision) = config.life_events.get(pick) {
        state.push_event(&decision.title, &decision.description);
        state.pending_decision = Some(decision.clone());
        log::debug!("life event {} at month {}", decision.id, state.month);
    }
}

fn check_outcome(state: &mut GameState, config: &GameConfig, passive: f64, living: f64) {
    let net_worth = state.net_worth();
    if (living > 0.0 && passive >= living) || net_worth >= config.goal_net_worth {
        state.status = GameStatus::Won;
        state.push_event(
            "Financial freedom!",
            &format!(
                "Passive income {:.2}/month, net worth {:.2} after {} months.",
                passive, net_worth, state.month
            ),
        );
    } else if state.cash < 0.0 && net_worth < 0.0 {
        state.status = GameStatus::Bankrupt;
        state.push_event(
            "Bankrupt",
            &format!("Cash {:.2} and net worth {:.2}.", state.cash, net_worth),
        );
    } else if state.month >= config.max_months {
        state.status = GameStatus::TimeUp;
        state.push_event(
            "Time is up",
            &format!("{} months passed. Final net worth {:.2}.", state.month, net_worth),
        );
    }

    if state.is_game_over() {
        state.pending_decision = None;
        state.boosts = Boosts::default();
        log::info!("game over at month {}: {:?}", state.month, state.status);
    }
}

// ── Decisions ─────────────────────────────────────────────────────────

/// Apply the chosen option of the pending life event.
pub fn resolve_decision(state: &GameState, option_index: usize) -> Result<GameState, TurnError> {
    if state.is_game_over() {
        return Err(TurnError::GameOver { status: state.status });
    }
    let decision = state
        .pending_decision
        .as_ref()
        .ok_or(TurnError::NoPendingDecision)?;
    let option = decision
        .options
        .get(option_index)
        .ok_or(TurnError::InvalidOption {
            index: option_index,
            available: decision.options.len(),
        })?;

    let mut next = state.clone();
    next.pending_decision = None;
    next.cash += option.cash;
    next.stats.apply(&option.stats);
    if option.credit != 0 {
        change_credit(&mut next, option.credit, &format!("{}: {}", decision.title, option.label));
    }
    next.push_event(&decision.title, &option.label);

    if next.cash < 0.0 && next.net_worth() < 0.0 {
        next.status = GameStatus::Bankrupt;
        next.push_event("Bankrupt", "This expense pushed you under.");
    }
    Ok(next)
}
