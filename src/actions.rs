//! Monthly action resolver.
//!
//! Each month the player gets a small budget of actions (1..=4) derived
//! from stats and career level. Each action is a variant of
//! `MonthlyAction` with its own eligibility rule and effect; applying one
//! returns a new state or a specific reason why it is disabled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::random::RandomSource;
use crate::state::{GameState, GameStatus, Stat, Stats, ACTIONS_MAX, ACTIONS_MIN};

/// Minimum energy for any action that costs effort.
pub const MIN_WORK_ENERGY: i32 = 20;
pub const NETWORK_COST: f64 = 100.0;
pub const NETWORK_MAX_BONUS: u32 = 500;
pub const TRAINING_COST: f64 = 300.0;
/// Share of next month's salary paid out for overtime.
pub const OVERTIME_SHARE: f64 = 0.10;
/// Side-hustle income boost per sprint.
pub const HUSTLE_SPRINT_PERCENT: u32 = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonthlyAction {
    Overtime,
    Network,
    Training,
    HustleSprint,
    Recover,
}

pub const ALL_ACTIONS: [MonthlyAction; 5] = [
    MonthlyAction::Overtime,
    MonthlyAction::Network,
    MonthlyAction::Training,
    MonthlyAction::HustleSprint,
    MonthlyAction::Recover,
];

impl MonthlyAction {
    pub fn id(self) -> &'static str {
        match self {
            MonthlyAction::Overtime => "OVERTIME",
            MonthlyAction::Network => "NETWORK",
            MonthlyAction::Training => "TRAINING",
            MonthlyAction::HustleSprint => "HUSTLE_SPRINT",
            MonthlyAction::Recover => "RECOVER",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MonthlyAction::Overtime => "Work overtime",
            MonthlyAction::Network => "Go networking",
            MonthlyAction::Training => "Take a course",
            MonthlyAction::HustleSprint => "Side-hustle sprint",
            MonthlyAction::Recover => "Rest and recover",
        }
    }
}

impl fmt::Display for MonthlyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown monthly action {0}")]
pub struct UnknownAction(pub String);

impl FromStr for MonthlyAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ACTIONS
            .iter()
            .copied()
            .find(|a| a.id() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Why the whole action set is unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockReason {
    DecisionPending,
    GameWon,
    Bankrupt,
    TimeUp,
    Processing,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LockReason::DecisionPending => "resolve the pending decision first",
            LockReason::GameWon => "the game is won",
            LockReason::Bankrupt => "you are bankrupt",
            LockReason::TimeUp => "the game is over",
            LockReason::Processing => "the month is being processed",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("actions locked: {0}")]
    Locked(LockReason),
    #[error("no actions left this month")]
    NoActionsRemaining,
    #[error("too tired (energy {current}, need {required})")]
    TooTired { required: i32, current: i32 },
    #[error("not enough cash (need {required}, have {available})")]
    InsufficientCash { required: f64, available: f64 },
    #[error("no active side hustle")]
    NoActiveSideHustle,
}

/// Host-side flags the resolver cannot see in the state itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolverContext {
    pub processing: bool,
}

// ── Budget ────────────────────────────────────────────────────────────

fn stat_bonus(stats: &Stats) -> bool {
    stats.energy >= 70 && stats.stress <= 60
}

fn stat_penalty(stats: &Stats) -> bool {
    stats.energy < 35 || stats.stress >= 85 || stats.health < 30
}

fn career_bonus(career_level: u32) -> bool {
    career_level >= 3
}

/// Actions available this month: base 2, bonuses and penalty summed, clamped last.
pub fn compute_max(stats: &Stats, career_level: u32) -> u8 {
    let mut max: i32 = 2;
    if stat_bonus(stats) {
        max += 1;
    }
    if career_bonus(career_level) {
        max += 1;
    }
    if stat_penalty(stats) {
        max -= 1;
    }
    max.clamp(ACTIONS_MIN as i32, ACTIONS_MAX as i32) as u8
}

/// One explanation for this month's budget (first matching rule wins).
pub fn budget_reason(stats: &Stats, career_level: u32) -> &'static str {
    if stat_bonus(stats) {
        "Well rested and calm: +1 action this month."
    } else if stat_penalty(stats) {
        "Exhausted, stressed, or unwell: -1 action this month."
    } else if career_bonus(career_level) {
        "Your seniority buys you an extra action."
    } else {
        "Keep energy high and stress low to earn extra actions."
    }
}

/// Reset the action budget for a new month.
pub fn refresh_budget(state: &mut GameState) {
    let max = compute_max(&state.stats, state.career.level);
    state.monthly_actions_max = max;
    state.monthly_actions_remaining = max;
}

// ── Eligibility ───────────────────────────────────────────────────────

/// Shared lock over every action, if any.
pub fn lock_reason(state: &GameState, ctx: &ResolverContext) -> Option<LockReason> {
    if state.pending_decision.is_some() {
        return Some(LockReason::DecisionPending);
    }
    match state.status {
        GameStatus::Won => return Some(LockReason::GameWon),
        GameStatus::Bankrupt => return Some(LockReason::Bankrupt),
        GameStatus::TimeUp => return Some(LockReason::TimeUp),
        GameStatus::Playing => {}
    }
    if ctx.processing {
        return Some(LockReason::Processing);
    }
    None
}

fn require_energy(stats: &Stats) -> Result<(), ActionError> {
    if stats.energy < MIN_WORK_ENERGY {
        return Err(ActionError::TooTired {
            required: MIN_WORK_ENERGY,
            current: stats.energy,
        });
    }
    Ok(())
}

fn require_cash(state: &GameState, amount: f64) -> Result<(), ActionError> {
    if state.cash < amount {
        return Err(ActionError::InsufficientCash {
            required: amount,
            available: state.cash,
        });
    }
    Ok(())
}

/// Action-specific rule plus the remaining budget. Does not check the lock.
pub fn check_eligibility(state: &GameState, action: MonthlyAction) -> Result<(), ActionError> {
    if state.monthly_actions_remaining == 0 {
        return Err(ActionError::NoActionsRemaining);
    }
    match action {
        MonthlyAction::Overtime => require_energy(&state.stats),
        MonthlyAction::Network => require_cash(state, NETWORK_COST),
        MonthlyAction::Training => {
            require_energy(&state.stats)?;
            require_cash(state, TRAINING_COST)
        }
        MonthlyAction::HustleSprint => {
            require_energy(&state.stats)?;
            if state.side_hustles.is_empty() {
                return Err(ActionError::NoActiveSideHustle);
            }
            Ok(())
        }
        MonthlyAction::Recover => Ok(()),
    }
}

/// Status of every action, for the host to render buttons.
///
/// When locked, every entry carries the same `Locked` reason and no
/// per-action rule is evaluated.
pub fn availability(
    state: &GameState,
    ctx: &ResolverContext,
) -> Vec<(MonthlyAction, Result<(), ActionError>)> {
    if let Some(reason) = lock_reason(state, ctx) {
        return ALL_ACTIONS
            .iter()
            .map(|&a| (a, Err(ActionError::Locked(reason))))
            .collect();
    }
    ALL_ACTIONS
        .iter()
        .map(|&a| (a, check_eligibility(state, a)))
        .collect()
}

// ── Apply ─────────────────────────────────────────────────────────────

/// Validate and apply one action, consuming one unit of the budget.
pub fn apply_action(
    state: &GameState,
    ctx: &ResolverContext,
    action: MonthlyAction,
    rng: &mut dyn RandomSource,
) -> Result<GameState, ActionError> {
    if let Some(reason) = lock_reason(state, ctx) {
        return Err(ActionError::Locked(reason));
    }
    check_eligibility(state, action)?;

    let mut next = state.clone();
    let summary = match action {
        MonthlyAction::Overtime => {
            next.boosts.overtime_shifts += 1;
            next.stats.adjust(Stat::Energy, -15);
            next.stats.adjust(Stat::Stress, 12);
            format!(
                "Overtime adds {:.0}% to next month's pay.",
                next.boosts.overtime_shifts as f64 * OVERTIME_SHARE * 100.0
            )
        }
        MonthlyAction::Network => {
            next.cash -= NETWORK_COST;
            let bonus = rng.next_in_range(0, NETWORK_MAX_BONUS) as f64;
            next.cash += bonus;
            next.stats.adjust(Stat::Networking, 12);
            if bonus > 0.0 {
                format!("A contact sent paid work your way: +{:.0}.", bonus)
            } else {
                "Good conversations, no leads yet.".to_string()
            }
        }
        MonthlyAction::Training => {
            next.cash -= TRAINING_COST;
            next.stats.adjust(Stat::FinancialIq, 12);
            next.stats.adjust(Stat::Energy, -8);
            next.stats.adjust(Stat::Stress, 4);
            "You finished a personal finance course.".to_string()
        }
        MonthlyAction::HustleSprint => {
            next.boosts.hustle_boost_percent += HUSTLE_SPRINT_PERCENT;
            next.stats.adjust(Stat::Energy, -12);
            next.stats.adjust(Stat::Stress, 10);
            format!(
                "Side-hustle income next month +{}%.",
                next.boosts.hustle_boost_percent
            )
        }
        MonthlyAction::Recover => {
            next.stats.adjust(Stat::Energy, 18);
            next.stats.adjust(Stat::Stress, -15);
            next.stats.adjust(Stat::Health, 4);
            "A quiet weekend recharges you.".to_string()
        }
    };

    next.monthly_actions_remaining -= 1;
    next.push_event(action.name(), &summary);
    log::debug!(
        "action {} applied, {} remaining",
        action,
        next.monthly_actions_remaining
    );
    Ok(next)
}
