//! Quest tracker.
//!
//! Quests move `active -> ready_to_claim -> completed`. Readiness is a
//! one-way latch: once a target is met the quest stays claimable even if
//! the metric later falls back below it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::credit::change_credit;
use crate::state::{GameState, QuestStatus, StatChanges};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestUnit {
    Money,
    Months,
    Score,
}

/// What a quest measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestMetric {
    Cash,
    NetWorth,
    PassiveIncome,
    MonthsPlayed,
    CreditScore,
    FinancialIq,
}

impl QuestMetric {
    pub fn unit(self) -> QuestUnit {
        match self {
            QuestMetric::Cash | QuestMetric::NetWorth | QuestMetric::PassiveIncome => {
                QuestUnit::Money
            }
            QuestMetric::MonthsPlayed => QuestUnit::Months,
            QuestMetric::CreditScore | QuestMetric::FinancialIq => QuestUnit::Score,
        }
    }

    pub fn current(self, state: &GameState) -> f64 {
        match self {
            QuestMetric::Cash => state.cash,
            QuestMetric::NetWorth => state.net_worth(),
            QuestMetric::PassiveIncome => state.passive_income(),
            QuestMetric::MonthsPlayed => state.month as f64,
            QuestMetric::CreditScore => state.credit_rating as f64,
            QuestMetric::FinancialIq => state.stats.financial_iq as f64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestGoal {
    pub metric: QuestMetric,
    pub target: f64,
}

/// One-time reward. Each part is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestReward {
    pub cash: Option<f64>,
    pub credit: Option<i32>,
    pub stats: Option<StatChanges>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestDef {
    pub id: String,
    pub title: String,
    pub goal: QuestGoal,
    #[serde(default)]
    pub reward: QuestReward,
    #[serde(default)]
    pub starts_active: bool,
    /// Quests activated when this one is claimed.
    #[serde(default)]
    pub unlocks: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum QuestError {
    #[error("unknown quest {id}")]
    Unknown { id: String },
    #[error("quest {id} is not ready to claim")]
    NotReady { id: String },
}

/// Fraction of the target reached, in `[0, 1]`.
pub fn progress(def: &QuestDef, state: &GameState) -> f64 {
    if def.goal.target <= 0.0 {
        return 1.0;
    }
    let ratio = def.goal.metric.current(state) / def.goal.target;
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

pub fn is_met(def: &QuestDef, state: &GameState) -> bool {
    def.goal.metric.current(state) >= def.goal.target
}

/// Latch every active quest whose target is met.
pub(crate) fn latch_ready(state: &mut GameState, config: &GameConfig) -> Vec<String> {
    let (ready, still_active): (Vec<String>, Vec<String>) = state
        .quests
        .active
        .iter()
        .cloned()
        .partition(|id| config.quest(id).is_some_and(|def| is_met(def, state)));

    state.quests.active = still_active;
    for id in &ready {
        state.quests.ready_to_claim.push(id.clone());
        let title = config.quest(id).map(|q| q.title.as_str()).unwrap_or(id.as_str());
        state.push_event("Quest complete", &format!("{}: reward ready to claim.", title));
        log::info!("quest {} ready", id);
    }
    ready
}

/// Move newly satisfied quests from active to ready-to-claim.
pub fn evaluate(state: &GameState, config: &GameConfig) -> GameState {
    let mut next = state.clone();
    latch_ready(&mut next, config);
    next
}

/// Claim a ready quest's reward and activate any quests it unlocks.
pub fn claim(state: &GameState, config: &GameConfig, quest_id: &str) -> Result<GameState, QuestError> {
    let def = config
        .quest(quest_id)
        .ok_or_else(|| QuestError::Unknown { id: quest_id.to_string() })?;
    if state.quests.status_of(quest_id) != Some(QuestStatus::ReadyToClaim) {
        return Err(QuestError::NotReady { id: quest_id.to_string() });
    }

    let mut next = state.clone();
    next.quests.ready_to_claim.retain(|id| id != quest_id);
    next.quests.completed.push(quest_id.to_string());

    let reward = &def.reward;
    if let Some(cash) = reward.cash {
        next.cash += cash;
    }
    if let Some(delta) = reward.credit {
        change_credit(&mut next, delta, &format!("Quest reward: {}", def.title));
    }
    if let Some(stats) = &reward.stats {
        next.stats.apply(stats);
    }

    for unlocked in &def.unlocks {
        if next.quests.unlock(unlocked) {
            log::debug!("quest {} unlocked by {}", unlocked, quest_id);
        }
    }
    next.push_event("Reward claimed", &def.title);
    // Unlocked quests may already be satisfied.
    latch_ready(&mut next, config);
    Ok(next)
}
