//! Host facade: owns the one authoritative `GameState` and applies player
//! commands to it in order.

use thiserror::Error;

use crate::actions::{self, ActionError, MonthlyAction, ResolverContext};
use crate::auto_invest::{self, AutoInvestError};
use crate::career::{self, CareerError};
use crate::config::{ConfigError, GameConfig};
use crate::loans::{self, LoanError};
use crate::logic::{self, TurnError};
use crate::market::{self, MarketError};
use crate::quests::{self, QuestError};
use crate::random::SeededRandom;
use crate::save::{self, SaveError};
use crate::state::{AutoInvest, GameState};

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Loan(#[from] LoanError),
    #[error(transparent)]
    Quest(#[from] QuestError),
    #[error(transparent)]
    Market(#[from] MarketError),
    #[error(transparent)]
    Career(#[from] CareerError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error(transparent)]
    AutoInvest(#[from] AutoInvestError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("another command is still being processed")]
    Busy,
}

/// Everything a player can ask the game to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Act(MonthlyAction),
    AdvanceMonth,
    ResolveDecision(usize),
    ClaimQuest(String),
    TakeLoan { product_id: String, amount: f64 },
    PayDown { debt_id: String, amount: f64 },
    Buy { item_id: String, quantity: u32 },
    Sell { item_id: String, quantity: u32 },
    BuyWithMortgage { item_id: String },
    Refinance { mortgage_id: String, term_months: u32 },
    ConfigureAutoInvest(AutoInvest),
    SeekPromotion,
    PursueEducation,
    StartSideHustle(String),
    StopSideHustle(String),
}

pub struct Tycoon {
    config: GameConfig,
    state: GameState,
    rng: SeededRandom,
    processing: bool,
}

impl Tycoon {
    /// Start a game, resuming the browser save when one exists.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, GameError> {
        config.validate()?;
        let state = GameState::new(&config, seed);

        #[cfg(target_arch = "wasm32")]
        let state = {
            let mut s = state;
            if let Some(saved) = save::load_game() {
                s = saved;
                s.push_event("Welcome back", "Save data loaded.");
            }
            s
        };

        let rng = SeededRandom::for_month(state.seed, state.month);
        Ok(Self {
            config,
            state,
            rng,
            processing: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn context(&self) -> ResolverContext {
        ResolverContext {
            processing: self.processing,
        }
    }

    /// Mark a host-side transition (e.g. a month-end animation) as running.
    /// While set, monthly actions report `Locked(Processing)` and commands
    /// are refused.
    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    pub fn availability(&self) -> Vec<(MonthlyAction, Result<(), ActionError>)> {
        actions::availability(&self.state, &self.context())
    }

    /// Apply one command. On error the current state is left unchanged.
    pub fn dispatch(&mut self, command: Command) -> Result<&GameState, GameError> {
        if self.processing {
            return Err(GameError::Busy);
        }
        let ctx = self.context();
        let config = &self.config;
        let state = &self.state;

        let next = match command {
            Command::Act(action) => actions::apply_action(state, &ctx, action, &mut self.rng)?,
            Command::AdvanceMonth => {
                let next = logic::advance_month(state, config, &mut self.rng)?;
                self.rng = SeededRandom::for_month(next.seed, next.month);
                next
            }
            Command::ResolveDecision(index) => logic::resolve_decision(state, index)?,
            Command::ClaimQuest(id) => quests::claim(state, config, &id)?,
            Command::TakeLoan { product_id, amount } => {
                loans::take_loan(state, config, &product_id, amount)?
            }
            Command::PayDown { debt_id, amount } => loans::pay_down(state, &debt_id, amount)?,
            Command::Buy { item_id, quantity } => market::buy_asset(state, config, &item_id, quantity)?,
            Command::Sell { item_id, quantity } => market::sell_asset(state, config, &item_id, quantity)?,
            Command::BuyWithMortgage { item_id } => market::buy_with_mortgage(state, config, &item_id)?,
            Command::Refinance { mortgage_id, term_months } => {
                market::refinance_mortgage(state, config, &mortgage_id, term_months)?
            }
            Command::ConfigureAutoInvest(settings) => auto_invest::configure(state, config, settings)?,
            Command::SeekPromotion => career::seek_promotion(state, config)?,
            Command::PursueEducation => career::pursue_education(state, config)?,
            Command::StartSideHustle(id) => career::start_side_hustle(state, config, &id)?,
            Command::StopSideHustle(id) => career::stop_side_hustle(state, &id)?,
        };

        self.state = next;
        #[cfg(target_arch = "wasm32")]
        save::save_game(&self.state);
        Ok(&self.state)
    }

    /// Throw the current game away and start over.
    pub fn restart(&mut self, seed: u64) {
        #[cfg(target_arch = "wasm32")]
        save::delete_save();
        self.state = GameState::new(&self.config, seed);
        self.rng = SeededRandom::for_month(seed, 0);
        log::info!("new game with seed {}", seed);
    }

    pub fn export_save(&self) -> Result<String, GameError> {
        Ok(save::to_json(&self.state)?)
    }

    pub fn import_save(&mut self, json: &str) -> Result<&GameState, GameError> {
        let state = save::from_json(json)?;
        self.rng = SeededRandom::for_month(state.seed, state.month);
        self.state = state;
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::LockReason;

    fn game() -> Tycoon {
        Tycoon::new(GameConfig::default(), 11).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = GameConfig::default();
        config.catalog.clear();
        assert!(matches!(
            Tycoon::new(config, 1),
            Err(GameError::Config(ConfigError::EmptyCatalog))
        ));
    }

    #[test]
    fn dispatch_action_consumes_budget() {
        let mut g = game();
        let before = g.state().monthly_actions_remaining;
        let s = g.dispatch(Command::Act(MonthlyAction::Recover)).unwrap();
        assert_eq!(s.monthly_actions_remaining, before - 1);
    }

    #[test]
    fn failed_command_keeps_state() {
        let mut g = game();
        let before = g.state().clone();
        let err = g.dispatch(Command::ClaimQuest("emergency_fund".into())).unwrap_err();
        assert!(matches!(err, GameError::Quest(QuestError::NotReady { .. })));
        assert_eq!(g.state(), &before);
    }

    #[test]
    fn processing_locks_everything() {
        let mut g = game();
        g.set_processing(true);
        assert!(g
            .availability()
            .iter()
            .all(|(_, r)| *r == Err(ActionError::Locked(LockReason::Processing))));
        assert!(matches!(g.dispatch(Command::AdvanceMonth), Err(GameError::Busy)));
        g.set_processing(false);
        assert!(g.dispatch(Command::AdvanceMonth).is_ok());
    }

    #[test]
    fn advance_month_through_facade() {
        let mut g = game();
        let s = g.dispatch(Command::AdvanceMonth).unwrap();
        assert_eq!(s.month, 1);
    }

    #[test]
    fn same_seed_same_game() {
        let mut a = game();
        let mut b = game();
        for _ in 0..6 {
            let ra = a.dispatch(Command::AdvanceMonth).map(|s| s.clone());
            let rb = b.dispatch(Command::AdvanceMonth).map(|s| s.clone());
            match (ra, rb) {
                (Ok(sa), Ok(sb)) => assert_eq!(sa, sb),
                (Err(_), Err(_)) => {
                    let _ = a.dispatch(Command::ResolveDecision(1));
                    let _ = b.dispatch(Command::ResolveDecision(1));
                }
                _ => panic!("games diverged"),
            }
        }
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn export_import_roundtrip() {
        let mut g = game();
        g.dispatch(Command::AdvanceMonth).unwrap();
        let json = g.export_save().unwrap();
        let mut other = Tycoon::new(GameConfig::default(), 99).unwrap();
        let s = other.import_save(&json).unwrap();
        assert_eq!(s, g.state());
    }

    #[test]
    fn restart_resets_state() {
        let mut g = game();
        g.dispatch(Command::AdvanceMonth).unwrap();
        g.restart(5);
        assert_eq!(g.state().month, 0);
        assert_eq!(g.state().seed, 5);
    }
}
