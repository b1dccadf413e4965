//! Career ladder, education, and side hustles.

use thiserror::Error;

use crate::config::GameConfig;
use crate::state::{Education, GameState, SideHustle, Stat};

/// Side hustles one person can keep running at once.
pub const MAX_SIDE_HUSTLES: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum CareerError {
    #[error("already at the top of the career ladder")]
    TopOfLadder,
    #[error("financial IQ {current} is below the required {required}")]
    FinancialIqTooLow { required: i32, current: i32 },
    #[error("networking {current} is below the required {required}")]
    NetworkingTooLow { required: i32, current: i32 },
    #[error("requires {required:?} education (you have {current:?})")]
    EducationRequired { required: Education, current: Education },
    #[error("no further education available")]
    FullyEducated,
    #[error("no program offered for {level:?}")]
    NoProgram { level: Education },
    #[error("not enough cash (need {required}, have {available})")]
    InsufficientCash { required: f64, available: f64 },
    #[error("unknown side hustle {id}")]
    UnknownSideHustle { id: String },
    #[error("{id} is already running")]
    AlreadyRunning { id: String },
    #[error("{id} is not running")]
    NotRunning { id: String },
    #[error("at most {max} side hustles at once")]
    TooManySideHustles { max: usize },
    #[error("the game has ended")]
    GameOver,
}

fn require_cash(state: &GameState, amount: f64) -> Result<(), CareerError> {
    if amount > state.cash {
        return Err(CareerError::InsufficientCash {
            required: amount,
            available: state.cash,
        });
    }
    Ok(())
}

/// Move up one rung if the next rung's requirements are met.
pub fn seek_promotion(state: &GameState, config: &GameConfig) -> Result<GameState, CareerError> {
    if state.is_game_over() {
        return Err(CareerError::GameOver);
    }
    // Levels are 1-based, so the next rung sits at index `level`.
    let rung = config
        .career_ladder
        .get(state.career.level as usize)
        .ok_or(CareerError::TopOfLadder)?;

    if state.stats.financial_iq < rung.min_financial_iq {
        return Err(CareerError::FinancialIqTooLow {
            required: rung.min_financial_iq,
            current: state.stats.financial_iq,
        });
    }
    if state.stats.networking < rung.min_networking {
        return Err(CareerError::NetworkingTooLow {
            required: rung.min_networking,
            current: state.stats.networking,
        });
    }
    if let Some(required) = rung.min_education {
        if state.education < required {
            return Err(CareerError::EducationRequired {
                required,
                current: state.education,
            });
        }
    }

    let mut next = state.clone();
    let old_salary = next.career.monthly_salary;
    next.career.level += 1;
    next.career.title = rung.title.clone();
    next.career.monthly_salary = rung.monthly_salary;
    next.stats.adjust(Stat::Happiness, 8);
    next.stats.adjust(Stat::Stress, 5);
    next.push_event(
        "Promotion",
        &format!(
            "You are now {} ({:.2} -> {:.2}/month).",
            rung.title, old_salary, rung.monthly_salary
        ),
    );
    log::info!("promoted to level {} ({})", next.career.level, rung.title);
    Ok(next)
}

/// Pay tuition for the next education level.
pub fn pursue_education(state: &GameState, config: &GameConfig) -> Result<GameState, CareerError> {
    if state.is_game_over() {
        return Err(CareerError::GameOver);
    }
    let level = state.education.next().ok_or(CareerError::FullyEducated)?;
    let program = config
        .tuition_for(level)
        .ok_or(CareerError::NoProgram { level })?;
    require_cash(state, program.cost)?;

    let mut next = state.clone();
    next.cash -= program.cost;
    next.education = level;
    next.stats.adjust(Stat::FinancialIq, program.financial_iq);
    next.stats.adjust(Stat::Stress, 10);
    next.stats.adjust(Stat::Energy, -10);
    next.push_event(
        "Graduation",
        &format!("Earned a {:?} degree for {:.2}.", level, program.cost),
    );
    Ok(next)
}

pub fn start_side_hustle(
    state: &GameState,
    config: &GameConfig,
    hustle_id: &str,
) -> Result<GameState, CareerError> {
    if state.is_game_over() {
        return Err(CareerError::GameOver);
    }
    let def = config
        .side_hustle(hustle_id)
        .ok_or_else(|| CareerError::UnknownSideHustle { id: hustle_id.to_string() })?;
    if state.side_hustles.iter().any(|h| h.id == hustle_id) {
        return Err(CareerError::AlreadyRunning { id: hustle_id.to_string() });
    }
    if state.side_hustles.len() >= MAX_SIDE_HUSTLES {
        return Err(CareerError::TooManySideHustles { max: MAX_SIDE_HUSTLES });
    }
    require_cash(state, def.startup_cost)?;

    let mut next = state.clone();
    next.cash -= def.startup_cost;
    next.side_hustles.push(SideHustle {
        id: def.id.clone(),
        name: def.name.clone(),
        monthly_income: def.monthly_income,
    });
    next.stats.adjust(Stat::Stress, 6);
    next.push_event(
        "Side hustle started",
        &format!("{} should bring in {:.2}/month.", def.name, def.monthly_income),
    );
    Ok(next)
}

pub fn stop_side_hustle(state: &GameState, hustle_id: &str) -> Result<GameState, CareerError> {
    if state.is_game_over() {
        return Err(CareerError::GameOver);
    }
    let pos = state
        .side_hustles
        .iter()
        .position(|h| h.id == hustle_id)
        .ok_or_else(|| CareerError::NotRunning { id: hustle_id.to_string() })?;

    let mut next = state.clone();
    let hustle = next.side_hustles.remove(pos);
    next.stats.adjust(Stat::Stress, -6);
    next.push_event("Side hustle stopped", &hustle.name);
    Ok(next)
}
