//! Tycoon: a turn-based personal-finance simulation.
//!
//! The player manages cash, debts, investments, a career, and life stats one
//! month at a time. Every transition takes a `&GameState` and returns a new
//! state or a typed error; `game::Tycoon` holds the single live instance and
//! applies commands in order.

pub mod actions;
pub mod auto_invest;
pub mod career;
pub mod config;
pub mod credit;
pub mod economy;
pub mod game;
pub mod loans;
pub mod logic;
pub mod market;
pub mod quests;
pub mod random;
pub mod save;
pub mod state;

pub use config::GameConfig;
pub use game::{Command, GameError, Tycoon};
pub use state::GameState;
