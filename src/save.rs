//! Tycoon セーブ/ロード機能。
//!
//! ## バージョニング方針
//!
//! - `SAVE_VERSION`: 現在のセーブ形式バージョン。フィールド追加時にインクリメントする。
//! - `MIN_COMPATIBLE_VERSION`: 互換性を維持できる最小バージョン。
//!   新フィールドの追加のみの場合はこの値を変えない。
//!   既存フィールドの意味変更や削除など破壊的変更を行った場合のみインクリメントする。
//!
//! JSON への変換はどのターゲットでも使える。localStorage への読み書きは
//! wasm ビルドのみ。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::GameState;

pub const SAVE_VERSION: u32 = 1;
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

#[cfg(target_arch = "wasm32")]
const STORAGE_KEY: &str = "tycoon_save";

#[derive(Serialize, Deserialize)]
struct SaveData {
    version: u32,
    game: GameState,
}

/// Only the version, so a save from a newer build can be rejected before
/// its body is interpreted.
#[derive(Deserialize)]
struct SaveHeader {
    version: u32,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("save version {saved} is older than the oldest supported ({min})")]
    TooOld { saved: u32, min: u32 },
    #[error("save version {saved} is newer than this build ({current})")]
    TooNew { saved: u32, current: u32 },
}

pub fn to_json(state: &GameState) -> Result<String, SaveError> {
    let data = SaveData {
        version: SAVE_VERSION,
        game: state.clone(),
    };
    Ok(serde_json::to_string(&data)?)
}

pub fn from_json(json: &str) -> Result<GameState, SaveError> {
    let header: SaveHeader = serde_json::from_str(json)?;
    if header.version < MIN_COMPATIBLE_VERSION {
        return Err(SaveError::TooOld {
            saved: header.version,
            min: MIN_COMPATIBLE_VERSION,
        });
    }
    if header.version > SAVE_VERSION {
        return Err(SaveError::TooNew {
            saved: header.version,
            current: SAVE_VERSION,
        });
    }
    let data: SaveData = serde_json::from_str(json)?;
    if data.version < SAVE_VERSION {
        log::info!(
            "migrating save (saved={}, current={})",
            data.version,
            SAVE_VERSION
        );
    }
    let mut game = data.game;
    if game.clamp_ranges() {
        log::warn!("save had out-of-range stats or credit; clamped on load");
    }
    Ok(game)
}

#[cfg(target_arch = "wasm32")]
fn get_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

#[cfg(target_arch = "wasm32")]
pub fn save_game(state: &GameState) {
    let json = match to_json(state) {
        Ok(j) => j,
        Err(e) => {
            web_sys::console::warn_1(&format!("Tycoon: セーブのシリアライズに失敗: {e}").into());
            return;
        }
    };

    if let Some(storage) = get_storage() {
        if let Err(e) = storage.set_item(STORAGE_KEY, &json) {
            web_sys::console::warn_1(
                &format!("Tycoon: localStorage への保存に失敗: {e:?}").into(),
            );
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn load_game() -> Option<GameState> {
    let storage = get_storage()?;
    let json = match storage.get_item(STORAGE_KEY) {
        Ok(Some(j)) => j,
        _ => return None,
    };

    match from_json(&json) {
        Ok(state) => Some(state),
        Err(e) => {
            web_sys::console::log_1(
                &format!("Tycoon: セーブデータを読み込めません（破棄します）: {e}").into(),
            );
            let _ = storage.remove_item(STORAGE_KEY);
            None
        }
    }
}

/// セーブデータを削除する。
#[cfg(target_arch = "wasm32")]
pub fn delete_save() {
    if let Some(storage) = get_storage() {
        let _ = storage.remove_item(STORAGE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{apply_action, MonthlyAction, ResolverContext};
    use crate::config::GameConfig;
    use crate::logic::advance_month;
    use crate::random::SeededRandom;
    use crate::state::{Decision, DecisionOption, StatChanges};

    fn played_state() -> GameState {
        let config = GameConfig::default();
        let mut rng = SeededRandom::new(42);
        let mut s = GameState::new(&config, 42);
        s = crate::market::buy_asset(&s, &config, "index_fund", 3).unwrap();
        s = apply_action(&s, &ResolverContext::default(), MonthlyAction::Overtime, &mut rng).unwrap();
        for _ in 0..3 {
            if let Ok(next) = advance_month(&s, &config, &mut rng) {
                s = next;
            }
        }
        s
    }

    #[test]
    fn roundtrip_preserves_everything() {
        let original = played_state();
        let json = to_json(&original).unwrap();
        let restored = from_json(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn roundtrip_with_pending_decision() {
        let mut original = GameState::new(&GameConfig::default(), 1);
        original.pending_decision = Some(Decision {
            id: "d".into(),
            title: "Choice".into(),
            description: "Pick one".into(),
            options: vec![DecisionOption {
                label: "A".into(),
                cash: -10.5,
                credit: 3,
                stats: StatChanges { stress: 2, ..Default::default() },
            }],
        });
        let restored = from_json(&to_json(&original).unwrap()).unwrap();
        assert_eq!(restored.pending_decision, original.pending_decision);
    }

    #[test]
    fn edited_values_are_clamped_on_load() {
        let mut edited = GameState::new(&GameConfig::default(), 1);
        edited.stats.energy = 500;
        edited.stats.stress = -20;
        edited.credit_rating = 9_999;
        edited.monthly_actions_remaining = 9;
        let restored = from_json(&to_json(&edited).unwrap()).unwrap();
        assert_eq!(restored.stats.energy, 100);
        assert_eq!(restored.stats.stress, 0);
        assert_eq!(restored.credit_rating, 850);
        assert!(restored.monthly_actions_remaining <= restored.monthly_actions_max);
    }

    #[test]
    fn old_version_rejected() {
        let json = to_json(&GameState::new(&GameConfig::default(), 1))
            .unwrap()
            .replacen("\"version\":1", "\"version\":0", 1);
        assert!(matches!(from_json(&json), Err(SaveError::TooOld { saved: 0, .. })));
    }

    #[test]
    fn newer_version_rejected() {
        let json = r#"{"version":99,"game":{}}"#;
        assert!(matches!(from_json(json), Err(SaveError::TooNew { saved: 99, .. })));
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(matches!(from_json("not json"), Err(SaveError::Parse(_))));
        assert!(matches!(from_json(r#"{"version":1}"#), Err(SaveError::Parse(_))));
    }
}
