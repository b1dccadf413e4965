//! Credit model: bounded score, tier lookup, and per-month history.

use serde::{Deserialize, Serialize};

use crate::state::{CreditEntry, GameState, CREDIT_MAX, CREDIT_MIN};

/// Named credit-quality buckets, worst to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditTier {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

impl CreditTier {
    /// Adjustment to offered loan rates.
    pub fn rate_premium(self) -> f64 {
        match self {
            CreditTier::Poor => 0.05,
            CreditTier::Fair => 0.02,
            CreditTier::Good => 0.0,
            CreditTier::VeryGood => -0.005,
            CreditTier::Excellent => -0.01,
        }
    }
}

/// Scores at or above `min_score` fall into `tier` (until the next band).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    pub min_score: i32,
    pub tier: CreditTier,
}

/// Tier for a score. Bands are assumed sorted ascending (see `GameConfig::validate`).
pub fn tier_for(score: i32, bands: &[TierBand]) -> CreditTier {
    bands
        .iter()
        .rev()
        .find(|b| score >= b.min_score)
        .map(|b| b.tier)
        .unwrap_or(CreditTier::Poor)
}

pub fn clamp_score(score: i64) -> i32 {
    score.clamp(CREDIT_MIN as i64, CREDIT_MAX as i64) as i32
}

/// In-place credit change used inside transitions.
pub(crate) fn change_credit(state: &mut GameState, delta: i32, reason: &str) {
    let before = state.credit_rating;
    state.credit_rating = clamp_score(before as i64 + delta as i64);
    let month = state.month;
    let score = state.credit_rating;

    match state.credit_history.iter_mut().find(|e| e.month == month) {
        Some(entry) => {
            entry.score = score;
            entry.reasons.push(reason.to_string());
        }
        None => state.credit_history.push(CreditEntry {
            month,
            score,
            reasons: vec![reason.to_string()],
        }),
    }

    if before != score {
        log::debug!("credit {} -> {} ({})", before, score, reason);
    }
}

/// Make sure the current month has a history entry, even without changes.
pub(crate) fn ensure_month_entry(state: &mut GameState) {
    let month = state.month;
    if !state.credit_history.iter().any(|e| e.month == month) {
        state.credit_history.push(CreditEntry {
            month,
            score: state.credit_rating,
            reasons: Vec::new(),
        });
    }
}

/// Apply a credit delta with an explanation, returning the new state.
pub fn apply_credit_change(state: &GameState, delta: i32, reason: &str) -> GameState {
    let mut next = state.clone();
    change_credit(&mut next, delta, reason);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn state() -> GameState {
        GameState::new(&GameConfig::default(), 1)
    }

    fn bands() -> Vec<TierBand> {
        GameConfig::default().credit_tiers
    }

    #[test]
    fn tiers_from_default_bands() {
        let b = bands();
        assert_eq!(tier_for(300, &b), CreditTier::Poor);
        assert_eq!(tier_for(579, &b), CreditTier::Poor);
        assert_eq!(tier_for(580, &b), CreditTier::Fair);
        assert_eq!(tier_for(700, &b), CreditTier::Good);
        assert_eq!(tier_for(745, &b), CreditTier::VeryGood);
        assert_eq!(tier_for(850, &b), CreditTier::Excellent);
    }

    #[test]
    fn tier_below_all_bands_is_poor() {
        let b = vec![TierBand { min_score: 500, tier: CreditTier::Good }];
        assert_eq!(tier_for(400, &b), CreditTier::Poor);
    }

    #[test]
    fn change_clamps_high_and_low() {
        let s = apply_credit_change(&state(), 10_000, "windfall");
        assert_eq!(s.credit_rating, CREDIT_MAX);
        let s = apply_credit_change(&s, -10_000, "disaster");
        assert_eq!(s.credit_rating, CREDIT_MIN);
    }

    #[test]
    fn extreme_delta_does_not_overflow() {
        let s = apply_credit_change(&state(), i32::MAX, "max");
        assert_eq!(s.credit_rating, CREDIT_MAX);
        let s = apply_credit_change(&s, i32::MIN, "min");
        assert_eq!(s.credit_rating, CREDIT_MIN);
    }

    #[test]
    fn same_month_merges_reasons() {
        let s = state();
        let before = s.credit_history.len();
        let s = apply_credit_change(&s, 5, "on-time payment");
        let s = apply_credit_change(&s, -3, "new inquiry");
        assert_eq!(s.credit_history.len(), before);
        let entry = s.credit_history.iter().find(|e| e.month == 0).unwrap();
        assert!(entry.reasons.contains(&"on-time payment".to_string()));
        assert!(entry.reasons.contains(&"new inquiry".to_string()));
        assert_eq!(entry.score, s.credit_rating);
    }

    #[test]
    fn new_month_appends_entry() {
        let mut s = state();
        s.month = 3;
        let s = apply_credit_change(&s, 2, "paid");
        assert_eq!(s.credit_history.last().map(|e| e.month), Some(3));
    }

    #[test]
    fn input_snapshot_untouched() {
        let s = state();
        let score = s.credit_rating;
        let _ = apply_credit_change(&s, 50, "x");
        assert_eq!(s.credit_rating, score);
    }

    #[test]
    fn ensure_entry_is_idempotent() {
        let mut s = state();
        s.month = 4;
        ensure_month_entry(&mut s);
        ensure_month_entry(&mut s);
        assert_eq!(s.credit_history.iter().filter(|e| e.month == 4).count(), 1);
    }

    #[test]
    fn premium_improves_with_tier() {
        let tiers = [
            CreditTier::Poor,
            CreditTier::Fair,
            CreditTier::Good,
            CreditTier::VeryGood,
            CreditTier::Excellent,
        ];
        assert!(tiers.windows(2).all(|w| w[0].rate_premium() > w[1].rate_premium()));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::config::GameConfig;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_score_always_in_range(deltas in proptest::collection::vec(any::<i32>(), 1..30)) {
            let mut s = GameState::new(&GameConfig::default(), 1);
            for d in deltas {
                s = apply_credit_change(&s, d, "delta");
                prop_assert!(s.credit_rating >= CREDIT_MIN && s.credit_rating <= CREDIT_MAX);
            }
        }

        #[test]
        fn prop_tier_monotonic(a in 300i32..=850, b in 300i32..=850) {
            let bands = GameConfig::default().credit_tiers;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(tier_for(lo, &bands) <= tier_for(hi, &bands));
        }
    }
}
