//! Injectable randomness for the simulation.
//!
//! Every transition that needs a roll takes `&mut dyn RandomSource`, so game
//! logic stays deterministic for a fixed source and fully testable.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A stream of uniform numbers in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `lo..=hi`.
    fn next_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as f64 + 1.0;
        lo + ((self.next_f64() * span) as u32).min(hi - lo)
    }
}

/// Seeded ChaCha20 stream used by the host during normal play.
pub struct SeededRandom {
    rng: ChaCha20Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Stream for a given month of a game, so reloading a save mid-game
    /// continues with a reproducible sequence.
    pub fn for_month(seed: u64, month: u32) -> Self {
        Self::new(seed ^ (month as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed list of rolls, cycling when exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    rolls: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(rolls: Vec<f64>) -> Self {
        Self { rolls, cursor: 0 }
    }

    /// Always returns the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        if self.rolls.is_empty() {
            return 0.0;
        }
        let value = self.rolls[self.cursor % self.rolls.len()];
        self.cursor += 1;
        value.clamp(0.0, 0.999_999_999)
    }
}
