//! # World Random Sequence
//!
//! One seeded sequence drives every spawn decision of a world: the seed
//! offsets, default-tile picks, layer spawn rolls, variant picks and tree
//! rolls. Its output is order-sensitive, so the generator must consume it
//! chunk by chunk and cell by cell in a fixed order.
//!
//! The sequence is an explicit object behind the [`SpawnRng`] trait so the
//! classifier can be driven by [`ScriptedRng`] in tests.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::noise::WorldSeed;

/// Characters used for auto-generated seeds.
const SEED_GLYPHS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of auto-generated seeds.
pub const GENERATED_SEED_LEN: usize = 10;

/// Source of uniform integer draws for world generation.
pub trait SpawnRng {
    /// Uniform integer in `[low, high)`. Returns `low` when the range is empty.
    fn range(&mut self, low: i32, high: i32) -> i32;

    /// Uniform index into a list of `len` items, always `< len` (0 if empty).
    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let high = i32::try_from(len).unwrap_or(i32::MAX);
        let drawn = usize::try_from(self.range(0, high)).unwrap_or(0);
        drawn.min(len - 1)
    }

    /// Percentage roll in `[0, 100)`.
    fn percent(&mut self) -> u32 {
        u32::try_from(self.range(0, 100)).unwrap_or(0)
    }
}

impl<T: SpawnRng + ?Sized> SpawnRng for &mut T {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        (**self).range(low, high)
    }
}

/// The seeded world sequence.
pub struct WorldRandom {
    rng: ChaCha8Rng,
    draws: u64,
}

impl WorldRandom {
    /// Creates the sequence for a world seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed.value()),
            draws: 0,
        }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl SpawnRng for WorldRandom {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        self.draws += 1;
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }
}

/// Replays a fixed list of draws and records every requested range.
///
/// Values are clamped into the requested range; once the script runs out
/// every draw returns the range's lower bound.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRng {
    script: VecDeque<i32>,
    requests: Vec<(i32, i32)>,
}

impl ScriptedRng {
    /// Creates a stub that will return `values` in order.
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            script: values.into_iter().collect(),
            requests: Vec::new(),
        }
    }

    /// Every `(low, high)` pair requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> &[(i32, i32)] {
        &self.requests
    }

    /// Draws not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl SpawnRng for ScriptedRng {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        self.requests.push((low, high));
        match self.script.pop_front() {
            Some(value) if high > low => value.clamp(low, high - 1),
            _ => low,
        }
    }
}

/// Generates a fresh random seed phrase for worlds configured without one.
#[must_use]
pub fn random_seed_phrase() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_SEED_LEN)
        .map(|_| char::from(SEED_GLYPHS[rng.gen_range(0..SEED_GLYPHS.len())]))
        .collect()
}
