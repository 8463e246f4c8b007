//! Target direction generators.
//!
//! The engine never reaches for an ambient RNG. A [`DirectionSource`] is
//! passed in, so tests can script the exact target sequence.

use crate::optotype::Direction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Capability that produces the target direction for the next trial.
pub trait DirectionSource {
    fn next_direction(&mut self) -> Direction;
}

impl<T: DirectionSource + ?Sized> DirectionSource for Box<T> {
    fn next_direction(&mut self) -> Direction {
        (**self).next_direction()
    }
}

/// Uniform random pick over the four directions, independent of history.
#[derive(Debug, Clone)]
pub struct RandomDirections {
    rng: StdRng,
}

impl RandomDirections {
    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        RandomDirections {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        RandomDirections {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is set, entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl DirectionSource for RandomDirections {
    fn next_direction(&mut self) -> Direction {
        Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())]
    }
}

/// Replays a fixed list of directions, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedDirections {
    script: Vec<Direction>,
    cursor: usize,
}

impl ScriptedDirections {
    /// An empty script always yields [`Direction::Right`].
    pub fn new(script: impl Into<Vec<Direction>>) -> Self {
        ScriptedDirections {
            script: script.into(),
            cursor: 0,
        }
    }

    /// How many directions have been handed out so far.
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl DirectionSource for ScriptedDirections {
    fn next_direction(&mut self) -> Direction {
        let dir = if self.script.is_empty() {
            Direction::Right
        } else {
            self.script[self.cursor % self.script.len()]
        };
        self.cursor += 1;
        dir
    }
}
