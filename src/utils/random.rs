//! # Random Helpers
//!
//! Small randomised building blocks used by floor generation. Every helper
//! takes the generator explicitly so results are reproducible per seed.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A probability that decays every time it is read.
///
/// Sampling returns the current value and then lowers the stored value by
/// `velocity`, never going below `min`.
///
/// # Examples
///
/// ```
/// use tilecrawl::FillChance;
///
/// let mut fill = FillChance::new(0.3, 0.1, 0.15);
/// assert_eq!(fill.sample(), 0.3);
/// assert!((fill.sample() - 0.15).abs() < 1e-6);
/// assert_eq!(fill.sample(), 0.1);
/// assert_eq!(fill.sample(), 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillChance {
    current: f32,
    max: f32,
    min: f32,
    velocity: f32,
}

impl FillChance {
    /// Creates a fill chance starting at `max`.
    pub fn new(max: f32, min: f32, velocity: f32) -> Self {
        Self {
            current: max,
            max,
            min,
            velocity,
        }
    }

    /// Returns the current value, then decays it.
    pub fn sample(&mut self) -> f32 {
        let value = self.current;
        self.current = (self.current - self.velocity).max(self.min);
        value
    }

    /// The value the next [`FillChance::sample`] will return.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Restores the starting value.
    pub fn reset(&mut self) {
        self.current = self.max;
    }
}

/// Shuffles `items`, then stable-sorts them by `key`.
///
/// Items with equal keys end up in random relative order, which is how
/// generation prefers the least-used room while still varying between ties.
pub fn shuffle_then_sort_by_key<T, K, R, F>(items: &mut [T], rng: &mut R, key: F)
where
    K: Ord,
    R: Rng + ?Sized,
    F: FnMut(&T) -> K,
{
    items.shuffle(rng);
    items.sort_by_key(key);
}
