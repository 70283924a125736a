// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Random source abstraction.
//!
//! Every randomized decision streak makes, i.e., which files to touch, how
//! many lines to write, which words to use, and which commit message template
//! to pick, goes through the [`Entropy`] trait. Production runs draw from a
//! real RNG through [`RandEntropy`]. Tests either seed that RNG, or replay an
//! exact sequence of choices through [`Scripted`].

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use std::collections::VecDeque;

/// Source of random choices.
pub trait Entropy {
    /// Uniform index in `0..len`.
    ///
    /// Callers must never pass a `len` of zero.
    fn index(&mut self, len: usize) -> usize;

    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform integer in `low..=high`.
    ///
    /// Bounds given in the wrong order are swapped.
    fn between(&mut self, low: usize, high: usize) -> usize {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        low + self.index(high - low + 1)
    }

    /// Pick one item out of a slice, or nothing if the slice is empty.
    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }

        items.get(self.index(items.len()))
    }
}

/// Entropy backed by a [`rand`] RNG.
#[derive(Debug, Clone)]
pub struct RandEntropy<R = StdRng>
where
    R: RngCore,
{
    rng: R,
}

impl<R> RandEntropy<R>
where
    R: RngCore,
{
    /// Wrap an existing RNG.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandEntropy<StdRng> {
    /// Seed from operating system randomness.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible source for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R> Entropy for RandEntropy<R>
where
    R: RngCore,
{
    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }

        self.rng.gen_range(0..len)
    }

    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Entropy that replays a scripted sequence of choices.
///
/// Index draws and unit draws are consumed from two separate queues. An index
/// larger than the requested range wraps around. Once a queue runs dry it keeps
/// answering zero.
#[derive(Debug, Default, Clone)]
pub struct Scripted {
    indices: VecDeque<usize>,
    units: VecDeque<f64>,
}

impl Scripted {
    /// Construct new scripted entropy source.
    pub fn new(
        indices: impl IntoIterator<Item = usize>,
        units: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            indices: indices.into_iter().collect(),
            units: units.into_iter().collect(),
        }
    }

    /// Script index draws only.
    pub fn indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::new(indices, [])
    }
}

impl Entropy for Scripted {
    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }

        self.indices.pop_front().unwrap_or(0) % len
    }

    fn unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(0.0).clamp(0.0, 1.0 - f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn seeded_sources_agree() {
        let mut left = RandEntropy::seeded(7);
        let mut right = RandEntropy::seeded(7);

        let left = (0..16).map(|_| left.index(100)).collect::<Vec<_>>();
        let right = (0..16).map(|_| right.index(100)).collect::<Vec<_>>();
        assert_eq!(left, right);
    }

    #[test]
    fn between_stays_in_bounds() {
        let mut entropy = RandEntropy::seeded(42);
        for _ in 0..256 {
            let value = entropy.between(2, 5);
            assert!((2..=5).contains(&value), "{value} out of bounds");
        }

        assert_eq!(entropy.between(3, 3), 3);
    }

    #[test]
    fn scripted_replays_and_wraps() {
        let mut entropy = Scripted::new([1, 7], [0.25]);

        assert_eq!(entropy.index(3), 1);
        assert_eq!(entropy.index(3), 1);
        assert_eq!(entropy.index(3), 0);
        assert_eq!(entropy.unit(), 0.25);
        assert_eq!(entropy.unit(), 0.0);
    }

    #[test]
    fn choose_from_empty_slice() {
        let mut entropy = Scripted::default();
        let empty: [u8; 0] = [];

        assert_eq!(entropy.choose(&empty), None);
        assert_eq!(entropy.choose(&["a", "b"]), Some(&"a"));
    }
}
