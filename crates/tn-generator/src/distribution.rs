//! Value-selection primitives over the shared random stream.
//!
//! Every chooser consumes a fixed number of draws for a given table shape:
//!
//! | Chooser | Draws |
//! |---------|-------|
//! | [`UniformChoice`] | 1 |
//! | [`WeightedChoice`] | 1 |
//! | [`ProbSetChoice`] | 1 per flag |
//! | [`UniformSetChoice`] | 2 (0 for an empty candidate list) |

use tn_dst::DeterministicRng;

/// A table that picks a value from the random stream.
pub trait Choice {
    type Output;

    /// Draw a value. Same stream state and same table give the same output.
    fn choose(&self, rng: &mut DeterministicRng) -> Self::Output;
}

/// Picks one value with equal probability.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformChoice<T> {
    values: Vec<T>,
}

impl<T: Clone> UniformChoice<T> {
    #[must_use]
    pub fn new(values: Vec<T>) -> Self {
        debug_assert!(!values.is_empty(), "Uniform choice needs at least one value");
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: Clone> Choice for UniformChoice<T> {
    type Output = T;

    fn choose(&self, rng: &mut DeterministicRng) -> T {
        let index = rng.gen_range(0..self.values.len());
        self.values[index].clone()
    }
}

/// Picks one value with probability `weight / total`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedChoice<T> {
    values: Vec<T>,
    /// Running weight totals, one per value.
    bounds: Vec<u64>,
}

impl<T: Clone> WeightedChoice<T> {
    /// Build from `(value, weight)` pairs. Table order is part of the draw
    /// contract.
    #[must_use]
    pub fn new(choices: Vec<(T, u32)>) -> Self {
        debug_assert!(!choices.is_empty(), "Weighted choice needs at least one value");
        debug_assert!(
            choices.iter().all(|(_, weight)| *weight > 0),
            "Weights must be positive"
        );

        let mut total = 0u64;
        let mut values = Vec::with_capacity(choices.len());
        let mut bounds = Vec::with_capacity(choices.len());
        for (value, weight) in choices {
            total += u64::from(weight);
            values.push(value);
            bounds.push(total);
        }
        Self { values, bounds }
    }

    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.bounds.last().copied().unwrap_or(0)
    }
}

impl<T: Clone> Choice for WeightedChoice<T> {
    type Output = T;

    fn choose(&self, rng: &mut DeterministicRng) -> T {
        let point = rng.gen_range(0..self.total_weight());
        let index = self.bounds.partition_point(|&bound| bound <= point);
        self.values[index].clone()
    }
}

/// Includes each flag by an independent Bernoulli trial: one `f64` draw in
/// `[0, 1)` per flag, in table order, kept when below the flag's probability.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbSetChoice<T> {
    choices: Vec<(T, f64)>,
}

impl<T: Clone> ProbSetChoice<T> {
    #[must_use]
    pub fn new(choices: Vec<(T, f64)>) -> Self {
        debug_assert!(
            choices.iter().all(|(_, p)| (0.0..=1.0).contains(p)),
            "Probabilities must be in [0.0, 1.0]"
        );
        Self { choices }
    }

    /// Same flags, each with probability zero.
    #[must_use]
    pub fn disabled(&self) -> Self {
        Self {
            choices: self.choices.iter().map(|(v, _)| (v.clone(), 0.0)).collect(),
        }
    }
}

impl<T: Clone> Choice for ProbSetChoice<T> {
    type Output = Vec<T>;

    fn choose(&self, rng: &mut DeterministicRng) -> Vec<T> {
        self.choices
            .iter()
            .filter(|(_, probability)| rng.gen::<f64>() < *probability)
            .map(|(value, _)| value.clone())
            .collect()
    }
}

/// Picks a uniformly random non-empty subset of an ordered candidate list.
///
/// The result is in draw order, not candidate order. An empty candidate list
/// yields an empty subset without touching the stream.
#[derive(Debug, Clone, Copy)]
pub struct UniformSetChoice<'a, T> {
    candidates: &'a [T],
}

impl<'a, T: Clone> UniformSetChoice<'a, T> {
    #[must_use]
    pub fn new(candidates: &'a [T]) -> Self {
        Self { candidates }
    }
}

impl<T: Clone> Choice for UniformSetChoice<'_, T> {
    type Output = Vec<T>;

    fn choose(&self, rng: &mut DeterministicRng) -> Vec<T> {
        if self.candidates.is_empty() {
            return Vec::new();
        }

        let mut picked = self.candidates.to_vec();
        rng.shuffle(&mut picked);
        let count = rng.gen_range(1..=picked.len());
        picked.truncate(count);
        picked
    }
}
