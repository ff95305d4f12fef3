//! Deterministic random stream.
//!
//! Uses a seeded PRNG (Xoshiro256**) that produces identical sequences
//! for identical seeds. The order in which callers draw from the stream is
//! part of the generator's output contract: reordering two draws changes
//! every manifest that follows.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// Deterministic random stream.
///
/// Wraps Xoshiro256** with a seed for reproducibility and counts every
/// logical draw, so tests can assert how much of the stream an operation
/// consumed.
///
/// # Example
///
/// ```rust
/// use tn_dst::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(12345);
/// let a: u64 = rng.gen();
/// let b: u64 = rng.gen();
///
/// let mut rng2 = DeterministicRng::new(12345);
/// assert_eq!(rng2.gen::<u64>(), a);
/// assert_eq!(rng2.gen::<u64>(), b);
/// ```
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    rng: Xoshiro256StarStar,
    calls_count: u64,
}

/// Maximum number of draws before warning.
const RNG_CALLS_WARNING_THRESHOLD: u64 = 1_000_000_000;

impl DeterministicRng {
    /// Create a new stream with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            calls_count: 0,
        }
    }

    /// Get the seed used to create this stream.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get number of logical draws taken so far.
    #[must_use]
    pub fn calls_count(&self) -> u64 {
        self.calls_count
    }

    fn record_call(&mut self) {
        self.calls_count += 1;
        debug_assert!(
            self.calls_count < RNG_CALLS_WARNING_THRESHOLD,
            "Very high number of RNG calls - possible infinite loop"
        );
    }

    /// Generate a random value of type T.
    pub fn gen<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.record_call();
        self.rng.gen()
    }

    /// Generate a random value in the given range.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.record_call();
        self.rng.gen_range(range)
    }

    /// Generate a boolean with the given probability of true.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        debug_assert!(
            (0.0..=1.0).contains(&probability),
            "Probability must be in [0.0, 1.0]"
        );
        self.record_call();
        self.rng.gen_bool(probability)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        self.record_call();
        slice.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = DeterministicRng::new(42);
        let mut rng2 = DeterministicRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen::<u64>(), rng2.gen::<u64>());
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = DeterministicRng::new(42);
        let mut rng2 = DeterministicRng::new(43);

        let seq1: Vec<u64> = (0..10).map(|_| rng1.gen()).collect();
        let seq2: Vec<u64> = (0..10).map(|_| rng2.gen()).collect();
        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = DeterministicRng::new(0);
        let values: Vec<u64> = (0..4).map(|_| rng.gen()).collect();
        assert!(values.iter().any(|&v| v != 0));
    }

    #[test]
    fn test_gen_range() {
        let mut rng = DeterministicRng::new(12345);

        for _ in 0..100 {
            let val = rng.gen_range(30..=100);
            assert!((30..=100).contains(&val));
        }
    }

    #[test]
    fn test_gen_bool_extremes() {
        let mut rng = DeterministicRng::new(12345);

        for _ in 0..10 {
            assert!(!rng.gen_bool(0.0));
        }
        for _ in 0..10 {
            assert!(rng.gen_bool(1.0));
        }
    }

    #[test]
    fn test_shuffle_is_reproducible() {
        let mut rng = DeterministicRng::new(12345);
        let mut data = vec![1, 2, 3, 4, 5];
        let original = data.clone();

        rng.shuffle(&mut data);
        let mut replay = DeterministicRng::new(12345);
        let mut data2 = original.clone();
        replay.shuffle(&mut data2);
        assert_eq!(data, data2);

        data.sort_unstable();
        assert_eq!(data, original);
    }

    #[test]
    fn test_calls_count() {
        let mut rng = DeterministicRng::new(12345);
        assert_eq!(rng.calls_count(), 0);

        let _: u64 = rng.gen();
        assert_eq!(rng.calls_count(), 1);

        let _ = rng.gen_range(0..10);
        assert_eq!(rng.calls_count(), 2);

        let _ = rng.gen_bool(0.5);
        let mut data = [1, 2, 3];
        rng.shuffle(&mut data);
        assert_eq!(rng.calls_count(), 4);
    }
}
