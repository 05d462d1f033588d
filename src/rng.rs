//! Seeded deterministic randomness service.
//!
//! Grading needs byte-identical traces for identical (source, config, seed)
//! inputs across process runs and platforms, so the generator is a fixed,
//! explicitly-specified algorithm (splitmix64) rather than a library RNG
//! whose stream may change between crate versions. Unseeded runs derive a
//! seed from the host clock and are not reproducible, which is fine for
//! free play.

use std::time::{SystemTime, UNIX_EPOCH};

/// Deterministic PRNG backing the stdlib random functions.
#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn seeded(seed: u64) -> Self {
        Prng { state: seed }
    }

    /// Non-reproducible seed for unseeded runs.
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9e3779b97f4a7c15);
        Prng { state: nanos }
    }

    /// splitmix64 step.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in [min, max], inclusive on both bounds.
    /// Callers must validate `min <= max` first.
    pub fn int_in_range(&mut self, min: i64, max: i64) -> i64 {
        debug_assert!(min <= max);
        let span = (max - min) as u64 + 1;
        min + (self.next_u64() % span) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Prng::seeded(42);
        let mut b = Prng::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = Prng::seeded(1);
        let mut b = Prng::seeded(2);
        let same = (0..10).all(|_| a.next_u64() == b.next_u64());
        assert!(!same);
    }

    #[test]
    fn test_range_is_inclusive() {
        let mut rng = Prng::seeded(7);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..1000 {
            let n = rng.int_in_range(1, 3);
            assert!((1..=3).contains(&n));
            seen_min |= n == 1;
            seen_max |= n == 3;
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn test_degenerate_range() {
        let mut rng = Prng::seeded(0);
        for _ in 0..20 {
            assert_eq!(rng.int_in_range(5, 5), 5);
        }
    }
}
