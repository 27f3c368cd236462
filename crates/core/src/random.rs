//! Injectable randomness for chance rolls.
//!
//! Gameplay code never reaches for a global RNG; it takes a
//! [`RandomSource`] so tests can feed exact roll sequences and probe the
//! threshold of every `roll < chance` branch.

use rand::{rngs::StdRng, Rng};

/// A source of uniform rolls in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform integer in `0..=max` derived from a single roll.
    fn next_up_to(&mut self, max: u32) -> u32 {
        let roll = self.next_unit();
        ((roll * (max as f64 + 1.0)).floor() as u32).min(max)
    }
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct Constant(f64);

    impl RandomSource for Constant {
        fn next_unit(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn std_rng_rolls_stay_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            let roll = rng.next_unit();
            assert!((0.0..1.0).contains(&roll));
        }
    }

    #[test]
    fn next_up_to_covers_inclusive_range() {
        assert_eq!(Constant(0.0).next_up_to(3), 0);
        assert_eq!(Constant(0.2499).next_up_to(3), 0);
        assert_eq!(Constant(0.25).next_up_to(3), 1);
        assert_eq!(Constant(0.9999).next_up_to(3), 3);
        assert_eq!(Constant(0.9999).next_up_to(10), 10);
    }
}
