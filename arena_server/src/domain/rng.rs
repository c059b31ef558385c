// Seeded randomness for the simulation. Every random decision in a session
// goes through one `GameRng`, so a seed plus a command log reproduces a run.

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

#[derive(Debug, Clone)]
pub struct GameRng {
    rng: Pcg32,
    seed: u64,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// True with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f32) -> bool {
        if p <= 0.0 {
            return false;
        }
        self.unit() < p.min(1.0)
    }

    /// Uniform value in `[min, max)`; returns `min` for empty ranges.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..max)
    }

    /// Uniform value in `[min, max]`; returns `min` for empty ranges.
    pub fn range_u32(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    /// Index into `weights` drawn proportionally; `None` if every weight is zero.
    pub fn pick_weighted(&mut self, weights: &[u32]) -> Option<usize> {
        let dist = WeightedIndex::new(weights.iter().copied()).ok()?;
        Some(dist.sample(&mut self.rng))
    }

    /// Uniform pick from a slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..items.len());
        items.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_two_rngs_share_a_seed_then_they_produce_the_same_sequence() {
        let mut a = GameRng::from_seed(7);
        let mut b = GameRng::from_seed(7);
        for _ in 0..32 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
        }
    }

    #[test]
    fn when_all_weights_are_zero_then_nothing_is_picked() {
        let mut rng = GameRng::from_seed(1);
        assert_eq!(rng.pick_weighted(&[0, 0, 0]), None);
        assert_eq!(rng.pick_weighted(&[]), None);
    }

    #[test]
    fn when_only_one_weight_is_positive_then_it_is_always_picked() {
        let mut rng = GameRng::from_seed(3);
        for _ in 0..50 {
            assert_eq!(rng.pick_weighted(&[0, 5, 0]), Some(1));
        }
    }

    #[test]
    fn when_range_is_empty_then_min_is_returned() {
        let mut rng = GameRng::from_seed(9);
        assert_eq!(rng.range_f32(4.0, 4.0), 4.0);
        assert_eq!(rng.range_u32(6, 3), 6);
    }

    #[test]
    fn chance_respects_the_extremes() {
        let mut rng = GameRng::from_seed(11);
        for _ in 0..100 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }
}
