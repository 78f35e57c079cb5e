use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Session-wide random source. Every draw made by world generation goes
/// through here, so a fixed seed reproduces the first forward pass.
pub struct RandomSource {
    seed: u64,
    rng: SmallRng,
}

impl RandomSource {
    pub fn from_seed(seed: u64) -> Self {
        RandomSource { seed, rng: SmallRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.rng.gen::<f32>() < p
    }

    pub fn coin_flip(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Uniform in `[min, max]`; collapses to `min` on an empty range.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Uniform integer in `[min, max]`.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}
