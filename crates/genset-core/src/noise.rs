use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of per-tick sensor jitter.
///
/// The model draws every perturbation through this trait so a run can be
/// replayed from a seed, and tests can substitute a deterministic source
/// to pin down exact derived values.
pub trait NoiseSource: Send {
    /// Uniform draw in `[lo, hi)`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64;
}

/// PRNG-backed noise. Two instances built from the same seed replay the
/// same sequence of draws.
#[derive(Debug, Clone)]
pub struct SeededNoise {
    rng: StdRng,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        self.rng.gen_range(lo..hi)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::NoiseSource;
    use std::collections::VecDeque;

    /// Returns 0.0 for every draw. All jitter terms vanish and the wear
    /// draw never crosses the threshold.
    pub struct Silent;

    impl NoiseSource for Silent {
        fn uniform(&mut self, _lo: f64, _hi: f64) -> f64 {
            0.0
        }
    }

    /// Replays a fixed sequence of draws and panics when the model asks
    /// for one more than scripted, which pins down the draw order.
    pub struct Script(pub VecDeque<f64>);

    impl Script {
        pub fn of(draws: &[f64]) -> Self {
            Self(draws.iter().copied().collect())
        }
    }

    impl NoiseSource for Script {
        fn uniform(&mut self, _lo: f64, _hi: f64) -> f64 {
            self.0.pop_front().expect("model drew more noise than scripted")
        }
    }
}
