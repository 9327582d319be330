//! Fast PRNG for the stochastic search. Uses SplitMix64 for throughput and good statistical quality.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.
//!
//! The generator is passed `&mut` through every stochastic operation (sampling, mutation,
//! crossover, parent selection, clustering init), so a fixed seed reproduces a whole run.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the wall clock for a fresh, non-reproducible run.
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5DEECE66D);
        Self::new(nanos ^ SPLITMIX64_GOLDEN)
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1) with 53-bit resolution.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform in [low, high).
    #[inline]
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Uniform index in [0, n). `n` must be non-zero.
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Standard normal draw via Box-Muller, scaled to (mean, sigma).
    pub fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        // Reject u1 == 0 so ln() stays finite.
        let mut u1 = self.next_f64();
        while u1 <= f64::MIN_POSITIVE {
            u1 = self.next_f64();
        }
        let u2 = self.next_f64();
        let mag = (-2.0 * u1.ln()).sqrt();
        mean + sigma * mag * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Two distinct indices in [0, n), for parent selection without replacement.
    /// `n` must be at least 2.
    pub fn distinct_pair(&mut self, n: usize) -> (usize, usize) {
        let first = self.index(n);
        let mut second = self.index(n);
        while second == first {
            second = self.index(n);
        }
        (first, second)
    }
}
