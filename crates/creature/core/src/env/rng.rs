//! RNG oracle used by every probabilistic rule.
//!
//! Creature logic never touches a global generator. Each operation draws from
//! the [`RngOracle`] it is handed, so tests can script outcomes with a seeded
//! [`PcgRng`] and the runtime can plug in an OS-seeded generator.

use std::time::Duration;

/// Source of uniformly distributed random numbers.
pub trait RngOracle: Send {
    /// Next raw 32-bit value.
    fn next_u32(&mut self) -> u32;

    /// Uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / (f64::from(u32::MAX) + 1.0)
    }

    /// Returns true with probability `p`.
    ///
    /// Mirrors the classic `p > random()` comparison, so `p <= 0` never hits
    /// and `p >= 1` always hits.
    fn chance(&mut self, p: f64) -> bool {
        p > self.next_f64()
    }

    fn coin_flip(&mut self) -> bool {
        self.next_u32() & 1 == 1
    }

    /// Uniform value in `[min, max]` inclusive.
    fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        (i64::from(min) + (u64::from(self.next_u32()) % span) as i64) as i32
    }

    /// Uniform value in `[0, len)`; zero when `len` is zero.
    fn below(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u32() as usize) % len
    }

    /// Uniform duration between two millisecond bounds.
    fn duration_between(&mut self, min_ms: u64, max_ms: u64) -> Duration {
        if min_ms >= max_ms {
            return Duration::from_millis(min_ms);
        }
        let span = (max_ms - min_ms) as f64;
        Duration::from_millis(min_ms + (self.next_f64() * span) as u64)
    }
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// PCG-XSH-RR: 32-bit output from 64-bit state.
///
/// # Properties
///
/// - **Deterministic**: same seed always produces the same sequence
/// - **Fast**: single multiply + xorshift + rotate
/// - **Small state**: only 64 bits
#[derive(Clone, Copy, Debug)]
pub struct PcgRng {
    state: u64,
}

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: 0 };
        rng.step();
        rng.state = rng.state.wrapping_add(seed);
        rng.step();
        rng
    }

    /// `state' = state × multiplier + increment (mod 2^64)`
    #[inline]
    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl Default for PcgRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.step();
        Self::output(old)
    }
}

/// Scripted generator for tests: replays the given unit-interval values.
///
/// Integer draws are derived from the same script so a test controls every
/// branch taken. Once the script runs out the last value repeats.
#[derive(Clone, Debug)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Every draw returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    fn next_value(&mut self) -> f64 {
        let value = match self.values.get(self.cursor) {
            Some(value) => *value,
            None => self.values.last().copied().unwrap_or(0.0),
        };
        self.cursor += 1;
        value.clamp(0.0, 0.999_999_999)
    }
}

impl RngOracle for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_value() * (f64::from(u32::MAX) + 1.0)) as u32
    }

    fn next_f64(&mut self) -> f64 {
        self.next_value()
    }

    fn coin_flip(&mut self) -> bool {
        self.next_value() >= 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcg_is_deterministic() {
        let mut a = PcgRng::new(99);
        let mut b = PcgRng::new(99);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
        assert_ne!(PcgRng::new(1).next_u32(), PcgRng::new(2).next_u32());
    }

    #[test]
    fn ranges_stay_inclusive() {
        let mut rng = PcgRng::new(7);
        for _ in 0..500 {
            let v = rng.range_i32(-3, 3);
            assert!((-3..=3).contains(&v));
            let f = rng.next_f64();
            assert!((0.0..1.0).contains(&f));
        }
        assert_eq!(rng.range_i32(5, 5), 5);
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn chance_extremes() {
        let mut rng = PcgRng::new(3);
        for _ in 0..100 {
            assert!(rng.chance(1.0));
            assert!(!rng.chance(0.0));
            assert!(!rng.chance(-0.5));
        }
    }

    #[test]
    fn scripted_rng_replays_values() {
        let mut rng = ScriptedRng::new(vec![0.1, 0.9]);
        assert!(rng.chance(0.5));
        assert!(!rng.chance(0.5));
        assert!(!rng.chance(0.5));
        assert_eq!(rng.duration_between(1_000, 2_000), Duration::from_millis(1_900));
    }
}
