//! Runtime random source backed by `rand`.

use creature_core::RngOracle;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// [`RngOracle`] over the standard CSPRNG.
///
/// Seeded runs are reproducible; unseeded ones draw from OS entropy.
#[derive(Debug)]
pub struct StdRngOracle(StdRng);

impl StdRngOracle {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl RngOracle for StdRngOracle {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_rolls() {
        let mut a = StdRngOracle::seeded(7);
        let mut b = StdRngOracle::seeded(7);
        let rolls_a: Vec<i32> = (0..16).map(|_| a.range_i32(1, 100)).collect();
        let rolls_b: Vec<i32> = (0..16).map(|_| b.range_i32(1, 100)).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|r| (1..=100).contains(r)));
    }
}
