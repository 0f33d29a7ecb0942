//! Deterministic seeded stream (mulberry32)
//!
//! Every procedural layout in the crate is drawn from this stream so the same seed
//! rebuilds the same layout on any platform, without caching the generated arrays.
//! Integer-only state, wrapping at 2^32.

use rand::RngCore;

const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;
const TWO_POW_24: f32 = 16_777_216.0;

/// Top 24 bits as a float in [0, 1); every value is exact in f32
fn unit_f32(raw: u32) -> f32 {
    (raw >> 8) as f32 / TWO_POW_24
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Raw 32-bit output; advances the state by one step
    pub fn next_raw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let mut x = self.state;
        x = (x ^ (x >> 15)).wrapping_mul(x | 1);
        x ^= x.wrapping_add((x ^ (x >> 7)).wrapping_mul(x | 61));
        x ^ (x >> 14)
    }

    /// Returns a float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.next_raw() as f64 / TWO_POW_32
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        unit_f32(self.next_raw())
    }

    /// Returns a float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        let v = min + self.next_f32() * (max - min);
        // The add can still round up onto `max` for the topmost draws
        if v < max {
            v
        } else {
            min
        }
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_raw() as u64;
        let lo = self.next_raw() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn known_sequence_for_seed_zero() {
        // Known-answer values for mulberry32 seeded with 0
        let mut rng = SeededRng::new(0);
        let first = rng.next_raw();
        let second = rng.next_raw();
        assert_eq!(first, 1_144_304_738);
        assert_eq!(second, 1_416_247);
    }

    #[test]
    fn samples_stay_in_unit_interval() {
        let mut rng = SeededRng::new(1337);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn single_precision_never_reaches_one() {
        assert_eq!(unit_f32(0), 0.0);
        assert!(unit_f32(u32::MAX) < 1.0);
        assert!(unit_f32(u32::MAX - 127) < 1.0);
        // The old f64 -> f32 cast rounded this draw up to 1.0
        assert_eq!((f64::from(u32::MAX - 127) / TWO_POW_32) as f32, 1.0);

        let mut rng = SeededRng::new(1337);
        for _ in 0..10_000 {
            assert!((0.0..1.0).contains(&rng.next_f32()));
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeededRng::new(2024);
        let mut b = SeededRng::new(2024);
        for _ in 0..256 {
            assert_eq!(a.next_raw(), b.next_raw());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededRng::new(1);
        let mut b = SeededRng::new(2);
        let same = (0..32).filter(|_| a.next_raw() == b.next_raw()).count();
        assert!(same < 32);
    }

    #[test]
    fn range_bounds() {
        let mut rng = SeededRng::new(42);
        for _ in 0..1000 {
            let v = rng.range(0.35, 1.70);
            assert!(v >= 0.35 && v < 1.70);
        }
    }

    #[test]
    fn works_through_rand_traits() {
        let mut rng = SeededRng::new(777);
        for _ in 0..100 {
            let v: u32 = rng.gen_range(0..4);
            assert!(v < 4);
        }
        let mut bytes = [0u8; 7];
        rng.fill_bytes(&mut bytes);
    }
}
