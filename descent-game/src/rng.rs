//! Injected random sources shared by every encounter kind.
//!
//! Nothing in the engine owns a global generator. Callers pass any
//! [`RngCore`] into the operations that draw, which keeps tests able to force
//! a success or a failure with a stub.

use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use sha2::Sha256;

/// Map a single `u32` draw onto the open unit interval.
pub fn unit_roll<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    let sample = rng.next_u32();
    let denom = f64::from(u32::MAX) + 1.0;
    (f64::from(sample) + 0.5) / denom
}

/// Draw uniformly from `[low, high]` with a single `u32` draw.
pub fn uniform_between<R: RngCore + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high <= low {
        return low;
    }
    (high - low).mul_add(unit_roll(rng), low)
}

/// Pick an index in `0..len`, returning 0 for empty ranges.
pub fn pick_index<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let sample = usize::try_from(rng.next_u32()).unwrap_or(0);
    sample % len
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl<R> CountingRng<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Derive an independent, reproducible stream for one encounter instance.
#[must_use]
pub fn encounter_stream(user_seed: u64, encounter_id: &str) -> CountingRng<SmallRng> {
    let seed = derive_stream_seed(user_seed, encounter_id.as_bytes());
    CountingRng::new(SmallRng::seed_from_u64(seed))
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_roll_stays_inside_open_interval() {
        let mut low = StepRng(0);
        let mut high = StepRng(u32::MAX);
        let lo = unit_roll(&mut low);
        let hi = unit_roll(&mut high);
        assert!(lo > 0.0 && lo < 1e-6);
        assert!(hi < 1.0 && hi > 0.999_999);
    }

    #[test]
    fn streams_are_reproducible_and_separated() {
        let mut first = encounter_stream(77, "hazard-1");
        let mut again = encounter_stream(77, "hazard-1");
        let mut other = encounter_stream(77, "hazard-2");
        let a = first.next_u64();
        assert_eq!(a, again.next_u64());
        assert_ne!(a, other.next_u64());
        assert_eq!(first.draws(), 1);
    }

    #[test]
    fn pick_index_handles_degenerate_lengths() {
        let mut rng = StepRng(7);
        assert_eq!(pick_index(&mut rng, 0), 0);
        assert_eq!(pick_index(&mut rng, 1), 0);
        assert_eq!(pick_index(&mut rng, 3), 1);
    }

    struct StepRng(u32);

    impl RngCore for StepRng {
        fn next_u32(&mut self) -> u32 {
            self.0
        }

        fn next_u64(&mut self) -> u64 {
            u64::from(self.0)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }
}
