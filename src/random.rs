//! The seeded random stream threaded through one generation call.

use std::ops::RangeInclusive;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic stream of random draws.
///
/// Backed by ChaCha8, a counter-based generator whose output is identical on
/// every platform, so a seed reproduces the same messages everywhere.
/// `RandomStream` implements [`RngCore`], which lets overrides use the full
/// [`rand::Rng`] API on it.
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn next_bool(&mut self) -> bool {
        self.rng.r#gen()
    }

    /// A float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.rng.r#gen()
    }

    /// A double in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.rng.r#gen()
    }

    /// A uniformly chosen index into a collection of `len` elements.
    ///
    /// `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// A uniformly chosen integer in `range`. A single-value range is
    /// returned without consuming a draw.
    pub fn int_in_range(&mut self, range: RangeInclusive<usize>) -> usize {
        let (min, max) = range.into_inner();
        if min == max {
            min
        } else {
            self.rng.gen_range(min..=max)
        }
    }
}

impl RngCore for RandomStream {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}
