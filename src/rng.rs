//! Deterministic pseudo-random sequence generator.
//!
//! Minimal standard Park-Miller generator: a multiplicative linear
//! congruential recurrence with modulus 2^31 - 1 and multiplier 16807,
//! evaluated with Schrage's factorization so every intermediate value fits
//! in 32 bits. The same seed always yields the same sequence, which is what
//! makes instance generation, tour construction and perturbation
//! reproducible from a single number.

use rand::{Error, RngCore, SeedableRng};

use crate::error::{SolverError, SolverResult};

/// Modulus of the recurrence (2^31 - 1).
pub const MODULUS: i32 = 2_147_483_647;
/// Multiplier of the recurrence.
pub const MULTIPLIER: i32 = 16_807;
/// Schrage quotient: MODULUS / MULTIPLIER.
const Q: i32 = 127_773;
/// Schrage remainder: MODULUS % MULTIPLIER.
const R: i32 = 2_836;

/// Park-Miller "minimal standard" generator.
///
/// Owned explicitly by whoever needs randomness; there is no global state.
/// Independent runs need independently seeded instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkMiller {
    state: i32,
}

impl ParkMiller {
    /// Create a generator from a seed.
    ///
    /// Seeds congruent to 0 modulo 2^31 - 1 are rejected: the recurrence
    /// would never leave its fixed point.
    pub fn new(seed: u64) -> SolverResult<Self> {
        let state = seed % MODULUS as u64;
        if state == 0 {
            return Err(SolverError::parameter(
                "seed",
                format!("must not be a multiple of {}", MODULUS),
            ));
        }
        Ok(ParkMiller { state: state as i32 })
    }

    /// Current internal state.
    pub fn state(&self) -> i32 {
        self.state
    }

    /// Advance the recurrence once and return the new state, in [1, 2^31 - 2].
    #[inline]
    pub fn advance(&mut self) -> i32 {
        let next = MULTIPLIER * (self.state % Q) - R * (self.state / Q);
        self.state = if next > 0 { next } else { next + MODULUS };
        self.state
    }

    /// Return an integer in [0, n-1].
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    #[inline]
    pub fn next(&mut self, n: usize) -> usize {
        assert!(n > 0, "ParkMiller::next requires a non-empty range");
        self.advance() as usize % n
    }
}

impl Default for ParkMiller {
    fn default() -> Self {
        ParkMiller { state: 1 }
    }
}

impl SeedableRng for ParkMiller {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seed_from_u64(u32::from_le_bytes(seed) as u64)
    }

    /// Maps any value onto the valid seed range; a multiple of the modulus
    /// becomes 1.
    fn seed_from_u64(state: u64) -> Self {
        ParkMiller::new(state).unwrap_or_default()
    }
}

impl RngCore for ParkMiller {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.advance() as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let high = self.next_u32() as u64;
        let low = self.next_u32() as u64;
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
