//! Randomness boundary for the engine.
//!
//! Every randomized operation takes a caller-supplied `Rng`, so the source is
//! swappable in one place. The convenience default is a general-purpose PRNG
//! with no cryptographic-strength guarantee, matching the didactic intent;
//! substitute a CSPRNG through the same seam where that matters.

use rand::rngs::ThreadRng;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

use crate::sha256;

/// Process-default randomness source.
pub type DefaultRng = ThreadRng;

pub fn default_rng() -> DefaultRng {
    rand::thread_rng()
}

/// Deterministic RNG derived from a label, for reproducible tests and demos.
pub fn derive_rng(label: &[u8]) -> ChaCha20Rng {
    ChaCha20Rng::from_seed(sha256::digest(label))
}
