//! Seeded random number generation.
//!
//! Every engine owns exactly one generator, created here, and only the
//! driving thread draws from it. Evaluation workers never see it, so a
//! fixed seed reproduces a run regardless of thread count.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Creates the engine's generator from a seed.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Resolves an optional seed, drawing a fresh one when absent.
///
/// The resolved seed is returned so it can be logged and replayed.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => rand::random(),
    }
}
