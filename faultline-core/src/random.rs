//! Injectable random sources.
//!
//! Every probabilistic component takes a [`DynRng`] so a test can pass a
//! seeded generator and replay the exact same draws.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Boxed random source shared by the simulator and the injector.
pub type DynRng = Box<dyn RngCore + Send>;

/// Deterministic generator for a seed.
pub fn seeded(seed: u64) -> DynRng {
    Box::new(StdRng::seed_from_u64(seed))
}

/// Seeded generator when a seed is given, entropy-seeded otherwise.
pub fn rng_from(seed: Option<u64>) -> DynRng {
    match seed {
        Some(seed) => seeded(seed),
        None => Box::new(StdRng::from_entropy()),
    }
}
