//! Reviewer assignment
//!
//! Pure selection functions plus the source of randomness they draw from.
//! The orchestrator asks a [`RandomSource`] for a fresh generator per
//! operation, so requests never share generator state and tests can swap in
//! a seeded or mock generator.

pub mod selection;

pub use selection::{select_initial_reviewers, select_replacement};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

pub type BoxRng = Box<dyn RngCore + Send>;

pub trait RandomSource: Send + Sync {
    fn rng(&self) -> BoxRng;
}

/// Generators seeded from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropySource;

impl RandomSource for EntropySource {
    fn rng(&self) -> BoxRng {
        Box::new(StdRng::from_entropy())
    }
}

/// Every generator starts from the same seed.
#[derive(Debug, Clone, Copy)]
pub struct SeededSource(pub u64);

impl RandomSource for SeededSource {
    fn rng(&self) -> BoxRng {
        Box::new(StdRng::seed_from_u64(self.0))
    }
}

impl<F> RandomSource for F
where
    F: Fn() -> BoxRng + Send + Sync,
{
    fn rng(&self) -> BoxRng {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::Rng;

    #[test]
    fn test_seeded_source_repeats() {
        let source = SeededSource(7);
        let a: Vec<u32> = (0..4).map(|_| source.rng().gen()).collect();
        let b: Vec<u32> = (0..4).map(|_| source.rng().gen()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_closure_source() {
        let source = || -> BoxRng { Box::new(StepRng::new(3, 0)) };
        assert_eq!(source.rng().next_u64(), 3);
    }
}
