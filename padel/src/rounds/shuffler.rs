//! Injectable random source for pairing draws.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Shuffles players for round draws
pub struct Shuffler {
    /// Random number generator
    rng: StdRng,
}

impl Shuffler {
    /// Create a shuffler seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a deterministic shuffler
    ///
    /// The same seed always produces the same sequence of draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Shuffle items uniformly in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl Default for Shuffler {
    fn default() -> Self {
        Self::new()
    }
}
