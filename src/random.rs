use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A supply of random bytes for the `Cxkk` instruction
pub trait RandomSource {
    fn next_byte(&mut self) -> u8;
}

/// Uniformly distributed bytes from a seedable PRNG
pub struct EntropyRandom {
    rng: StdRng,
}

impl EntropyRandom {
    /// Seeds from operating system entropy
    pub fn new() -> Self {
        EntropyRandom {
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible sequence for a given seed
    pub fn with_seed(seed: u64) -> Self {
        EntropyRandom {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for EntropyRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRandom {
    fn next_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}

/// Replays a fixed sequence of bytes, starting over once it runs out.
/// An empty sequence always yields 0.
pub struct ReplayRandom {
    bytes: Vec<u8>,
    cursor: usize,
}

impl ReplayRandom {
    pub fn new(bytes: Vec<u8>) -> Self {
        ReplayRandom { bytes, cursor: 0 }
    }
}

impl RandomSource for ReplayRandom {
    fn next_byte(&mut self) -> u8 {
        if self.bytes.is_empty() {
            return 0;
        }
        let byte = self.bytes[self.cursor];
        self.cursor = (self.cursor + 1) % self.bytes.len();
        byte
    }
}
