//! Shuffle selection
//!
//! With shuffle on, each advance draws one uniformly random index from the
//! remaining queue. The queue itself is never reordered, so turning shuffle
//! off resumes plain FIFO order over whatever is left.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random index source for shuffled advances
#[derive(Debug, Clone)]
pub struct ShufflePicker {
    rng: StdRng,
}

impl ShufflePicker {
    /// Create a picker; a seed makes the draw sequence reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Pick one index in `0..len`, or `None` for an empty queue
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }
}

impl Default for ShufflePicker {
    fn default() -> Self {
        Self::new(None)
    }
}
