//! Explicit, injectable random-number context.
//!
//! Every sampling run owns an [`RngContext`] built from its seed. The
//! iteration range is cut into fixed-size chunks and chunk `i` draws from
//! ChaCha stream `i` of that seed, so results depend only on
//! `(seed, n_simulations)` and never on thread count or scheduling.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::ops::Range;

/// Iterations per independently seeded chunk.
pub const CHUNK_SIZE: usize = 16_384;

/// Random generator handed to each chunk.
pub type ChunkRng = ChaCha8Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngContext {
    seed: u64,
}

impl RngContext {
    pub fn new(seed: u64) -> Self {
        RngContext { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generator for chunk `index`: same key, distinct stream.
    pub fn chunk_rng(&self, index: usize) -> ChunkRng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(index as u64);
        rng
    }

    /// Split `0..n` into chunk ranges in iteration order.
    pub fn chunk_ranges(n: usize) -> Vec<Range<usize>> {
        (0..n)
            .step_by(CHUNK_SIZE)
            .map(|start| start..(start + CHUNK_SIZE).min(n))
            .collect()
    }

    /// Run `f` once per chunk of `0..n` and return the per-chunk results in
    /// iteration order. With the `parallel` feature chunks run on the rayon
    /// pool; the output is identical either way.
    pub fn map_chunks<T, F>(&self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&mut ChunkRng, Range<usize>) -> T + Sync + Send,
    {
        let ranges = Self::chunk_ranges(n);
        tracing::debug!(seed = self.seed, n, chunks = ranges.len(), "sampling chunks");

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            ranges
                .into_par_iter()
                .enumerate()
                .map(|(i, range)| f(&mut self.chunk_rng(i), range))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            ranges
                .into_iter()
                .enumerate()
                .map(|(i, range)| f(&mut self.chunk_rng(i), range))
                .collect()
        }
    }
}
