//! Integer block limited by elements count, shared by the split and merge phases.

use std::io::prelude::*;

use crate::codec::{CodecError, IntReader};
use crate::merger::BinaryHeapMerger;

// values reserved up front; larger blocks grow while they are filled
const INITIAL_CAPACITY: usize = 4096;

/// Block of integers limited by elements count.
/// Memory grows with the values actually read and is reused for every refill.
pub struct BlockBuffer {
    inner: Vec<i32>,
    limit: usize,
}

impl BlockBuffer {
    /// Creates a buffer holding at most `limit` values.
    pub fn new(limit: usize) -> Self {
        BlockBuffer {
            inner: Vec::with_capacity(limit.min(INITIAL_CAPACITY)),
            limit,
        }
    }

    /// Returns the maximum number of values the buffer holds.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of values currently held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Checks if the buffer reached the limit.
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }

    pub fn values(&self) -> &[i32] {
        &self.inner
    }

    /// Replaces the buffer content with the next block read from the stream.
    pub fn refill<R: BufRead>(&mut self, reader: &mut IntReader<R>) -> Result<usize, CodecError> {
        return self.fill_with(|buf| reader.read_block(buf));
    }

    /// Replaces the buffer content with the next block of merged values.
    pub fn refill_from_merger<R: BufRead>(&mut self, merger: &mut BinaryHeapMerger<R>) -> Result<usize, CodecError> {
        return self.fill_with(|buf| merger.fill_block(buf));
    }

    /// Sorts held values in ascending order.
    pub fn sort(&mut self) {
        self.inner.sort_unstable();
    }

    // `fill` must fill the whole slice unless the source runs out of values
    fn fill_with<F>(&mut self, mut fill: F) -> Result<usize, CodecError>
    where
        F: FnMut(&mut [i32]) -> Result<usize, CodecError>,
    {
        self.inner.clear();

        while self.inner.len() < self.limit {
            let filled = self.inner.len();
            let step = (self.limit - filled).min(filled.max(INITIAL_CAPACITY));

            self.inner.resize(filled + step, 0);
            let result = fill(&mut self.inner[filled..]);
            let n = match result {
                Ok(n) => n,
                Err(err) => {
                    self.inner.truncate(filled);
                    return Err(err);
                }
            };
            self.inner.truncate(filled + n);

            if n < step {
                break;
            }
        }

        return Ok(self.inner.len());
    }
}
