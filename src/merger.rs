//! Binary heap merger.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::prelude::*;

use crate::codec::{CodecError, IntReader};

/// Binary heap merger implementation.
/// Merges multiple sorted runs into a single sorted output.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of items,
/// *n* is the number of runs (inputs).
///
/// Equal values are taken from the run created first, so the output order of duplicates depends only
/// on run creation order.
pub struct BinaryHeapMerger<R> {
    // binary heap is max-heap by default so we reverse it to convert it to min-heap;
    // each entry mirrors the lookahead slot of an active reader
    items: BinaryHeap<Reverse<(i32, usize)>>,
    // indexed by run creation order, exhausted readers are dropped and never come back
    readers: Vec<Option<IntReader<R>>>,
}

impl<R: BufRead> BinaryHeapMerger<R> {
    /// Creates an instance of a binary heap merger using readers as inputs, one per run in creation order.
    /// Each reader is primed with its first value; empty runs are dropped right away.
    /// Run values should be sorted in ascending order otherwise the result is undefined.
    ///
    /// Never fails: a reader whose first value cannot be decoded counts as an empty run.
    pub fn new<I>(readers: I) -> Self
    where
        I: IntoIterator<Item = IntReader<R>>,
    {
        let mut active = Vec::new();
        let mut items = BinaryHeap::new();

        for (idx, mut reader) in readers.into_iter().enumerate() {
            // the lookahead slot reports decoding errors as end of stream
            match reader.cached_value() {
                Ok(value) => {
                    items.push(Reverse((value, idx)));
                    active.push(Some(reader));
                }
                Err(_) => active.push(None),
            }
        }

        return BinaryHeapMerger { items, readers: active };
    }

    /// Returns the number of runs that still hold values.
    pub fn active_runs(&self) -> usize {
        self.items.len()
    }

    /// Returns the next value in ascending order together with the index of the run it was taken from.
    pub fn next_entry(&mut self) -> Result<Option<(i32, usize)>, CodecError> {
        let Reverse((value, idx)) = match self.items.pop() {
            Some(item) => item,
            None => return Ok(None),
        };

        let exhausted = match self.readers[idx].as_mut() {
            Some(reader) => reader.is_eof()? || !reader.cache_next_value(),
            None => true,
        };

        if exhausted {
            self.readers[idx] = None;
            log::debug!("run #{} exhausted ({} runs left)", idx, self.items.len());
        } else if let Some(reader) = self.readers[idx].as_mut() {
            self.items.push(Reverse((reader.cached_value()?, idx)));
        }

        return Ok(Some((value, idx)));
    }

    /// Fills `buf` with the next values in ascending order and returns the number of values written.
    /// Zero means every run is exhausted.
    pub fn fill_block(&mut self, buf: &mut [i32]) -> Result<usize, CodecError> {
        let mut n = 0;

        while n < buf.len() {
            match self.next_entry()? {
                Some((value, _)) => buf[n] = value,
                None => break,
            }
            n += 1;
        }

        return Ok(n);
    }
}

impl<R: BufRead> Iterator for BinaryHeapMerger<R> {
    type Item = Result<i32, CodecError>;

    /// Returns the next value from the runs in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose().map(|entry| entry.map(|(value, _)| value))
    }
}
