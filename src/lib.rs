//! `ext-int-sort` is an external merge sort for files of 32-bit integers.
//!
//! External sorting is a class of sorting algorithms that can handle massive amounts of data. External sorting
//! is required when the data being sorted do not fit into the main memory (RAM) of a computer and instead must be
//! resided in slower external memory, usually a hard disk drive. Sorting is achieved in two passes. During the
//! first pass it sorts chunks of data that each fit in RAM, during the second pass it merges the sorted chunks
//! together. For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! * **Two on-disk encodings:**
//!   raw 4-byte big-endian integers ([`Codec::Binary`]) or decimal integers joined by `", "` ([`Codec::Text`]).
//! * **Count-based memory budget:**
//!   at most `run_capacity` values are held in memory while building a run; the merge adds one output block
//!   plus one lookahead value per run.
//! * **Deterministic merge:**
//!   equal values coming from different runs are emitted in run creation order.
//! * **Progress channel:**
//!   optional bounded queue feeding a progress renderer on its own thread (see [`progress`]).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use ext_int_sort::{Codec, ExternalSorterBuilder};
//!
//! fn main() {
//!     let sorter = ExternalSorterBuilder::new()
//!         .with_codec(Codec::Binary)
//!         .with_run_capacity(10_000_000)
//!         .with_tmp_dir(Path::new("./"))
//!         .build()
//!         .unwrap();
//!
//!     let stats = sorter.sort(Path::new("input.bin"), Path::new("output.bin")).unwrap();
//!     println!("sorted {}", stats);
//! }
//! ```

pub mod buffer;
pub mod chunk;
pub mod codec;
pub mod merger;
pub mod progress;
pub mod run;
pub mod sort;

pub use buffer::BlockBuffer;
pub use chunk::ChunkProducer;
pub use codec::{Codec, CodecError, IntReader, IntWriter};
pub use merger::BinaryHeapMerger;
pub use progress::{ProgressMessage, ProgressReceiver, ProgressSender};
pub use run::{RunFile, RunManifest};
pub use sort::{external_sort, ExternalSorter, ExternalSorterBuilder, SortError, SortStats};
