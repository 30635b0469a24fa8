//! Run generation.

use std::io::prelude::*;

use crate::buffer::BlockBuffer;
use crate::codec::{Codec, IntReader};
use crate::progress::ProgressSender;
use crate::run::RunManifest;
use crate::sort::SortError;

/// Splits a stream into sorted runs of at most `run_capacity` values each.
pub struct ChunkProducer<'a> {
    codec: Codec,
    run_capacity: usize,
    rw_buf_size: Option<usize>,
    progress: Option<&'a ProgressSender>,
}

impl<'a> ChunkProducer<'a> {
    /// Creates a chunk producer.
    ///
    /// # Arguments
    /// * `codec` - Encoding used for the spilled runs
    /// * `run_capacity` - Memory budget: maximum number of values held in memory and stored per run
    pub fn new(codec: Codec, run_capacity: usize) -> Self {
        ChunkProducer {
            codec,
            run_capacity,
            rw_buf_size: None,
            progress: None,
        }
    }

    /// Sets run file write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: Option<usize>) -> Self {
        self.rw_buf_size = buf_size;
        return self;
    }

    /// Sets progress channel.
    pub fn with_progress(mut self, progress: Option<&'a ProgressSender>) -> Self {
        self.progress = progress;
        return self;
    }

    /// Reads the source to its end, spilling every sorted block as a new run of the manifest.
    /// Returns the number of values read.
    pub fn produce<R: BufRead>(
        &self,
        source: &mut IntReader<R>,
        manifest: &mut RunManifest,
    ) -> Result<u64, SortError> {
        let mut buffer = BlockBuffer::new(self.run_capacity);
        let mut total = 0u64;

        while !source.is_eof().map_err(|err| SortError::Codec(err))? {
            let n = buffer.refill(source).map_err(|err| SortError::Codec(err))?;
            if n == 0 {
                break;
            }

            log::debug!("sorting run data ({} values) ...", n);
            buffer.sort();

            let run = manifest.create_run(n).map_err(|err| SortError::TempDir(err))?;
            let run_index = run.index();

            log::debug!("saving run #{} to {}", run_index, run.path().display());
            let mut writer = self
                .codec
                .create_writer_with_capacity(run.path(), self.rw_buf_size)
                .map_err(|err| SortError::IO(err))?;
            writer.write_block(buffer.values()).map_err(|err| SortError::IO(err))?;
            writer.close().map_err(|err| SortError::IO(err))?;

            total += n as u64;
            if let Some(progress) = self.progress {
                progress.send(format!("split: run #{} spilled ({} values, {} total)", run_index, n, total));
            }
        }

        return Ok(total);
    }
}
