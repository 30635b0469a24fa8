//! External sorter.

use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use log;
use rayon::slice::ParallelSliceMut;

use crate::buffer::BlockBuffer;
use crate::chunk::ChunkProducer;
use crate::codec::{Codec, CodecError};
use crate::merger::BinaryHeapMerger;
use crate::progress::ProgressSender;
use crate::run::RunManifest;

/// Default memory budget: number of values held in memory per run.
pub const DEFAULT_RUN_CAPACITY: usize = 1000;
/// Default number of merged values written per block.
pub const DEFAULT_MERGE_BUF_SIZE: usize = 4096;

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Temporary directory or file creation error.
    TempDir(io::Error),
    /// Workers thread pool initialization error.
    ThreadPoolBuildError(rayon::ThreadPoolBuildError),
    /// Common I/O error.
    IO(io::Error),
    /// Data encoding error.
    Codec(CodecError),
    /// Sorter configuration error.
    InvalidConfig(String),
    /// Runs gave back fewer values than were spilled into them.
    RunCorrupted { expected: u64, merged: u64 },
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::TempDir(err) => Some(err),
            SortError::ThreadPoolBuildError(err) => Some(err),
            SortError::IO(err) => Some(err),
            SortError::Codec(err) => Some(err),
            SortError::InvalidConfig(_) => None,
            SortError::RunCorrupted { .. } => None,
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::TempDir(err) => write!(f, "temporary directory or file not created: {}", err),
            SortError::ThreadPoolBuildError(err) => write!(f, "thread pool initialization failed: {}", err),
            SortError::IO(err) => write!(f, "I/O operation failed: {}", err),
            SortError::Codec(err) => write!(f, "data decoding error: {}", err),
            SortError::InvalidConfig(msg) => write!(f, "invalid sorter configuration: {}", msg),
            SortError::RunCorrupted { expected, merged } => {
                write!(f, "temporary runs damaged: {} of {} values merged", merged, expected)
            }
        }
    }
}

/// Per-sort statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Number of runs spilled during the split phase.
    pub runs: usize,
    /// Number of values sorted.
    pub values: u64,
    pub split_elapsed: Duration,
    pub merge_elapsed: Duration,
}

impl SortStats {
    pub fn elapsed(&self) -> Duration {
        self.split_elapsed + self.merge_elapsed
    }
}

impl Display for SortStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} values, {} runs, split {}, merge {}",
            self.values,
            self.runs,
            format_elapsed(self.split_elapsed),
            format_elapsed(self.merge_elapsed)
        )
    }
}

/// Formats a duration as `mm:ss:mmm`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    format!("{:02}:{:02}:{:03}", millis / 1000 / 60, millis / 1000 % 60, millis % 1000)
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder {
    /// Encoding of the input, the runs and the output.
    codec: Codec,
    /// Maximum number of values held in memory while building a run.
    run_capacity: usize,
    /// Number of merged values collected before each output write.
    merge_buf_size: usize,
    /// Number of threads to be used by the in-memory sort.
    threads_number: Option<usize>,
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// File read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Progress channel.
    progress: Option<ProgressSender>,
}

impl ExternalSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter, SortError> {
        if self.run_capacity == 0 {
            return Err(SortError::InvalidConfig("run capacity must be at least 1".to_string()));
        }
        if self.merge_buf_size == 0 {
            return Err(SortError::InvalidConfig("merge buffer size must be at least 1".to_string()));
        }

        return Ok(ExternalSorter {
            codec: self.codec,
            run_capacity: self.run_capacity,
            merge_buf_size: self.merge_buf_size,
            thread_pool: ExternalSorter::init_thread_pool(self.threads_number)?,
            tmp_dir: self.tmp_dir,
            rw_buf_size: self.rw_buf_size,
            progress: self.progress,
        });
    }

    /// Sets the data encoding.
    pub fn with_codec(mut self, codec: Codec) -> ExternalSorterBuilder {
        self.codec = codec;
        return self;
    }

    /// Sets the memory budget as a number of values per run.
    pub fn with_run_capacity(mut self, run_capacity: usize) -> ExternalSorterBuilder {
        self.run_capacity = run_capacity;
        return self;
    }

    /// Sets the number of merged values written per block.
    pub fn with_merge_buf_size(mut self, merge_buf_size: usize) -> ExternalSorterBuilder {
        self.merge_buf_size = merge_buf_size;
        return self;
    }

    /// Sets number of threads to be used by the in-memory sort.
    pub fn with_threads_number(mut self, threads_number: usize) -> ExternalSorterBuilder {
        self.threads_number = Some(threads_number);
        return self;
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets file read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder {
        self.rw_buf_size = Some(buf_size);
        return self;
    }

    /// Sets progress channel. The sorter never sends the finish sentinel, the caller does.
    pub fn with_progress(mut self, progress: ProgressSender) -> ExternalSorterBuilder {
        self.progress = Some(progress);
        return self;
    }
}

impl Default for ExternalSorterBuilder {
    fn default() -> Self {
        ExternalSorterBuilder {
            codec: Codec::default(),
            run_capacity: DEFAULT_RUN_CAPACITY,
            merge_buf_size: DEFAULT_MERGE_BUF_SIZE,
            threads_number: None,
            tmp_dir: None,
            rw_buf_size: None,
            progress: None,
        }
    }
}

/// External sorter.
pub struct ExternalSorter {
    codec: Codec,
    run_capacity: usize,
    merge_buf_size: usize,
    /// In-memory sorting thread pool.
    thread_pool: rayon::ThreadPool,
    /// Parent of the per-sort temporary directories.
    tmp_dir: Option<Box<Path>>,
    rw_buf_size: Option<usize>,
    progress: Option<ProgressSender>,
}

impl ExternalSorter {
    fn init_thread_pool(threads_number: Option<usize>) -> Result<rayon::ThreadPool, SortError> {
        let mut thread_pool_builder = rayon::ThreadPoolBuilder::new();

        if let Some(threads_number) = threads_number {
            log::info!("initializing thread-pool (threads: {})", threads_number);
            thread_pool_builder = thread_pool_builder.num_threads(threads_number);
        } else {
            log::info!("initializing thread-pool (threads: default)");
        }
        let thread_pool = thread_pool_builder
            .build()
            .map_err(|err| SortError::ThreadPoolBuildError(err))?;

        return Ok(thread_pool);
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn run_capacity(&self) -> usize {
        self.run_capacity
    }

    /// Sorts the `source` file into the `dest` file using bounded memory.
    ///
    /// The source is split into sorted runs of at most `run_capacity` values spilled to a temporary
    /// directory, then the runs are merged into the destination. Runs are removed whether the sort
    /// succeeds or fails. A failed sort may leave a partially written destination.
    pub fn sort(&self, source: &Path, dest: &Path) -> Result<SortStats, SortError> {
        let mut manifest = RunManifest::new(self.tmp_dir.as_deref()).map_err(|err| SortError::TempDir(err))?;

        let result = self.sort_runs(source, dest, &mut manifest);
        manifest.cleanup();

        if let Ok(stats) = &result {
            log::info!("external sort done: {}", stats);
        }

        return result;
    }

    fn sort_runs(&self, source: &Path, dest: &Path, manifest: &mut RunManifest) -> Result<SortStats, SortError> {
        let mut stats = SortStats::default();

        let started = Instant::now();
        {
            let mut reader = self
                .codec
                .create_reader_with_capacity(source, self.rw_buf_size)
                .map_err(|err| SortError::IO(err))?;

            stats.values = ChunkProducer::new(self.codec, self.run_capacity)
                .with_rw_buf_size(self.rw_buf_size)
                .with_progress(self.progress.as_ref())
                .produce(&mut reader, manifest)?;
        }
        stats.runs = manifest.runs().len();
        stats.split_elapsed = started.elapsed();

        log::info!(
            "split done: {} values in {} runs ({})",
            stats.values,
            stats.runs,
            format_elapsed(stats.split_elapsed)
        );
        self.report(format!(
            "split: {} values in {} runs, {}",
            stats.values,
            stats.runs,
            format_elapsed(stats.split_elapsed)
        ));

        let started = Instant::now();
        let merged = self.merge_runs(dest, manifest)?;
        stats.merge_elapsed = started.elapsed();

        log::info!("merge done: {} values ({})", merged, format_elapsed(stats.merge_elapsed));
        self.report(format!("merge: {} values, {}", merged, format_elapsed(stats.merge_elapsed)));

        return Ok(stats);
    }

    fn merge_runs(&self, dest: &Path, manifest: &RunManifest) -> Result<u64, SortError> {
        let mut readers = Vec::with_capacity(manifest.runs().len());
        for run in manifest.runs() {
            let reader = self
                .codec
                .create_reader_with_capacity(run.path(), self.rw_buf_size)
                .map_err(|err| SortError::IO(err))?;
            readers.push(reader);
        }

        let mut merger = BinaryHeapMerger::new(readers);
        let mut writer = self
            .codec
            .create_writer_with_capacity(dest, self.rw_buf_size)
            .map_err(|err| SortError::IO(err))?;

        log::debug!("merging {} runs into {}", merger.active_runs(), dest.display());

        let mut block = BlockBuffer::new(self.merge_buf_size);
        let mut merged = 0u64;
        loop {
            let n = block
                .refill_from_merger(&mut merger)
                .map_err(|err| SortError::Codec(err))?;
            if n == 0 {
                break;
            }

            writer.write_block(block.values()).map_err(|err| SortError::IO(err))?;
            merged += n as u64;

            if block.is_full() {
                self.report(format!("merge: {} values written, {} runs active", merged, merger.active_runs()));
            }
        }
        writer.close().map_err(|err| SortError::IO(err))?;

        // damaged runs end early in the merge instead of failing it
        let expected: u64 = manifest.runs().iter().map(|run| run.len() as u64).sum();
        if merged != expected {
            log::error!("merged {} values, runs hold {}", merged, expected);
            return Err(SortError::RunCorrupted { expected, merged });
        }

        return Ok(merged);
    }

    /// Sorts the `source` file into the `dest` file entirely in memory using the sorter's thread pool.
    pub fn sort_in_memory(&self, source: &Path, dest: &Path) -> Result<SortStats, SortError> {
        let started = Instant::now();

        let mut values = Vec::new();
        self.codec
            .create_reader_with_capacity(source, self.rw_buf_size)
            .map_err(|err| SortError::IO(err))?
            .read_all(&mut values)
            .map_err(|err| SortError::Codec(err))?;

        log::debug!("sorting {} values in memory ...", values.len());
        self.thread_pool.install(|| {
            values.par_sort_unstable();
        });

        let mut writer = self
            .codec
            .create_writer_with_capacity(dest, self.rw_buf_size)
            .map_err(|err| SortError::IO(err))?;
        writer.write_block(&values).map_err(|err| SortError::IO(err))?;
        writer.close().map_err(|err| SortError::IO(err))?;

        let stats = SortStats {
            runs: 0,
            values: values.len() as u64,
            split_elapsed: started.elapsed(),
            merge_elapsed: Duration::ZERO,
        };
        log::info!("in-memory sort done: {}", stats);
        self.report(format!("in-memory: {} values, {}", stats.values, format_elapsed(stats.split_elapsed)));

        return Ok(stats);
    }

    fn report(&self, text: String) {
        if let Some(progress) = &self.progress {
            progress.send(text);
        }
    }
}

impl Debug for ExternalSorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalSorter")
            .field("codec", &self.codec)
            .field("run_capacity", &self.run_capacity)
            .field("merge_buf_size", &self.merge_buf_size)
            .field("tmp_dir", &self.tmp_dir)
            .field("rw_buf_size", &self.rw_buf_size)
            .finish()
    }
}

/// Sorts the `source` file into the `dest` file with default settings for everything but the codec and
/// the memory budget.
pub fn external_sort(source: &Path, dest: &Path, codec: Codec, run_capacity: usize) -> Result<SortStats, SortError> {
    ExternalSorterBuilder::new()
        .with_codec(codec)
        .with_run_capacity(run_capacity)
        .build()?
        .sort(source, dest)
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::{Path, PathBuf};

    use rand::seq::SliceRandom;
    use rand::Rng;
    use rstest::*;

    use super::{external_sort, format_elapsed, ExternalSorterBuilder, SortError};
    use crate::chunk::ChunkProducer;
    use crate::codec::Codec;
    use crate::progress::{self, Poll};
    use crate::run::RunManifest;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write_values(codec: Codec, path: &Path, values: &[i32]) {
        let mut writer = codec.create_writer(path).unwrap();
        writer.write_block(values).unwrap();
        writer.close().unwrap();
    }

    fn read_values(codec: Codec, path: &Path) -> Vec<i32> {
        let mut values = Vec::new();
        codec.create_reader(path).unwrap().read_all(&mut values).unwrap();
        values
    }

    fn paths(tmp_dir: &tempfile::TempDir) -> (PathBuf, PathBuf, PathBuf) {
        let runs = tmp_dir.path().join("runs");
        fs::create_dir(&runs).unwrap();
        (tmp_dir.path().join("input"), tmp_dir.path().join("output"), runs)
    }

    fn is_dir_empty(path: &Path) -> bool {
        fs::read_dir(path).unwrap().next().is_none()
    }

    #[rstest]
    #[case(Codec::Binary)]
    #[case(Codec::Text)]
    fn test_worked_example(tmp_dir: tempfile::TempDir, #[case] codec: Codec) {
        let (input, output, runs) = paths(&tmp_dir);
        write_values(codec, &input, &[3, 89, 72, 92, 47, 45, 51, 37, 37, 62, 22, 97]);

        let sorter = ExternalSorterBuilder::new()
            .with_codec(codec)
            .with_run_capacity(4)
            .with_tmp_dir(&runs)
            .build()
            .unwrap();
        let stats = sorter.sort(&input, &output).unwrap();

        assert_eq!(stats.runs, 3);
        assert_eq!(stats.values, 12);
        assert_eq!(
            read_values(codec, &output),
            vec![3, 22, 37, 37, 45, 47, 51, 62, 72, 89, 92, 97]
        );
        assert!(is_dir_empty(&runs));
    }

    #[test]
    fn test_text_output_format() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let (input, output, _) = paths(&tmp_dir);
        fs::write(&input, "5, -2, 9, 0, -2").unwrap();

        external_sort(&input, &output, Codec::Text, 2).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "-2, -2, 0, 5, 9");
    }

    #[test]
    fn test_binary_output_format() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let (input, output, _) = paths(&tmp_dir);
        fs::write(&input, [0x00u8, 0x00, 0x00, 0x02, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01]).unwrap();

        external_sort(&input, &output, Codec::Binary, 1).unwrap();

        assert_eq!(
            fs::read(&output).unwrap(),
            vec![0xffu8, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]
        );
    }

    #[rstest]
    fn test_random_input(
        tmp_dir: tempfile::TempDir,
        #[values(Codec::Binary, Codec::Text)] codec: Codec,
        #[values(3, 7, 200, 10_000)] run_capacity: usize,
    ) {
        let (input, output, runs) = paths(&tmp_dir);

        let mut rng = rand::thread_rng();
        let values: Vec<i32> = (0..600).map(|_| rng.gen_range(-500..500)).collect();
        write_values(codec, &input, &values);

        let sorter = ExternalSorterBuilder::new()
            .with_codec(codec)
            .with_run_capacity(run_capacity)
            .with_merge_buf_size(64)
            .with_tmp_dir(&runs)
            .build()
            .unwrap();
        let stats = sorter.sort(&input, &output).unwrap();

        let mut expected = values.clone();
        expected.sort();
        assert_eq!(read_values(codec, &output), expected);
        assert_eq!(stats.runs, (values.len() + run_capacity - 1) / run_capacity);
        assert!(is_dir_empty(&runs));
    }

    #[rstest]
    #[case(Codec::Binary)]
    #[case(Codec::Text)]
    fn test_extreme_values(tmp_dir: tempfile::TempDir, #[case] codec: Codec) {
        let (input, output, _) = paths(&tmp_dir);
        write_values(codec, &input, &[i32::MAX, 0, i32::MIN, -1, i32::MAX, i32::MIN]);

        external_sort(&input, &output, codec, 2).unwrap();

        assert_eq!(
            read_values(codec, &output),
            vec![i32::MIN, i32::MIN, -1, 0, i32::MAX, i32::MAX]
        );
    }

    #[rstest]
    #[case(Codec::Binary)]
    #[case(Codec::Text)]
    fn test_empty_input(tmp_dir: tempfile::TempDir, #[case] codec: Codec) {
        let (input, output, _) = paths(&tmp_dir);
        fs::write(&input, "").unwrap();

        let stats = external_sort(&input, &output, codec, 4).unwrap();

        assert_eq!(stats.runs, 0);
        assert_eq!(stats.values, 0);
        assert_eq!(fs::metadata(&output).unwrap().len(), 0);
    }

    #[rstest]
    #[case(Codec::Binary)]
    #[case(Codec::Text)]
    fn test_single_run_is_a_copy(tmp_dir: tempfile::TempDir, #[case] codec: Codec) {
        let (input, output, _) = paths(&tmp_dir);
        write_values(codec, &input, &[4, 1, 3]);

        let stats = external_sort(&input, &output, codec, 3).unwrap();

        assert_eq!(stats.runs, 1);
        assert_eq!(read_values(codec, &output), vec![1, 3, 4]);
    }

    #[rstest]
    fn test_idempotence(
        tmp_dir: tempfile::TempDir,
        #[values(Codec::Binary, Codec::Text)] codec: Codec,
        #[values(1, 3, 50)] run_capacity: usize,
    ) {
        let (input, output, _) = paths(&tmp_dir);
        let sorted: Vec<i32> = (0..40).map(|i| i / 3).collect();
        write_values(codec, &input, &sorted);

        external_sort(&input, &output, codec, run_capacity).unwrap();

        assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());
    }

    #[rstest]
    fn test_deterministic_output(tmp_dir: tempfile::TempDir) {
        let (input, output, _) = paths(&tmp_dir);
        let second = tmp_dir.path().join("second");

        let mut values: Vec<i32> = (0..300).map(|i| i % 17).collect();
        values.shuffle(&mut rand::thread_rng());
        write_values(Codec::Binary, &input, &values);

        external_sort(&input, &output, Codec::Binary, 16).unwrap();
        external_sort(&input, &second, Codec::Binary, 16).unwrap();

        assert_eq!(fs::read(&output).unwrap(), fs::read(&second).unwrap());
    }

    #[rstest]
    fn test_malformed_input_cleans_up(tmp_dir: tempfile::TempDir) {
        let (input, output, runs) = paths(&tmp_dir);
        fs::write(&input, "4, 3, 2, 1, 0, oops").unwrap();

        let sorter = ExternalSorterBuilder::new()
            .with_codec(Codec::Text)
            .with_run_capacity(2)
            .with_tmp_dir(&runs)
            .build()
            .unwrap();

        match sorter.sort(&input, &output) {
            Err(SortError::Codec(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(is_dir_empty(&runs));
    }

    #[rstest]
    fn test_damaged_run_fails_merge(tmp_dir: tempfile::TempDir) {
        let (input, output, runs) = paths(&tmp_dir);
        write_values(Codec::Binary, &input, &[8, 3, 6, 1, 5, 2, 7, 4]);

        let sorter = ExternalSorterBuilder::new()
            .with_codec(Codec::Binary)
            .with_run_capacity(4)
            .build()
            .unwrap();

        let mut manifest = RunManifest::new(Some(runs.as_path())).unwrap();
        let mut reader = Codec::Binary.create_reader(&input).unwrap();
        let produced = ChunkProducer::new(Codec::Binary, 4)
            .produce(&mut reader, &mut manifest)
            .unwrap();
        assert_eq!(produced, 8);

        // cut the last value of the first run in half
        let first_run = manifest.runs()[0].path();
        let file = fs::OpenOptions::new().write(true).open(first_run).unwrap();
        file.set_len(4 * 4 - 2).unwrap();
        drop(file);

        match sorter.merge_runs(&output, &manifest) {
            Err(SortError::RunCorrupted { expected, merged }) => {
                assert_eq!(expected, 8);
                assert_eq!(merged, 7);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        manifest.cleanup();
        assert!(is_dir_empty(&runs));
    }

    #[rstest]
    fn test_missing_input(tmp_dir: tempfile::TempDir) {
        let (input, output, runs) = paths(&tmp_dir);

        let sorter = ExternalSorterBuilder::new().with_tmp_dir(&runs).build().unwrap();

        match sorter.sort(&input, &output) {
            Err(SortError::IO(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(is_dir_empty(&runs));
    }

    #[rstest]
    #[case(ExternalSorterBuilder::new().with_run_capacity(0))]
    #[case(ExternalSorterBuilder::new().with_merge_buf_size(0))]
    fn test_invalid_config(#[case] builder: ExternalSorterBuilder) {
        match builder.build() {
            Err(SortError::InvalidConfig(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[rstest]
    #[case(Codec::Binary)]
    #[case(Codec::Text)]
    fn test_sort_in_memory(tmp_dir: tempfile::TempDir, #[case] codec: Codec) {
        let (input, output, _) = paths(&tmp_dir);
        let mut values = Vec::from_iter(0..1000);
        values.shuffle(&mut rand::thread_rng());
        write_values(codec, &input, &values);

        let sorter = ExternalSorterBuilder::new()
            .with_codec(codec)
            .with_threads_number(2)
            .build()
            .unwrap();
        let stats = sorter.sort_in_memory(&input, &output).unwrap();

        assert_eq!(stats.values, 1000);
        assert_eq!(read_values(codec, &output), Vec::from_iter(0..1000));
    }

    #[rstest]
    fn test_progress_messages(tmp_dir: tempfile::TempDir) {
        let (input, output, _) = paths(&tmp_dir);
        write_values(Codec::Text, &input, &[3, 1, 2]);

        let (sender, receiver) = progress::channel(16);
        let sorter = ExternalSorterBuilder::new()
            .with_run_capacity(2)
            .with_merge_buf_size(2)
            .with_progress(sender.clone())
            .build()
            .unwrap();
        sorter.sort(&input, &output).unwrap();
        sender.finish();

        let mut messages = Vec::new();
        loop {
            match receiver.poll(std::time::Duration::from_millis(10)) {
                Poll::Message(text) => messages.push(text),
                Poll::Finished => break,
                other => panic!("unexpected poll result: {:?}", other),
            }
        }

        assert_eq!(messages.len(), 5);
        assert!(messages[0].starts_with("split: run #0 spilled"));
        assert!(messages[1].starts_with("split: run #1 spilled"));
        assert!(messages[2].starts_with("split: 3 values in 2 runs"));
        assert_eq!(messages[3], "merge: 2 values written, 1 runs active");
        assert!(messages[4].starts_with("merge: 3 values"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(std::time::Duration::from_millis(61_005)), "01:01:005");
    }
}
