//! Spilled runs and their on-disk lifecycle.

use std::io;
use std::path::Path;

use tempfile;

/// Sorted run spilled to temporary storage.
pub struct RunFile {
    index: usize,
    len: usize,
    path: tempfile::TempPath,
}

impl RunFile {
    /// Creation order of the run, starting from zero.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of values stored in the run.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Manifest of every run created by a single sort.
///
/// Runs live in a private temporary directory. [`RunManifest::cleanup`] removes them explicitly and
/// logs what it could not remove; the `tempfile` drop guards only cover unwinding.
pub struct RunManifest {
    dir: tempfile::TempDir,
    runs: Vec<RunFile>,
}

impl RunManifest {
    /// Creates a manifest with a fresh temporary directory under `tmp_path`, or under the OS temporary
    /// directory if the parameter is [`None`].
    pub fn new(tmp_path: Option<&Path>) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("ext-int-sort-").tempdir_in(match tmp_path {
            Some(tmp_path) => tmp_path.to_path_buf(),
            None => std::env::temp_dir(),
        })?;

        log::info!("using {} as a temporary directory", dir.path().display());

        return Ok(RunManifest { dir, runs: Vec::new() });
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Reserves a new empty run file holding `len` values and returns it.
    pub fn create_run(&mut self, len: usize) -> io::Result<&RunFile> {
        let index = self.runs.len();
        let path = tempfile::Builder::new()
            .prefix(&format!("run-{:06}-", index))
            .suffix(".tmp")
            .tempfile_in(self.dir.path())?
            .into_temp_path();

        self.runs.push(RunFile { index, len, path });

        return Ok(&self.runs[index]);
    }

    /// Runs in creation order.
    pub fn runs(&self) -> &[RunFile] {
        &self.runs
    }

    /// Deletes every run and the temporary directory. Failures are logged, never returned.
    pub fn cleanup(self) {
        let run_count = self.runs.len();

        for run in self.runs {
            let display = run.path.display().to_string();
            if let Err(err) = run.path.close() {
                log::warn!("run file {} not removed: {}", display, err);
            }
        }

        let dir = self.dir.path().display().to_string();
        match self.dir.close() {
            Ok(()) => log::debug!("temporary directory {} removed ({} runs)", dir, run_count),
            Err(err) => log::warn!("temporary directory {} not removed: {}", dir, err),
        }
    }
}
