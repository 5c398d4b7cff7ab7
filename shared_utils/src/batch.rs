//! Batch Processing Module
//!
//! A lazy recursive walker that is independent of what it is looking for
//! (the predicate is supplied per pass), plus the per-run result counters.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursive file walker over one root.
///
/// Every call to [`FileWalker::files`] starts a fresh walk, so the same
/// walker serves the image pass and the video pass of a root.
#[derive(Debug, Clone)]
pub struct FileWalker {
    root: PathBuf,
    prune: Option<PathBuf>,
}

impl FileWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prune: None,
        }
    }

    /// Never descend into `dir` (e.g. an output tree nested in the source).
    pub fn prune(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prune = Some(dir.into());
        self
    }

    /// Regular files under the root accepted by `predicate`, in file-name
    /// order within each directory. Unreadable entries are logged and skipped.
    pub fn files<P>(&self, mut predicate: P) -> impl Iterator<Item = PathBuf>
    where
        P: FnMut(&Path) -> bool,
    {
        let prune = self.prune.clone();
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| prune.as_deref() != Some(entry.path()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "⚠️ Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(move |path| predicate(path))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Dry-run decisions that would have produced a write.
    pub planned: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub errors: Vec<(PathBuf, String)>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, input_bytes: u64, output_bytes: u64) {
        self.total += 1;
        self.succeeded += 1;
        self.input_bytes += input_bytes;
        self.output_bytes += output_bytes;
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push((path, error));
    }

    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn plan(&mut self) {
        self.total += 1;
        self.planned += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}
