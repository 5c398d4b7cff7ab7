//! Staged writes
//!
//! Outputs are first written to a hidden temporary file next to their final
//! location (keeping the final extension, so format-sniffing tools behave),
//! then renamed into place without clobbering. A crash or Ctrl-C leaves no
//! truncated file under a final name; the temporary is removed on drop.

use crate::metadata::copy_file_timestamps;
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempPath;
use walkdir::WalkDir;

const STAGING_PREFIX: &str = ".downscale-";

/// Create an empty staging file in the directory of `dest`.
pub fn stage(dest: &Path) -> io::Result<TempPath> {
    let dir = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
    let suffix = dest
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let file = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}

/// Move a staged file to `dest`. Fails with `AlreadyExists` instead of
/// replacing a file that appeared in the meantime.
pub fn publish(staged: TempPath, dest: &Path) -> io::Result<()> {
    staged.persist_noclobber(dest).map_err(|e| e.error)
}

/// Byte-for-byte copy of `src` to `dest` through a staging file, keeping
/// the source timestamps. Returns the number of bytes copied.
pub fn copy_verbatim(src: &Path, dest: &Path) -> io::Result<u64> {
    let staged = stage(dest)?;
    let bytes = fs::copy(src, &staged)?;
    if let Err(e) = copy_file_timestamps(src, &staged) {
        tracing::debug!(error = %e, "Could not carry over timestamps");
    }
    publish(staged, dest)?;
    Ok(bytes)
}

/// True for staging files left behind by a killed run.
pub fn is_staging_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(STAGING_PREFIX))
        .unwrap_or(false)
}

/// Remove staging files anywhere under `dir`. Returns how many were removed.
pub fn sweep_staging(dir: &Path) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !is_staging_file(entry.path()) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!(path = %entry.path().display(), "Removed stale staging file");
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Failed to remove stale staging file");
            }
        }
    }
    removed
}
