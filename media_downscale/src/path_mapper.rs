//! Source to destination path mapping
//!
//! A source root is mirrored under the output root by its path relative to
//! the working directory. Every comparison happens on resolved paths, so
//! `.`, `..` and symlinks cannot sneak an output into the source tree.

use shared_utils::common_utils::with_replaced_extension;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::config::VIDEO_EXTENSION;

#[derive(Error, Debug)]
pub enum PathError {
    #[error(
        "Output {} would overwrite source root {}",
        destination.display(),
        source_root.display()
    )]
    WouldOverwriteSource {
        source_root: PathBuf,
        destination: PathBuf,
    },

    #[error("Cannot resolve {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl PathError {
    /// Only an overwrite violation stops the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PathError::WouldOverwriteSource { .. })
    }
}

/// Lexically drop `.` and fold `..` into the preceding component.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonical form of `path`, which need not exist: the longest existing
/// ancestor is canonicalized and the missing tail appended.
pub fn resolve_lenient(path: &Path, cwd: &Path) -> io::Result<PathBuf> {
    let absolute = normalize(&cwd.join(path));
    let mut existing = absolute.as_path();
    let mut tail = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut resolved) => {
                resolved.extend(tail.iter().rev());
                return Ok(resolved);
            }
            Err(e) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    tail.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Err(e),
            },
        }
    }
}

/// Components of `path` below the filesystem root (or drive prefix).
fn relative_components(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

pub fn check_overwrite(source_root: &Path, destination: &Path) -> Result<(), PathError> {
    if source_root == destination {
        return Err(PathError::WouldOverwriteSource {
            source_root: source_root.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Destination directory for `source_root` (canonical), given a resolved
/// `output_root` and canonical `cwd`.
pub fn map_root(source_root: &Path, output_root: &Path, cwd: &Path) -> Result<PathBuf, PathError> {
    let mirrored = match source_root.strip_prefix(cwd) {
        Ok(relative) => output_root.join(relative),
        Err(_) => output_root.join(relative_components(source_root)),
    };
    let destination = resolve_lenient(&mirrored, cwd).map_err(|source| PathError::Resolve {
        path: mirrored.clone(),
        source,
    })?;
    check_overwrite(source_root, &destination)?;
    Ok(destination)
}

/// Mirrored directory of `file` under `destination_root`.
pub fn map_file(file: &Path, source_root: &Path, destination_root: &Path) -> PathBuf {
    let relative = file
        .parent()
        .and_then(|parent| parent.strip_prefix(source_root).ok())
        .unwrap_or_else(|| Path::new(""));
    destination_root.join(relative)
}

/// A source root that passed every safety check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPlan {
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    /// Output subtree nested inside this source root; never walked.
    pub prune: Option<PathBuf>,
}

pub fn plan_root(root: &Path, output_root: &Path, cwd: &Path) -> Result<RootPlan, PathError> {
    let joined = cwd.join(root);
    let source_root = joined.canonicalize().map_err(|source| PathError::Resolve {
        path: joined.clone(),
        source,
    })?;
    if !source_root.is_dir() {
        return Err(PathError::NotADirectory(source_root));
    }

    check_overwrite(&source_root, output_root)?;
    let destination_root = map_root(&source_root, output_root, cwd)?;

    let prune = [output_root, destination_root.as_path()]
        .into_iter()
        .find(|p| p.starts_with(&source_root))
        .map(Path::to_path_buf);

    Ok(RootPlan {
        source_root,
        destination_root,
        prune,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// One discovered file and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source_path: PathBuf,
    pub kind: MediaKind,
    pub destination_dir: PathBuf,
    /// Converted output name (extension replaced).
    pub destination_path: PathBuf,
}

impl FileTask {
    pub fn new(
        source_path: &Path,
        kind: MediaKind,
        destination_dir: PathBuf,
        image_extension: &str,
    ) -> Option<Self> {
        let extension = match kind {
            MediaKind::Image => image_extension,
            MediaKind::Video => VIDEO_EXTENSION,
        };
        let name = with_replaced_extension(source_path, extension)?;
        Some(Self {
            source_path: source_path.to_path_buf(),
            kind,
            destination_path: destination_dir.join(name),
            destination_dir,
        })
    }

    /// Where a verbatim copy lands: the original file name, unchanged.
    pub fn copy_path(&self) -> PathBuf {
        match self.source_path.file_name() {
            Some(name) => self.destination_dir.join(name),
            None => self.destination_path.clone(),
        }
    }
}
