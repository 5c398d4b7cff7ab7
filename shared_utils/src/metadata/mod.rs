//! Metadata Preservation Module
//!
//! Internal tags go through ExifTool ([`ExifTool`]); filesystem timestamps
//! are carried over with `filetime`. ExifTool rewrites the file, so
//! timestamps must always be applied after the last tag write.

use std::io;
use std::path::Path;

mod exif;

pub use exif::{ExifTool, TagValue};

/// Copy access and modification times from `src` onto `dst`.
pub fn copy_file_timestamps(src: &Path, dst: &Path) -> io::Result<()> {
    let m = std::fs::metadata(src)?;
    let atime = filetime::FileTime::from_last_access_time(&m);
    let mtime = filetime::FileTime::from_last_modification_time(&m);
    filetime::set_file_times(dst, atime, mtime)
}

/// Give `dst` the permission bits of `src` (staging files are created
/// owner-only).
pub fn copy_permissions(src: &Path, dst: &Path) -> io::Result<()> {
    let permissions = std::fs::metadata(src)?.permissions();
    std::fs::set_permissions(dst, permissions)
}
