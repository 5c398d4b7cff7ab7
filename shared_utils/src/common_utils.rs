//! Common Utilities Module
//!
//! Small path helpers shared by the walker and the media passes.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;

/// Lowercase extension of `path`, or an empty string when there is none.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::get_extension_lowercase;
///
/// assert_eq!(get_extension_lowercase(Path::new("test.JPG")), "jpg");
/// assert_eq!(get_extension_lowercase(Path::new("noext")), "");
/// ```
pub fn get_extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Case-insensitive extension check. `extensions` are given without the dot.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::has_extension;
///
/// let extensions = &["jpg", "png"];
/// assert!(has_extension(Path::new("photo.JPG"), extensions));
/// assert!(!has_extension(Path::new("video.mp4"), extensions));
/// ```
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let ext = get_extension_lowercase(path);
    !ext.is_empty() && extensions.contains(&ext.as_str())
}

/// True when the file stem ends with `suffix`, ignoring case.
pub fn stem_ends_with(path: &Path, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase().ends_with(&suffix.to_lowercase()))
        .unwrap_or(false)
}

/// File name of `path` with its extension replaced by `extension`
/// (which carries its leading dot, e.g. `.webp`).
pub fn with_replaced_extension(path: &Path, extension: &str) -> Option<OsString> {
    let mut name = path.file_stem()?.to_os_string();
    name.push(extension);
    Some(name)
}

/// Create `dir` and all missing parents.
pub fn ensure_dir_exists(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}
