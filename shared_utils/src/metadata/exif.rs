//! ExifTool wrapper
//!
//! Reads numeric tag values, strips everything but a whitelist of tags, and
//! copies all tags between files. Writes use `-overwrite_original`, so no
//! `_original` backups are left next to the outputs.

use crate::errors::ToolResult;
use crate::external_process::ToolRunner;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A single `-TAG=VALUE` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    pub name: String,
    pub value: String,
}

impl TagValue {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
    runner: ToolRunner,
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>, runner: ToolRunner) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    /// Values of `tags` in numeric form, one per line, in the order exiftool
    /// reports them. Absent tags produce no line.
    pub fn read_tags(&self, path: &Path, tags: &[&str]) -> ToolResult<String> {
        let output = self.runner.run_checked(&self.program, &read_args(path, tags))?;
        Ok(output.stdout)
    }

    /// Remove all metadata from `dst`, then write back only `keep` copied
    /// from `src`.
    pub fn keep_only(&self, src: &Path, dst: &Path, keep: &[&str]) -> ToolResult<()> {
        self.runner
            .run_checked(&self.program, &keep_only_args(src, dst, keep))?;
        Ok(())
    }

    /// Copy every tag from `src` onto `dst`, then apply `overrides`.
    pub fn copy_all(&self, src: &Path, dst: &Path, overrides: &[TagValue]) -> ToolResult<()> {
        self.runner
            .run_checked(&self.program, &copy_all_args(src, dst))?;
        if !overrides.is_empty() {
            self.runner
                .run_checked(&self.program, &assign_args(dst, overrides))?;
        }
        Ok(())
    }
}

fn read_args(path: &Path, tags: &[&str]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-s3".into(), "-n".into()];
    args.extend(tags.iter().map(|t| OsString::from(format!("-{}", t))));
    args.push(path.into());
    args
}

fn write_prefix() -> Vec<OsString> {
    vec!["-overwrite_original".into(), "-q".into(), "-m".into()]
}

fn keep_only_args(src: &Path, dst: &Path, keep: &[&str]) -> Vec<OsString> {
    let mut args = write_prefix();
    args.push("-all=".into());
    args.push("-tagsfromfile".into());
    args.push(src.into());
    args.extend(keep.iter().map(|t| OsString::from(format!("-{}", t))));
    args.push(dst.into());
    args
}

fn copy_all_args(src: &Path, dst: &Path) -> Vec<OsString> {
    let mut args = write_prefix();
    args.push("-tagsfromfile".into());
    args.push(src.into());
    args.push("-all:all".into());
    args.push(dst.into());
    args
}

fn assign_args(dst: &Path, values: &[TagValue]) -> Vec<OsString> {
    let mut args = write_prefix();
    args.extend(
        values
            .iter()
            .map(|v| OsString::from(format!("-{}={}", v.name, v.value))),
    );
    args.push(dst.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_read_args() {
        let args = read_args(Path::new("/p/a b.jpg"), &["ImageWidth", "ImageHeight"]);
        assert_eq!(
            strings(&args),
            vec!["-s3", "-n", "-ImageWidth", "-ImageHeight", "/p/a b.jpg"]
        );
    }

    #[test]
    fn test_keep_only_args_strip_then_restore() {
        let args = keep_only_args(Path::new("/src.jpg"), Path::new("/dst.jpg"), &["Orientation"]);
        assert_eq!(
            strings(&args),
            vec![
                "-overwrite_original",
                "-q",
                "-m",
                "-all=",
                "-tagsfromfile",
                "/src.jpg",
                "-Orientation",
                "/dst.jpg"
            ]
        );
    }

    #[test]
    fn test_copy_all_args() {
        let args = copy_all_args(Path::new("/src.png"), Path::new("/dst.webp"));
        let args = strings(&args);
        assert_eq!(args.last().map(String::as_str), Some("/dst.webp"));
        assert!(args.windows(2).any(|w| w == ["-tagsfromfile", "/src.png"]));
        assert!(args.contains(&"-all:all".to_string()));
    }

    #[test]
    fn test_assign_args() {
        let args = assign_args(
            Path::new("/dst.jpg"),
            &[
                TagValue::new("ExifImageWidth", 1024),
                TagValue::new("ExifImageHeight", 683),
            ],
        );
        let args = strings(&args);
        assert!(args.contains(&"-ExifImageWidth=1024".to_string()));
        assert!(args.contains(&"-ExifImageHeight=683".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/dst.jpg"));
    }

    #[test]
    fn test_read_tags_missing_file_is_error() {
        let Ok(program) = which::which("exiftool") else {
            eprintln!("ExifTool not available, skipping test");
            return;
        };
        let exif = ExifTool::new(program, ToolRunner::default());
        let temp = tempfile::TempDir::new().unwrap();
        assert!(exif
            .read_tags(&temp.path().join("missing.jpg"), &["ImageWidth"])
            .is_err());
    }
}
