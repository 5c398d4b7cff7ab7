//! Run configuration
//!
//! Built once from the command line, then shared read-only by every pass.

use crate::error::{DownscaleError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_QUALITY: u32 = 85;
pub const DEFAULT_SIZE: BoundingBox = BoundingBox {
    width: 1024,
    height: 768,
};
pub const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";
pub const DEFAULT_VIDEO_MARKER: &str = "_archived";
pub const VIDEO_EXTENSION: &str = ".mp4";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "jpe", "jfif", "png", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "mkv", "avi", "3gp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Both,
    ImagesOnly,
    VideosOnly,
}

impl Mode {
    pub fn from_flags(images_only: bool, videos_only: bool) -> Result<Self> {
        match (images_only, videos_only) {
            (true, true) => Err(DownscaleError::ConflictingModes),
            (true, false) => Ok(Mode::ImagesOnly),
            (false, true) => Ok(Mode::VideosOnly),
            (false, false) => Ok(Mode::Both),
        }
    }

    pub fn images(&self) -> bool {
        !matches!(self, Mode::VideosOnly)
    }

    pub fn videos(&self) -> bool {
        !matches!(self, Mode::ImagesOnly)
    }
}

/// Box an image must fit in, given for landscape orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn transposed(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for BoundingBox {
    type Err = DownscaleError;

    fn from_str(s: &str) -> Result<Self> {
        parse_size(s)
    }
}

/// Parse `WIDTHxHEIGHT` (either `x` or `X`) into two positive integers.
///
/// # Examples
/// ```
/// use media_downscale::parse_size;
///
/// let size = parse_size("1920x1080").unwrap();
/// assert_eq!((size.width, size.height), (1920, 1080));
/// assert!(parse_size("abc").is_err());
/// ```
pub fn parse_size(s: &str) -> Result<BoundingBox> {
    let invalid = || DownscaleError::InvalidSize(s.to_string());
    let mut parts = s.trim().split(['x', 'X']);

    let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok(BoundingBox { width, height })
}

/// Extension with exactly one leading dot; blank input falls back to `.jpg`.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        DEFAULT_IMAGE_EXTENSION.to_string()
    } else {
        format!(".{}", ext)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub output_root: PathBuf,
    pub mode: Mode,
    pub dry_run: bool,
    /// Handed to ImageMagick as-is.
    pub quality: u32,
    pub target: BoundingBox,
    pub strip_metadata: bool,
    pub output_image_extension: String,
    pub video_marker: String,
    pub tool_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            mode: Mode::Both,
            dry_run: false,
            quality: DEFAULT_QUALITY,
            target: DEFAULT_SIZE,
            strip_metadata: false,
            output_image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
            video_marker: DEFAULT_VIDEO_MARKER.to_string(),
            tool_timeout: None,
        }
    }
}

impl Config {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_target(mut self, target: BoundingBox) -> Self {
        self.target = target;
        self
    }

    pub fn with_size(self, size: &str) -> Result<Self> {
        Ok(self.with_target(parse_size(size)?))
    }

    pub fn with_strip_metadata(mut self, strip: bool) -> Self {
        self.strip_metadata = strip;
        self
    }

    pub fn with_image_extension(mut self, ext: &str) -> Self {
        self.output_image_extension = normalize_extension(ext);
        self
    }

    pub fn with_video_marker(mut self, marker: impl Into<String>) -> Self {
        self.video_marker = marker.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_size_accepts_both_separators() {
        assert_eq!(parse_size("1024x768").unwrap(), DEFAULT_SIZE);
        assert_eq!(
            parse_size("640X480").unwrap(),
            BoundingBox {
                width: 640,
                height: 480
            }
        );
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        for bad in ["abc", "", "1024", "1024x", "x768", "0x768", "1024x0", "-5x10", "1x2x3", "12.5x10"] {
            let err = parse_size(bad).unwrap_err();
            assert!(matches!(err, DownscaleError::InvalidSize(_)), "{bad}");
            assert_eq!(err.exit_code(), 10);
        }
    }

    #[test]
    fn test_bounding_box_display_and_from_str() {
        let b: BoundingBox = "1920x1080".parse().unwrap();
        assert_eq!(b.to_string(), "1920x1080");
        assert_eq!(b.transposed().to_string(), "1080x1920");
    }

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(Mode::from_flags(false, false).unwrap(), Mode::Both);
        assert_eq!(Mode::from_flags(true, false).unwrap(), Mode::ImagesOnly);
        assert_eq!(Mode::from_flags(false, true).unwrap(), Mode::VideosOnly);
        assert!(matches!(
            Mode::from_flags(true, true),
            Err(DownscaleError::ConflictingModes)
        ));

        assert!(Mode::Both.images() && Mode::Both.videos());
        assert!(Mode::ImagesOnly.images() && !Mode::ImagesOnly.videos());
        assert!(!Mode::VideosOnly.images() && Mode::VideosOnly.videos());
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".webp"), ".webp");
        assert_eq!(normalize_extension("webp"), ".webp");
        assert_eq!(normalize_extension("..png"), ".png");
        assert_eq!(normalize_extension("  "), ".jpg");
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.output_root, PathBuf::from("."));
        assert_eq!(config.quality, 85);
        assert_eq!(config.target, DEFAULT_SIZE);
        assert_eq!(config.output_image_extension, ".jpg");
        assert_eq!(config.video_marker, "_archived");
        assert!(!config.dry_run && !config.strip_metadata);
        assert!(config.tool_timeout.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new("/out")
            .with_mode(Mode::ImagesOnly)
            .with_size("800x600")
            .unwrap()
            .with_image_extension("png")
            .with_quality(70)
            .with_timeout(Some(Duration::from_secs(30)));
        assert_eq!(config.output_root, PathBuf::from("/out"));
        assert_eq!(config.target.to_string(), "800x600");
        assert_eq!(config.output_image_extension, ".png");
        assert_eq!(config.quality, 70);
        assert_eq!(config.tool_timeout, Some(Duration::from_secs(30)));
    }

    proptest! {
        #[test]
        fn parse_size_round_trips_positive_pairs(w in 1u32..100_000, h in 1u32..100_000, upper in any::<bool>()) {
            let sep = if upper { 'X' } else { 'x' };
            let parsed = parse_size(&format!("{w}{sep}{h}")).unwrap();
            prop_assert_eq!((parsed.width, parsed.height), (w, h));
        }

        #[test]
        fn parse_size_never_panics(s in "\\PC*") {
            let _ = parse_size(&s);
        }
    }
}
