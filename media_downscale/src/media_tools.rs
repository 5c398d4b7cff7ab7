//! External media tools
//!
//! [`MediaTools`] is the seam between the orchestrator and the binaries it
//! drives. [`ExternalTools`] is the real implementation: ImageMagick for
//! images, ffmpeg for videos and exiftool for everything metadata.

use crate::error::DownscaleError;
use crate::size_probe::{Dimensions, Orientation, ProbeError, SizeProbe};
use shared_utils::{ExifTool, ExternalTool, TagValue, ToolCheck, ToolError, ToolResult, ToolRunner};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Tags kept when metadata is stripped.
const KEPT_TAGS: &[&str] = &["Orientation"];

#[derive(Debug, Clone, Copy)]
pub struct ImageJob<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub width: u32,
    pub height: u32,
    pub quality: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataPolicy {
    /// Drop every tag except orientation.
    OrientationOnly,
    /// Copy every tag, then record the new pixel size.
    CopyAll { width: u32, height: u32 },
}

pub trait MediaTools: SizeProbe {
    fn transcode_image(&self, job: &ImageJob<'_>) -> ToolResult<()>;

    fn apply_metadata(&self, source: &Path, output: &Path, policy: &MetadataPolicy) -> ToolResult<()>;

    fn transcode_video(&self, source: &Path, output: &Path) -> ToolResult<()>;
}

#[derive(Debug, Clone)]
pub struct ExternalTools {
    exif: ExifTool,
    magick: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
    runner: ToolRunner,
}

impl ExternalTools {
    /// exiftool is mandatory; the converters are checked when first used.
    pub fn from_check(check: &ToolCheck, runner: ToolRunner) -> Result<Self, DownscaleError> {
        let exiftool = check
            .path(ExternalTool::Exiftool)
            .ok_or_else(|| DownscaleError::MissingTools(vec![ExternalTool::Exiftool]))?;
        Ok(Self {
            exif: ExifTool::new(exiftool, runner.clone()),
            magick: check.path(ExternalTool::ImageMagick).map(Path::to_path_buf),
            ffmpeg: check.path(ExternalTool::Ffmpeg).map(Path::to_path_buf),
            runner,
        })
    }

    pub fn has_video_encoder(&self) -> bool {
        self.ffmpeg.is_some()
    }
}

fn required<'a>(path: &'a Option<PathBuf>, tool: ExternalTool) -> ToolResult<&'a Path> {
    path.as_deref()
        .ok_or_else(|| ToolError::NotFound(tool.name().to_string()))
}

/// `magick`/`convert` arguments: fit inside `WxH`, 4:2:0 chroma, sRGB.
pub fn image_transcode_args(job: &ImageJob<'_>) -> Vec<OsString> {
    // First frame only; animated inputs would otherwise split into name-N files.
    let mut input = OsString::from(job.source);
    input.push("[0]");
    vec![
        input,
        "-resize".into(),
        format!("{}x{}", job.width, job.height).into(),
        "-sampling-factor".into(),
        "4:2:0".into(),
        "-colorspace".into(),
        "sRGB".into(),
        "-quality".into(),
        job.quality.to_string().into(),
        job.output.into(),
    ]
}

#[cfg(target_os = "macos")]
const H264_HW_ENCODER: &str = "h264_videotoolbox";
#[cfg(not(target_os = "macos"))]
const H264_HW_ENCODER: &str = "h264_nvenc";

/// Fixed archive profile: 30 fps CFR H.264, GOP 60, 4M/6M/8M ladder,
/// audio untouched, moov atom up front.
pub fn video_transcode_args(source: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-hwaccel",
        "auto",
        "-i",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(source.into());
    args.extend(
        [
            "-c:v",
            H264_HW_ENCODER,
            "-r",
            "30",
            "-fps_mode",
            "cfr",
            "-g",
            "60",
            "-b:v",
            "4M",
            "-maxrate",
            "6M",
            "-bufsize",
            "8M",
            "-c:a",
            "copy",
            "-movflags",
            "+faststart",
        ]
        .iter()
        .map(OsString::from),
    );
    args.push(output.into());
    args
}

impl SizeProbe for ExternalTools {
    fn probe(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        self.exif.probe(path)
    }

    fn orientation(&self, path: &Path) -> Orientation {
        self.exif.orientation(path)
    }
}

impl MediaTools for ExternalTools {
    fn transcode_image(&self, job: &ImageJob<'_>) -> ToolResult<()> {
        let magick = required(&self.magick, ExternalTool::ImageMagick)?;
        self.runner.run_checked(magick, &image_transcode_args(job))?;
        Ok(())
    }

    fn apply_metadata(&self, source: &Path, output: &Path, policy: &MetadataPolicy) -> ToolResult<()> {
        match *policy {
            MetadataPolicy::OrientationOnly => self.exif.keep_only(source, output, KEPT_TAGS),
            MetadataPolicy::CopyAll { width, height } => self.exif.copy_all(
                source,
                output,
                &[
                    TagValue::new("ExifImageWidth", width),
                    TagValue::new("ExifImageHeight", height),
                ],
            ),
        }
    }

    fn transcode_video(&self, source: &Path, output: &Path) -> ToolResult<()> {
        let ffmpeg = required(&self.ffmpeg, ExternalTool::Ffmpeg)?;
        self.runner.run_checked(ffmpeg, &video_transcode_args(source, output))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::tools::check_tools_with;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_image_args() {
        let job = ImageJob {
            source: Path::new("/in/a.png"),
            output: Path::new("/out/.stage-a.jpg"),
            width: 1024,
            height: 768,
            quality: 85,
        };
        assert_eq!(
            strings(&image_transcode_args(&job)),
            vec![
                "/in/a.png[0]",
                "-resize",
                "1024x768",
                "-sampling-factor",
                "4:2:0",
                "-colorspace",
                "sRGB",
                "-quality",
                "85",
                "/out/.stage-a.jpg"
            ]
        );
    }

    #[test]
    fn test_video_args() {
        let args = strings(&video_transcode_args(
            Path::new("/in/trip_archived.mov"),
            Path::new("/out/trip_archived.mp4"),
        ));
        assert!(args.windows(2).any(|w| w == ["-i", "/in/trip_archived.mov"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", H264_HW_ENCODER]));
        assert!(args.windows(2).any(|w| w == ["-r", "30"]));
        assert!(args.windows(2).any(|w| w == ["-g", "60"]));
        assert!(args.windows(2).any(|w| w == ["-b:v", "4M"]));
        assert!(args.windows(2).any(|w| w == ["-maxrate", "6M"]));
        assert!(args.windows(2).any(|w| w == ["-bufsize", "8M"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
        assert_eq!(args.last().map(String::as_str), Some("/out/trip_archived.mp4"));
    }

    #[test]
    fn test_from_check_requires_exiftool() {
        let check = check_tools_with(&[ExternalTool::Exiftool, ExternalTool::Ffmpeg], |_| None);
        let err = ExternalTools::from_check(&check, ToolRunner::default()).unwrap_err();
        assert_eq!(err.exit_code(), 8);
    }

    #[test]
    fn test_missing_converter_fails_per_file() {
        let check = check_tools_with(&[ExternalTool::Exiftool], |name| {
            Some(PathBuf::from(format!("/usr/bin/{name}")))
        });
        let tools = ExternalTools::from_check(&check, ToolRunner::default()).unwrap();
        assert!(!tools.has_video_encoder());
        let err = tools
            .transcode_video(Path::new("/a.mov"), Path::new("/b.mp4"))
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
