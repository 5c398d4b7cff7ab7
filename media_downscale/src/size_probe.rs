//! Pixel dimensions and EXIF orientation, read through exiftool.

use shared_utils::{ExifTool, ToolError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// EXIF orientation (1-8). Values of 5 and above describe a capture rotated
/// by 90 degrees; 0 stands for "no tag".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation(pub u8);

impl Orientation {
    pub const NEUTRAL: Orientation = Orientation(0);

    pub fn is_rotated(&self) -> bool {
        self.0 >= 5
    }
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("unreadable dimensions {0:?}")]
    Malformed(String),
}

pub trait SizeProbe {
    fn probe(&self, path: &Path) -> Result<Dimensions, ProbeError>;

    /// Never fails: anything unreadable is [`Orientation::NEUTRAL`].
    fn orientation(&self, path: &Path) -> Orientation;
}

/// Exactly two positive integers, width first.
pub fn parse_dimensions(output: &str) -> Result<Dimensions, ProbeError> {
    let malformed = || ProbeError::Malformed(output.trim().to_string());
    let fields: Vec<&str> = output.split_whitespace().collect();
    let [w, h] = fields.as_slice() else {
        return Err(malformed());
    };
    let width: u32 = w.parse().map_err(|_| malformed())?;
    let height: u32 = h.parse().map_err(|_| malformed())?;
    if width == 0 || height == 0 {
        return Err(malformed());
    }
    Ok(Dimensions { width, height })
}

pub fn parse_orientation(output: &str) -> Orientation {
    match output.trim().parse::<u8>() {
        Ok(v @ 1..=8) => Orientation(v),
        _ => Orientation::NEUTRAL,
    }
}

impl SizeProbe for ExifTool {
    fn probe(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        let output = self.read_tags(path, &["ImageWidth", "ImageHeight"])?;
        parse_dimensions(&output)
    }

    fn orientation(&self, path: &Path) -> Orientation {
        match self.read_tags(path, &["Orientation"]) {
            Ok(output) => parse_orientation(&output),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No orientation");
                Orientation::NEUTRAL
            }
        }
    }
}
