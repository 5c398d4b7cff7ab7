//! External tools detection
//!
//! One explicit startup check resolves every tool the run needs and reports
//! the missing ones as a typed list, instead of probing ad hoc mid-run.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExternalTool {
    /// Metadata reader/writer
    Exiftool,
    /// Image resizer/recompressor
    ImageMagick,
    /// Video transcoder
    Ffmpeg,
}

impl ExternalTool {
    /// Executable names tried in order.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            ExternalTool::Exiftool => &["exiftool"],
            // ImageMagick 7 ships `magick`; 6.x only has `convert`.
            ExternalTool::ImageMagick => &["magick", "convert"],
            ExternalTool::Ffmpeg => &["ffmpeg"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExternalTool::Exiftool => "exiftool",
            ExternalTool::ImageMagick => "ImageMagick",
            ExternalTool::Ffmpeg => "ffmpeg",
        }
    }
}

impl fmt::Display for ExternalTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of the startup dependency check.
#[derive(Debug, Clone, Default)]
pub struct ToolCheck {
    found: Vec<(ExternalTool, PathBuf)>,
    missing: Vec<ExternalTool>,
}

impl ToolCheck {
    pub fn path(&self, tool: ExternalTool) -> Option<&Path> {
        self.found
            .iter()
            .find(|(t, _)| *t == tool)
            .map(|(_, p)| p.as_path())
    }

    pub fn missing(&self) -> &[ExternalTool] {
        &self.missing
    }

    pub fn is_missing(&self, tool: ExternalTool) -> bool {
        self.missing.contains(&tool)
    }
}

/// Resolve `tools` on `PATH`.
pub fn check_tools(tools: &[ExternalTool]) -> ToolCheck {
    check_tools_with(tools, |name| which::which(name).ok())
}

/// Resolve `tools` with a custom lookup (used by tests).
pub fn check_tools_with<F>(tools: &[ExternalTool], lookup: F) -> ToolCheck
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let mut check = ToolCheck::default();
    for &tool in tools {
        match tool.candidates().iter().find_map(|name| lookup(name)) {
            Some(path) => {
                tracing::debug!(tool = %tool, path = %path.display(), "Found external tool");
                check.found.push((tool, path));
            }
            None => check.missing.push(tool),
        }
    }
    check
}
