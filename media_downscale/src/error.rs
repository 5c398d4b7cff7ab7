use crate::path_mapper::PathError;
use shared_utils::{ErrorCategory, ExternalTool};
use std::path::PathBuf;
use thiserror::Error;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_UNEXPECTED: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_NO_SOURCES: i32 = 3;
pub const EXIT_OUTPUT_DIR: i32 = 6;
pub const EXIT_OVERWRITE_SOURCE: i32 = 7;
pub const EXIT_NO_EXIFTOOL: i32 = 8;
pub const EXIT_NO_IMAGEMAGICK: i32 = 9;
pub const EXIT_INVALID_SIZE: i32 = 10;
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Error, Debug)]
pub enum DownscaleError {
    #[error("Invalid size '{0}': expected WIDTHxHEIGHT with two positive integers")]
    InvalidSize(String),

    #[error("--images-only and --videos-only cannot be combined")]
    ConflictingModes,

    #[error("No source directories given")]
    NoSources,

    #[error("Required tools not found: {}", join_tools(.0))]
    MissingTools(Vec<ExternalTool>),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Cannot create output directory {}: {source}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted")]
    Interrupted,
}

fn join_tools(tools: &[ExternalTool]) -> String {
    tools
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DownscaleError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DownscaleError::InvalidSize(_) => EXIT_INVALID_SIZE,
            DownscaleError::ConflictingModes => EXIT_USAGE,
            DownscaleError::NoSources => EXIT_NO_SOURCES,
            DownscaleError::MissingTools(tools) => {
                if tools.contains(&ExternalTool::Exiftool) {
                    EXIT_NO_EXIFTOOL
                } else {
                    EXIT_NO_IMAGEMAGICK
                }
            }
            DownscaleError::Path(PathError::WouldOverwriteSource { .. }) => EXIT_OVERWRITE_SOURCE,
            DownscaleError::Path(_) => EXIT_UNEXPECTED,
            DownscaleError::CreateOutputDir { .. } => EXIT_OUTPUT_DIR,
            DownscaleError::Interrupted => EXIT_INTERRUPTED,
        }
    }

    /// Output directory failures only abort their own source root.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DownscaleError::CreateOutputDir { .. } => ErrorCategory::Recoverable,
            _ => ErrorCategory::Fatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, DownscaleError>;
