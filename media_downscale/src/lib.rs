//! media-downscale
//!
//! Walks source directories and writes a smaller mirror of every photo and
//! archived video into an output tree. Images larger than a bounding box are
//! resized with ImageMagick, smaller ones are copied verbatim, and videos
//! tagged with the archive marker are re-encoded with ffmpeg. The output tree
//! doubles as the progress ledger: anything already present is skipped.

pub mod config;
pub mod conversion_api;
pub mod error;
pub mod media_tools;
pub mod path_mapper;
pub mod resize_policy;
pub mod size_probe;

pub use config::{parse_size, BoundingBox, Config, Mode};
pub use conversion_api::{ConversionOrchestrator, FileOutcome, RunSummary, SkipReason};
pub use error::{DownscaleError, Result};
pub use media_tools::{ExternalTools, ImageJob, MediaTools, MetadataPolicy};
pub use path_mapper::{FileTask, MediaKind, PathError, RootPlan};
pub use resize_policy::{decide, Decision};
pub use size_probe::{Dimensions, Orientation, ProbeError, SizeProbe};
