//! Shared Utilities for media-downscale
//!
//! This crate provides the infrastructure the downscaler is built on:
//! - Logging (tracing subscriber with stderr + rolling file output)
//! - External tools detection (exiftool, ImageMagick, ffmpeg)
//! - Structured subprocess runner with timeout and Ctrl-C cancellation
//! - Recursive file walking with pluggable match predicates
//! - ExifTool wrapper for reading, stripping and copying tags
//! - Staged file writes published by atomic rename
//! - Batch results and summary reporting

pub mod batch;
pub mod common_utils;
pub mod error_handler;
pub mod errors;
pub mod external_process;
pub mod file_copier;
pub mod logging;
pub mod metadata;
pub mod report;
pub mod tools;

pub use batch::{BatchResult, FileWalker};
pub use common_utils::{get_extension_lowercase, has_extension};
pub use error_handler::ErrorCategory;
pub use errors::{ToolError, ToolResult};
pub use external_process::{install_interrupt_handler, CancelFlag, ToolOutput, ToolRunner};
pub use file_copier::{copy_verbatim, publish, stage, sweep_staging};
pub use metadata::{copy_file_timestamps, copy_permissions, ExifTool, TagValue};
pub use report::{format_bytes, format_duration, print_summary_report};
pub use tools::{check_tools, ExternalTool, ToolCheck};
