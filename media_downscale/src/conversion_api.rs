//! Conversion API Module
//!
//! Drives one run: every source root is planned and safety-checked first,
//! then walked root by root with the image pass before the video pass. Each
//! file ends in exactly one [`FileOutcome`], folded into a [`BatchResult`].

use crate::config::{Config, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::error::{DownscaleError, EXIT_INTERRUPTED, EXIT_OUTPUT_DIR, EXIT_SUCCESS};
use crate::media_tools::{ImageJob, MediaTools, MetadataPolicy};
use crate::path_mapper::{map_file, plan_root, resolve_lenient, FileTask, MediaKind, PathError, RootPlan};
use crate::resize_policy::decide;
use shared_utils::common_utils::{has_extension, stem_ends_with};
use shared_utils::error_handler::{report_error, ErrorCategory};
use shared_utils::{
    copy_file_timestamps, copy_permissions, copy_verbatim, publish, stage, sweep_staging, BatchResult,
    CancelFlag, FileWalker,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    DestinationExists(PathBuf),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Converted { input_bytes: u64, output_bytes: u64 },
    Copied { bytes: u64 },
    /// Dry run: what would have happened.
    Planned(String),
    Skipped(SkipReason),
    Failed(String),
    Interrupted,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub batch: BatchResult,
    /// Roots abandoned because their output directory could not be created.
    pub failed_roots: Vec<DownscaleError>,
    pub interrupted: bool,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            EXIT_INTERRUPTED
        } else if !self.failed_roots.is_empty() {
            EXIT_OUTPUT_DIR
        } else {
            EXIT_SUCCESS
        }
    }
}

pub struct ConversionOrchestrator<'a, T: MediaTools> {
    config: &'a Config,
    tools: &'a T,
    cancel: CancelFlag,
    video_pass: bool,
}

impl<'a, T: MediaTools> ConversionOrchestrator<'a, T> {
    pub fn new(config: &'a Config, tools: &'a T, cancel: CancelFlag) -> Self {
        Self {
            config,
            tools,
            cancel,
            video_pass: true,
        }
    }

    /// Disable the video pass (no ffmpeg on this machine).
    pub fn with_video_pass(mut self, enabled: bool) -> Self {
        self.video_pass = enabled;
        self
    }

    pub fn plan(&self, roots: &[PathBuf]) -> Result<Vec<RootPlan>, DownscaleError> {
        let cwd = std::env::current_dir().map_err(|source| PathError::Resolve {
            path: PathBuf::from("."),
            source,
        })?;
        self.plan_in(roots, &cwd)
    }

    /// Plan every root against `cwd`. Any overwrite violation fails the
    /// whole plan, so nothing is written when a later root is unsafe.
    pub fn plan_in(&self, roots: &[PathBuf], cwd: &Path) -> Result<Vec<RootPlan>, DownscaleError> {
        let cwd = cwd.canonicalize().map_err(|source| PathError::Resolve {
            path: cwd.to_path_buf(),
            source,
        })?;
        let output_root =
            resolve_lenient(&self.config.output_root, &cwd).map_err(|source| PathError::Resolve {
                path: self.config.output_root.clone(),
                source,
            })?;

        let mut plans = Vec::with_capacity(roots.len());
        for root in roots {
            match plan_root(root, &output_root, &cwd) {
                Ok(plan) => {
                    debug!(
                        source = %plan.source_root.display(),
                        destination = %plan.destination_root.display(),
                        "Planned source root"
                    );
                    plans.push(plan);
                }
                Err(e) if e.is_fatal() => {
                    report_error(ErrorCategory::Fatal, "Unsafe output location", &e);
                    return Err(e.into());
                }
                Err(e) => report_error(ErrorCategory::Recoverable, "Skipping source root", &e),
            }
        }
        Ok(plans)
    }

    pub fn run(&self, plans: &[RootPlan]) -> RunSummary {
        let mut summary = RunSummary::default();

        for plan in plans {
            if self.cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.run_root(plan, &mut summary) {
                report_error(e.category(), "Abandoning source root", &e);
                summary.failed_roots.push(e);
            }
        }

        summary.interrupted |= self.cancel.is_cancelled();
        summary
    }

    fn run_root(&self, plan: &RootPlan, summary: &mut RunSummary) -> Result<(), DownscaleError> {
        info!(
            "📂 {} → {}",
            plan.source_root.display(),
            plan.destination_root.display()
        );

        if !self.config.dry_run {
            fs::create_dir_all(&plan.destination_root).map_err(|source| {
                DownscaleError::CreateOutputDir {
                    path: plan.destination_root.clone(),
                    source,
                }
            })?;
            let stale = sweep_staging(&plan.destination_root);
            if stale > 0 {
                info!("🧹 Removed {} unfinished output(s) from an earlier run", stale);
            }
        }

        let mut walker = FileWalker::new(&plan.source_root);
        if let Some(prune) = &plan.prune {
            walker = walker.prune(prune);
        }

        if self.config.mode.images() {
            for path in walker.files(|p| has_extension(p, IMAGE_EXTENSIONS)) {
                if self.cancel.is_cancelled() {
                    return Ok(());
                }
                let outcome = self.process_image(plan, &path);
                self.record(summary, &path, outcome);
            }
        }

        if self.config.mode.videos() && self.video_pass {
            let marker = self.config.video_marker.as_str();
            let is_archived_video =
                |p: &Path| has_extension(p, VIDEO_EXTENSIONS) && stem_ends_with(p, marker);
            for path in walker.files(is_archived_video) {
                if self.cancel.is_cancelled() {
                    return Ok(());
                }
                let outcome = self.process_video(plan, &path);
                self.record(summary, &path, outcome);
            }
        }

        Ok(())
    }

    fn task(&self, plan: &RootPlan, path: &Path, kind: MediaKind) -> Option<FileTask> {
        let dir = map_file(path, &plan.source_root, &plan.destination_root);
        FileTask::new(path, kind, dir, &self.config.output_image_extension)
    }

    pub fn process_image(&self, plan: &RootPlan, path: &Path) -> FileOutcome {
        let Some(task) = self.task(plan, path, MediaKind::Image) else {
            return FileOutcome::Skipped(SkipReason::Unreadable("no file name".into()));
        };

        // A verbatim copy keeps the original name, so either name marks the
        // file as done.
        for existing in [task.destination_path.clone(), task.copy_path()] {
            if existing.exists() {
                return FileOutcome::Skipped(SkipReason::DestinationExists(existing));
            }
        }

        let dims = match self.tools.probe(path) {
            Ok(dims) => dims,
            Err(e) => return FileOutcome::Skipped(SkipReason::Unreadable(e.to_string())),
        };
        let orientation = self.tools.orientation(path);
        let decision = decide(dims, orientation, self.config.target);
        debug!(
            path = %path.display(),
            width = dims.width,
            height = dims.height,
            orientation = orientation.0,
            ?decision,
            "Resize decision"
        );

        if !decision.needs_resize {
            let copy_path = task.copy_path();
            if self.config.dry_run {
                return FileOutcome::Planned(format!("copy → {}", copy_path.display()));
            }
            return match ensure_parent(&task).and_then(|_| copy_verbatim(path, &copy_path)) {
                Ok(bytes) => FileOutcome::Copied { bytes },
                Err(e) => io_outcome(e, copy_path),
            };
        }

        if self.config.dry_run {
            return FileOutcome::Planned(format!(
                "resize to {} → {}",
                decision.target(),
                task.destination_path.display()
            ));
        }
        self.convert_image(&task, decision.target_width, decision.target_height)
    }

    fn convert_image(&self, task: &FileTask, width: u32, height: u32) -> FileOutcome {
        let source = task.source_path.as_path();
        let staged = match ensure_parent(task).and_then(|_| stage(&task.destination_path)) {
            Ok(staged) => staged,
            Err(e) => return FileOutcome::Failed(e.to_string()),
        };

        let job = ImageJob {
            source,
            output: &staged,
            width,
            height,
            quality: self.config.quality,
        };
        if let Err(e) = self.tools.transcode_image(&job) {
            if e.is_cancelled() {
                return FileOutcome::Interrupted;
            }
            return FileOutcome::Failed(e.to_string());
        }

        let policy = if self.config.strip_metadata {
            MetadataPolicy::OrientationOnly
        } else {
            let written = self.tools.probe(&staged).ok();
            MetadataPolicy::CopyAll {
                width: written.map_or(width, |d| d.width),
                height: written.map_or(height, |d| d.height),
            }
        };
        if let Err(e) = self.tools.apply_metadata(source, &staged, &policy) {
            if e.is_cancelled() {
                return FileOutcome::Interrupted;
            }
            report_error(ErrorCategory::Optional, "Metadata step failed, keeping image", &e);
        }

        self.finish(source, staged, &task.destination_path)
    }

    pub fn process_video(&self, plan: &RootPlan, path: &Path) -> FileOutcome {
        let Some(task) = self.task(plan, path, MediaKind::Video) else {
            return FileOutcome::Skipped(SkipReason::Unreadable("no file name".into()));
        };
        if task.destination_path.exists() {
            return FileOutcome::Skipped(SkipReason::DestinationExists(task.destination_path));
        }
        if self.config.dry_run {
            return FileOutcome::Planned(format!("transcode → {}", task.destination_path.display()));
        }

        let staged = match ensure_parent(&task).and_then(|_| stage(&task.destination_path)) {
            Ok(staged) => staged,
            Err(e) => return FileOutcome::Failed(e.to_string()),
        };
        if let Err(e) = self.tools.transcode_video(path, &staged) {
            if e.is_cancelled() {
                return FileOutcome::Interrupted;
            }
            return FileOutcome::Failed(e.to_string());
        }
        self.finish(path, staged, &task.destination_path)
    }

    /// Carry over permissions and timestamps, then move the staged output
    /// into place. An empty output is dropped so the next run retries it.
    fn finish(&self, source: &Path, staged: tempfile::TempPath, destination: &Path) -> FileOutcome {
        let output_bytes = fs::metadata(&staged).map(|m| m.len()).unwrap_or(0);
        if output_bytes == 0 {
            return FileOutcome::Failed("converter exited cleanly but wrote no output".into());
        }
        if let Err(e) = copy_permissions(source, &staged) {
            debug!(error = %e, "Could not carry over permissions");
        }
        if let Err(e) = copy_file_timestamps(source, &staged) {
            debug!(error = %e, "Could not carry over timestamps");
        }
        let input_bytes = fs::metadata(source).map(|m| m.len()).unwrap_or(0);
        match publish(staged, destination) {
            Ok(()) => FileOutcome::Converted {
                input_bytes,
                output_bytes,
            },
            Err(e) => io_outcome(e, destination.to_path_buf()),
        }
    }

    fn record(&self, summary: &mut RunSummary, path: &Path, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Converted {
                input_bytes,
                output_bytes,
            } => {
                info!("✅ {} ({} → {} bytes)", path.display(), input_bytes, output_bytes);
                summary.batch.success(input_bytes, output_bytes);
            }
            FileOutcome::Copied { bytes } => {
                info!("📋 {} copied as-is", path.display());
                summary.batch.success(bytes, bytes);
            }
            FileOutcome::Planned(action) => {
                info!("📝 [dry run] {}: {}", path.display(), action);
                summary.batch.plan();
            }
            FileOutcome::Skipped(SkipReason::DestinationExists(existing)) => {
                debug!("⏭️ {} exists", existing.display());
                summary.batch.skip();
            }
            FileOutcome::Skipped(SkipReason::Unreadable(reason)) => {
                warn!("⚠️ Skipping {}: {}", path.display(), reason);
                summary.batch.skip();
            }
            FileOutcome::Failed(message) => {
                warn!("❌ {}: {}", path.display(), message);
                summary.batch.fail(path.to_path_buf(), message);
            }
            FileOutcome::Interrupted => {
                summary.interrupted = true;
            }
        }
    }
}

fn ensure_parent(task: &FileTask) -> io::Result<()> {
    fs::create_dir_all(&task.destination_dir)
}

/// A destination that appeared mid-run counts as already done.
fn io_outcome(e: io::Error, destination: PathBuf) -> FileOutcome {
    if e.kind() == io::ErrorKind::AlreadyExists {
        FileOutcome::Skipped(SkipReason::DestinationExists(destination))
    } else {
        FileOutcome::Failed(e.to_string())
    }
}
