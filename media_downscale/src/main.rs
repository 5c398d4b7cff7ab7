use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser};
use media_downscale::error::{DownscaleError, EXIT_UNEXPECTED};
use media_downscale::{Config, ConversionOrchestrator, ExternalTools, Mode};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::{
    check_tools, install_interrupt_handler, print_summary_report, CancelFlag, ExternalTool,
    ToolRunner,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "media-downscale")]
#[command(
    version,
    disable_version_flag = true,
    about = "Downscale photo and video archives into a mirrored output tree",
    long_about = None
)]
struct Cli {
    /// Output root (defaults to the current directory)
    #[arg(short = 'o', long = "outdir", value_name = "DIR", default_value = ".")]
    outdir: PathBuf,

    /// Only process images
    #[arg(short = 'i', long, conflicts_with = "videos_only")]
    images_only: bool,

    /// Only process archived videos
    #[arg(short = 'm', long)]
    videos_only: bool,

    /// Show what would be done without writing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Image quality passed to ImageMagick
    #[arg(short = 'q', long, default_value_t = media_downscale::config::DEFAULT_QUALITY)]
    quality: u32,

    /// Bounding box as WIDTHxHEIGHT
    #[arg(short = 's', long, value_name = "WxH", default_value = "1024x768")]
    size: String,

    /// Remove all metadata except orientation
    #[arg(short = 'e', long)]
    remove_exif: bool,

    /// Output image extension
    #[arg(short = 't', long, value_name = ".EXT", default_value = ".jpg")]
    imgtype: String,

    /// Filename marker of videos to re-encode
    #[arg(long, default_value = media_downscale::config::DEFAULT_VIDEO_MARKER)]
    video_marker: String,

    /// Kill any external tool running longer than this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Debug-level logging
    #[arg(long)]
    verbose: bool,

    /// Source directories
    #[arg(value_name = "SOURCE")]
    sources: Vec<PathBuf>,
}

impl Cli {
    fn config(&self) -> Result<Config, DownscaleError> {
        Ok(Config::new(&self.outdir)
            .with_mode(Mode::from_flags(self.images_only, self.videos_only)?)
            .with_dry_run(self.dry_run)
            .with_quality(self.quality)
            .with_size(&self.size)?
            .with_strip_metadata(self.remove_exif)
            .with_image_extension(&self.imgtype)
            .with_video_marker(self.video_marker.clone())
            .with_timeout(self.timeout.map(Duration::from_secs)))
    }
}

fn required_tools(mode: Mode) -> Vec<ExternalTool> {
    let mut tools = vec![ExternalTool::Exiftool];
    if mode.images() {
        tools.push(ExternalTool::ImageMagick);
    }
    if mode.videos() {
        tools.push(ExternalTool::Ffmpeg);
    }
    tools
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    if cli.sources.is_empty() {
        eprintln!("{}", Cli::command().render_usage());
        return Err(DownscaleError::NoSources.into());
    }
    let config = cli.config()?;

    let check = check_tools(&required_tools(config.mode));
    let fatal: Vec<ExternalTool> = check
        .missing()
        .iter()
        .copied()
        .filter(|t| *t != ExternalTool::Ffmpeg)
        .collect();
    if !fatal.is_empty() {
        return Err(DownscaleError::MissingTools(fatal).into());
    }
    let video_pass = config.mode.videos() && !check.is_missing(ExternalTool::Ffmpeg);
    if config.mode.videos() && !video_pass {
        warn!("⚠️ ffmpeg not found, archived videos will be skipped");
    }

    let cancel = CancelFlag::new();
    if let Err(e) = install_interrupt_handler(&cancel) {
        warn!(error = %e, "Could not install Ctrl-C handler");
    }
    let runner = ToolRunner::new(config.tool_timeout, cancel.clone());
    let tools = ExternalTools::from_check(&check, runner)?;

    let orchestrator =
        ConversionOrchestrator::new(&config, &tools, cancel).with_video_pass(video_pass);
    let plans = orchestrator
        .plan(&cli.sources)
        .context("Planning source roots")?;

    if config.dry_run {
        info!("📝 Dry run: nothing will be written");
    }
    info!(
        "🔧 Bounding box {}, quality {}, output {}",
        config.target,
        config.quality,
        config.output_image_extension
    );

    let start = Instant::now();
    let summary = orchestrator.run(&plans);
    print_summary_report(&summary.batch, start.elapsed(), "Downscale");

    if summary.interrupted {
        warn!("⚠️ Interrupted, partial outputs were removed");
    }
    Ok(summary.exit_code())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<DownscaleError>())
        .map_or(EXIT_UNEXPECTED, DownscaleError::exit_code)
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    if let Err(e) = init_logging("media-downscale", LogConfig::default().with_level(level)) {
        eprintln!("⚠️ Logging disabled: {e:#}");
    }

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("❌ {:#}", err);
            exit_code(&err)
        }
    };
    std::process::exit(code);
}
