//! Banner compositor CLI
//!
//! Command-line front-end over [`BannerPipeline`]: resolves inputs, builds the
//! pipeline once and creates one banner per product image.

use super::{backend_factory::CliBackendFactory, config::CliConfigBuilder};
use crate::{
    config::{BannerConfig, OutputFormat},
    geometry::ProductAnchor,
    pipeline::{BannerCopy, BannerOutput, BannerPipeline},
    services::{
        ConsoleProgressReporter, ImageIOService, ProcessingStage, ProgressReporter, ProgressUpdate,
    },
    tracing_config::{events, init_cli_tracing, spans},
    types::{BannerMetadata, CanvasSize, RgbColor, StageTimings},
    background::GradientPreset,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Default directory for timestamped banners
const DEFAULT_OUTPUT_DIR: &str = "output";

/// Marketing banner compositor
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "banner-compositor")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Product images with transparent backgrounds, or directories of them
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Output file (single input) or directory [default: output/]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,

    /// Process directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Pattern for directory inputs (e.g., "*.png")
    #[arg(long)]
    pub pattern: Option<String>,

    /// JSON file with a banner configuration; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Canvas size as WIDTHxHEIGHT
    #[arg(long, value_name = "WxH", conflicts_with = "preset")]
    pub canvas: Option<CanvasSize>,

    /// Canvas preset
    #[arg(long, value_enum)]
    pub preset: Option<CliCanvasPreset>,

    /// Share of the canvas width the product may occupy (1-100)
    #[arg(long, value_name = "PERCENT")]
    pub width_percent: Option<f32>,

    /// Product position: center, left[:MARGIN], right[:MARGIN], bottom:Y
    #[arg(long)]
    pub anchor: Option<ProductAnchor>,

    /// Pixels preserved around the product in the inpainting mask
    #[arg(long, value_name = "PIXELS")]
    pub padding: Option<u32>,

    /// Background source
    #[arg(short, long, value_enum)]
    pub mode: Option<CliBackgroundMode>,

    /// Gradient preset (modern, sunset, ocean, dark-premium, sky)
    #[arg(long, value_name = "PRESET")]
    pub gradient: Option<GradientPreset>,

    /// Gradient top color as #rrggbb
    #[arg(long = "top", value_name = "HEX")]
    pub gradient_top: Option<RgbColor>,

    /// Gradient bottom color as #rrggbb
    #[arg(long = "bottom", value_name = "HEX")]
    pub gradient_bottom: Option<RgbColor>,

    /// Backdrop image for image mode
    #[arg(long, value_name = "FILE")]
    pub background_image: Option<PathBuf>,

    /// Stable Diffusion WebUI base URL for generate and inpaint modes
    #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:7860")]
    pub sd_url: String,

    /// Sampling steps for image generation
    #[arg(long)]
    pub sd_steps: Option<u32>,

    /// Background generation prompt
    #[arg(long)]
    pub prompt: Option<String>,

    /// Title text; skips copy generation
    #[arg(long)]
    pub title: Option<String>,

    /// Subtitle text drawn below the title
    #[arg(long)]
    pub subtitle: Option<String>,

    /// Call-to-action button label
    #[arg(long)]
    pub cta: Option<String>,

    /// Product name for copy generation [default: input file name]
    #[arg(long)]
    pub product_name: Option<String>,

    /// Style hint for copy generation
    #[arg(long)]
    pub copy_prompt: Option<String>,

    /// API key for the chat-completion copywriter
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub copy_api_key: Option<String>,

    /// Chat-completion model for copy generation
    #[arg(long)]
    pub copy_model: Option<String>,

    /// OpenAI-compatible base URL for copy generation [default: Groq]
    #[arg(long, value_name = "URL")]
    pub copy_url: Option<String>,

    /// TrueType font file [default: first system font found]
    #[arg(long, value_name = "FILE")]
    pub font: Option<PathBuf>,

    /// Title font size in pixels; subtitle and button scale with it
    #[arg(long, value_name = "PX")]
    pub font_size: Option<f32>,

    /// Draw a translucent box behind the title
    #[arg(long)]
    pub title_backdrop: bool,

    /// Output format [default: from the output extension, else png]
    #[arg(short, long, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// JPEG quality (0-100)
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// Also write the inpainting mask next to each banner
    #[arg(long)]
    pub save_mask: bool,

    /// Log progress lines instead of drawing a spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => OutputFormat::Png,
            CliOutputFormat::Jpeg => OutputFormat::Jpeg,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliBackgroundMode {
    Gradient,
    Generate,
    Inpaint,
    Image,
}

impl From<CliBackgroundMode> for crate::config::BackgroundMode {
    fn from(mode: CliBackgroundMode) -> Self {
        match mode {
            CliBackgroundMode::Gradient => Self::Gradient,
            CliBackgroundMode::Generate => Self::Generate,
            CliBackgroundMode::Inpaint => Self::Inpaint,
            CliBackgroundMode::Image => Self::Image,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliCanvasPreset {
    /// 1200x630
    Social,
    /// 800x600
    Classic,
    /// 1200x640
    Wide,
}

impl From<CliCanvasPreset> for CanvasSize {
    fn from(preset: CliCanvasPreset) -> Self {
        match preset {
            CliCanvasPreset::Social => CanvasSize::SOCIAL,
            CliCanvasPreset::Classic => CanvasSize::CLASSIC,
            CliCanvasPreset::Wide => CanvasSize::WIDE,
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = init_cli_tracing(cli.verbose).context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    events::progress("Starting banner compositor", "🎨");
    info!("Input(s): {}", cli.input.join(", "));
    info!(
        "Canvas: {}, mode: {}, product width: {:.0}%",
        config.canvas,
        config.mode,
        config.width_fraction * 100.0
    );

    let files = collect_input_files(&cli)?;
    if files.is_empty() {
        warn!("No supported image files found in the provided inputs");
        return Ok(());
    }

    let session = spans::session(&session_id, &config.mode.to_string(), &config.canvas.to_string());
    let start_time = Instant::now();
    let summary = process_inputs(&cli, config, files).instrument(session).await?;

    info!(
        "Created {} banner(s) in {:.2}s",
        summary.processed,
        start_time.elapsed().as_secs_f64()
    );
    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} banner(s) failed",
            summary.failed,
            summary.processed + summary.failed
        );
    }
    Ok(())
}

/// Where banners are written
#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputTarget {
    /// Exact file for a single input
    File(PathBuf),
    /// Directory receiving timestamped names
    Directory(PathBuf),
}

impl OutputTarget {
    fn resolve(output: Option<&str>, file_count: usize) -> Result<Self> {
        let Some(output) = output else {
            return Ok(Self::Directory(PathBuf::from(DEFAULT_OUTPUT_DIR)));
        };
        let path = PathBuf::from(output);

        if file_count == 1 && !path.is_dir() && path.extension().is_some() {
            return Ok(Self::File(path));
        }
        if path.is_file() {
            anyhow::bail!(
                "Output path exists and is a file, not a directory: {}",
                path.display()
            );
        }
        Ok(Self::Directory(path))
    }

    fn format(&self, config: &BannerConfig, explicit: Option<CliOutputFormat>) -> OutputFormat {
        if let Some(format) = explicit {
            return format.into();
        }
        match self {
            Self::File(path) => OutputFormat::from_path(path).unwrap_or(config.output_format),
            Self::Directory(_) => config.output_format,
        }
    }

    fn path_for(&self, format: OutputFormat) -> Result<PathBuf> {
        match self {
            Self::File(path) => Ok(path.clone()),
            Self::Directory(dir) => {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create output directory: {}", dir.display())
                })?;
                Ok(ImageIOService::timestamped_output_path(
                    dir,
                    format,
                    chrono::Local::now(),
                ))
            },
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct BatchSummary {
    processed: usize,
    failed: usize,
}

/// One banner's worth of work, moved onto a blocking worker
struct BannerJob {
    input: PathBuf,
    output: PathBuf,
    format: OutputFormat,
    copy: BannerCopy,
    save_mask: bool,
}

impl BannerJob {
    fn run(&self, pipeline: &BannerPipeline) -> Result<BannerMetadata> {
        let foreground = ImageIOService::load_foreground(&self.input)
            .with_context(|| format!("Failed to load product image {}", self.input.display()))?;

        let banner = if self.save_mask {
            let BannerOutput { mut banner, mask } = pipeline.create_with_mask(&foreground, &self.copy)?;
            // Mask first: a failed job must not leave a banner without its mask
            let mask_path = mask_path_for(&self.output);
            mask.save_png(&mask_path)
                .with_context(|| format!("Failed to save mask {}", mask_path.display()))?;
            debug!(path = %mask_path.display(), "Mask written");
            if let Err(e) = banner.save(&self.output, self.format, pipeline.config().jpeg_quality) {
                if let Err(remove_err) = std::fs::remove_file(&mask_path) {
                    warn!(path = %mask_path.display(), error = %remove_err, "Failed to remove orphaned mask");
                }
                return Err(e.into());
            }
            banner
        } else {
            pipeline.create_to_path(&foreground, &self.copy, &self.output, self.format)?
        };

        Ok(banner.metadata)
    }
}

async fn process_inputs(cli: &Cli, config: BannerConfig, files: Vec<PathBuf>) -> Result<BatchSummary> {
    let file_count = files.len();
    let target = OutputTarget::resolve(cli.output.as_deref(), file_count)?;
    let format = target.format(&config, cli.format);

    let progress_bar = if cli.no_progress {
        ProgressBar::hidden()
    } else {
        create_progress_bar(file_count)?
    };
    let reporter: Box<dyn ProgressReporter> = if cli.no_progress {
        Box::new(ConsoleProgressReporter::new(cli.verbose > 0))
    } else {
        Box::new(SpinnerProgressReporter::new(progress_bar.clone(), cli.verbose > 0))
    };

    // HTTP clients block internally, so they are created and dropped off the runtime
    let pipeline = {
        let cli = cli.clone();
        tokio::task::spawn_blocking(move || CliBackendFactory::pipeline(&cli, config, reporter))
            .await
            .context("Pipeline setup task failed")??
    };
    let pipeline = Arc::new(pipeline);
    info!(
        "Background: {}, found {} product image(s)",
        pipeline.background_name(),
        file_count
    );

    let mut summary = BatchSummary::default();
    let batch_span = spans::batch_processing(file_count);
    let batch_start = Instant::now();

    for input in files {
        progress_bar.set_message(format!("Processing {}", input.display()));

        let output = match target.path_for(format) {
            Ok(output) => output,
            Err(e) => {
                events::error_with_context(e.as_ref(), "output path");
                summary.failed += 1;
                progress_bar.inc(1);
                continue;
            },
        };

        let job = BannerJob {
            copy: copy_for(cli, &input),
            input: input.clone(),
            output,
            format,
            save_mask: cli.save_mask,
        };
        let worker_pipeline = Arc::clone(&pipeline);
        let file_span = spans::file_processing(&input, format.extension());
        let file_start = Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            file_span.in_scope(|| job.run(&worker_pipeline).map(|metadata| (job.output, metadata)))
        })
        .instrument(batch_span.clone())
        .await;

        match result {
            Ok(Ok((output, metadata))) => {
                summary.processed += 1;
                if metadata.used_fallback() {
                    events::warning_with_recommendation(
                        &format!("{} used the gradient fallback", input.display()),
                        "check that the image generation server is reachable",
                    );
                }
                progress_bar.println(format!(
                    "✅ {} → {} ({})",
                    input.display(),
                    output.display(),
                    metadata.background_source
                ));
                events::performance_metric("banner", file_start.elapsed().as_millis() as u64);
            },
            Ok(Err(e)) => {
                summary.failed += 1;
                events::error_with_context(e.as_ref(), &format!("creating banner for {}", input.display()));
            },
            Err(join_error) => {
                summary.failed += 1;
                events::error_with_context(&join_error, &format!("banner worker for {}", input.display()));
            },
        }
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message(format!(
        "Completed! Created: {}, Failed: {}",
        summary.processed, summary.failed
    ));

    tokio::task::spawn_blocking(move || drop(pipeline))
        .await
        .context("Pipeline shutdown task failed")?;

    if file_count > 1 {
        let total = batch_start.elapsed();
        info!("📊 Batch processing summary:");
        info!("  ├─ Banners created: {}", summary.processed);
        info!("  ├─ Failed: {}", summary.failed);
        info!("  ├─ Total time: {:.2}s", total.as_secs_f64());
        info!(
            "  └─ Average per banner: {:.2}s",
            if summary.processed > 0 {
                total.as_secs_f64() / summary.processed as f64
            } else {
                0.0
            }
        );
    }

    Ok(summary)
}

fn create_progress_bar(file_count: usize) -> Result<ProgressBar> {
    let bar = if file_count > 1 {
        let bar = ProgressBar::new(file_count as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        bar
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid spinner template")?,
        );
        bar
    };
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

/// Forwards pipeline stages to the spinner message
struct SpinnerProgressReporter {
    bar: ProgressBar,
    verbose: bool,
}

impl SpinnerProgressReporter {
    fn new(bar: ProgressBar, verbose: bool) -> Self {
        Self { bar, verbose }
    }
}

impl ProgressReporter for SpinnerProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        self.bar
            .set_message(format!("[{}%] {}", update.progress, update.description));
    }

    fn report_completion(&self, timings: &StageTimings) {
        if self.verbose {
            self.bar.println(format!("  📊 {}", timings.summary()));
        }
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        self.bar
            .println(format!("❌ Error during {}: {}", stage.description(), error));
    }
}

/// Words for one input: flags win, otherwise the file name is the product
fn copy_for(cli: &Cli, input: &Path) -> BannerCopy {
    let product_name = cli
        .product_name
        .clone()
        .unwrap_or_else(|| product_name_from_path(input));
    BannerCopy {
        product_name,
        title: cli.title.clone(),
        subtitle: cli.subtitle.clone(),
        cta: cli.cta.clone(),
    }
}

/// `red_running-shoe.png` → `red running shoe`
fn product_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
        .map(|name| name.trim().to_string())
        .unwrap_or_default()
}

/// `banner.png` → `banner_mask.png`
fn mask_path_for(output: &Path) -> PathBuf {
    let stem = output.file_stem().unwrap_or_default().to_string_lossy();
    output.with_file_name(format!("{}_mask.png", stem))
}

/// Expand inputs into a sorted list of image files
fn collect_input_files(cli: &Cli) -> Result<Vec<PathBuf>> {
    let mut all_files = Vec::new();

    for input in &cli.input {
        let path = PathBuf::from(input);

        if path.is_file() {
            if ImageIOService::is_supported_format(&path) {
                all_files.push(path);
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            all_files.extend(find_image_files(&path, cli.recursive, cli.pattern.as_deref())?);
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    // Sort files alphanumerically for consistent processing order
    all_files.sort();
    all_files.dedup();
    Ok(all_files)
}

/// Find all image files in a directory
fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let path = entry.path();
                if ImageIOService::is_supported_format(path) && matches_pattern(path, pattern) {
                    files.push(path.to_path_buf());
                }
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if ImageIOService::is_supported_format(&path) && matches_pattern(&path, pattern) {
                    files.push(path);
                }
            }
        }
    }

    Ok(files)
}

/// Check if file matches the given pattern
fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|filename| {
                glob::Pattern::new(pat)
                    .map(|p| p.matches(filename))
                    .unwrap_or(false)
            }),
        None => true,
    }
}
