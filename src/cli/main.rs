//! bgswap command-line tool
//!
//! Removes backgrounds, composites subjects onto new backgrounds and applies
//! basic adjustments. Every command that produces a subject also writes the
//! matching binary mask.

use super::backend_factory::create_segmenter;
use super::config::{parse_dimensions, CliConfigBuilder};
use crate::{
    config::OutputFormat,
    handler::{ImageHandler, ImageSource},
    processor::BackgroundProcessor,
    segmentation::Segmenter,
    services::ImageIOService,
    tracing_config::{init_cli_tracing, TracingFormat},
    types::{MaskedImage, SolidColor},
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Background removal and replacement with inpainting masks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgswap")]
pub struct Cli {
    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console, global = true)]
    pub log_format: CliLogFormat,

    /// Explicit log filter directive (e.g. `bgswap=debug`), overrides -v
    #[arg(long, value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    /// Output format for result images [default: from the output extension, else PNG]
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliOutputFormat>,

    /// JPEG quality (0-100)
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(0..=100), global = true)]
    pub jpeg_quality: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Remove the background of an image and write the subject mask
    Remove(RemoveArgs),
    /// Place a subject on a new background and write the subject mask
    Compose(ComposeArgs),
    /// Resize and enhance an image
    Adjust(AdjustArgs),
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Input image path or http(s) URL
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// ONNX saliency model file
    #[arg(short, long, value_name = "ONNX")]
    pub model: PathBuf,

    /// Model family, selects input size and normalization
    #[arg(long, value_enum, default_value_t = ModelKind::U2net)]
    pub model_kind: ModelKind,

    /// Output image [default: <stem>_nobg.<ext>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output mask [default: <stem>_mask.png]
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Alpha at or below this value is background in the mask
    #[arg(long)]
    pub threshold: Option<u8>,
}

#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Subject image (with transparency) path or URL
    #[arg(value_name = "SUBJECT")]
    pub subject: String,

    /// Background image path or URL
    #[arg(value_name = "BACKGROUND")]
    pub background: String,

    /// Output image [default: <stem>_composite.<ext>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output mask [default: <stem>_mask.png]
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Alpha at or below this value is background in the mask [default: 25]
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Subject size as a fraction of the background [default: 0.5]
    #[arg(long, conflicts_with = "keep_size")]
    pub size: Option<f32>,

    /// Horizontal subject center as a fraction of background width [default: 0.5]
    #[arg(long, conflicts_with = "top_left")]
    pub left: Option<f32>,

    /// Vertical subject center as a fraction of background height [default: 0.7]
    #[arg(long, conflicts_with = "top_left")]
    pub top: Option<f32>,

    /// Keep the subject's original size
    #[arg(long)]
    pub keep_size: bool,

    /// Paste the subject at the top-left corner
    #[arg(long)]
    pub top_left: bool,

    /// Fill the background with a solid color (#rgb, #rrggbb or #rrggbbaa)
    #[arg(long, value_name = "HEX")]
    pub solid_color: Option<SolidColor>,

    /// JSON processor configuration; explicit flags take precedence
    #[arg(long, value_name = "FILE.json")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AdjustArgs {
    /// Input image path or http(s) URL
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Output image
    #[arg(short, long)]
    pub output: PathBuf,

    /// Color saturation factor (1.0 = unchanged)
    #[arg(long)]
    pub color: Option<f32>,

    /// Contrast factor (1.0 = unchanged)
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Brightness factor (1.0 = unchanged)
    #[arg(long)]
    pub brightness: Option<f32>,

    /// Sharpness factor (1.0 = unchanged)
    #[arg(long)]
    pub sharpness: Option<f32>,

    /// Fit within WIDTHxHEIGHT, never enlarging
    #[arg(long, value_name = "WxH", value_parser = parse_dimensions)]
    pub resize: Option<(u32, u32)>,

    /// With --resize, stretch to exactly WIDTHxHEIGHT
    #[arg(long, requires = "resize")]
    pub stretch: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
    Tiff,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    /// Colored human-readable lines
    Console,
    /// Plain lines without colors
    Compact,
    /// One JSON object per event (requires the `tracing-json` feature)
    Json,
}

impl CliLogFormat {
    pub(crate) fn tracing_format(self) -> Result<TracingFormat> {
        match self {
            Self::Console => Ok(TracingFormat::Console),
            Self::Compact => Ok(TracingFormat::Compact),
            #[cfg(feature = "tracing-json")]
            Self::Json => Ok(TracingFormat::Json),
            #[cfg(not(feature = "tracing-json"))]
            Self::Json => anyhow::bail!("JSON logs require the 'tracing-json' feature"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum ModelKind {
    /// U2-Net family (320x320, ImageNet normalization)
    U2net,
    /// ISNet family (1024x1024)
    Isnet,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, cli.log_format.tracing_format()?, cli.log_filter.as_deref())
        .context("Failed to initialize tracing subscriber")?;

    let start = Instant::now();
    match &cli.command {
        Command::Remove(args) => run_remove(&cli, args)?,
        Command::Compose(args) => run_compose(&cli, args)?,
        Command::Adjust(args) => run_adjust(&cli, args)?,
    }
    info!("Finished in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn run_remove(cli: &Cli, args: &RemoveArgs) -> Result<()> {
    let config = CliConfigBuilder::for_remove(cli, args)?;
    let output_format = config.output_format;

    let spinner = spinner("Loading model");
    let segmenter: Box<dyn Segmenter> = create_segmenter(&args.model, args.model_kind)?;
    let processor = BackgroundProcessor::new(config, segmenter).context("Invalid configuration")?;

    spinner.set_message(format!("Removing background from {}", args.input));
    let result = processor
        .remove_background_from(ImageSource::from_location(&args.input))
        .with_context(|| format!("Failed to remove background from {}", args.input))?;

    let stem = input_stem(&args.input);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, &format!("{stem}_nobg"), output_format));
    let mask = args
        .mask
        .clone()
        .unwrap_or_else(|| default_output(&args.input, &format!("{stem}_mask"), OutputFormat::Png));

    save_result(&processor, &result, &output, &mask)?;
    spinner.finish_and_clear();
    report(&output, &mask, &result);
    Ok(())
}

fn run_compose(cli: &Cli, args: &ComposeArgs) -> Result<()> {
    let config = CliConfigBuilder::for_compose(cli, args)?;
    let output_format = config.output_format;

    // Compositing never calls the segmenter
    let segmenter: Box<dyn Segmenter> = Box::new(|image: &image::DynamicImage| {
        Ok::<_, crate::error::BgSwapError>(image.clone())
    });
    let processor = BackgroundProcessor::new(config, segmenter).context("Invalid configuration")?;

    let spinner = spinner(format!("Compositing {} onto {}", args.subject, args.background));
    let result = processor
        .add_background_from(
            ImageSource::from_location(&args.subject),
            ImageSource::from_location(&args.background),
        )
        .with_context(|| format!("Failed to composite {} onto {}", args.subject, args.background))?;

    let stem = input_stem(&args.subject);
    let output = args.output.clone().unwrap_or_else(|| {
        default_output(&args.subject, &format!("{stem}_composite"), output_format)
    });
    let mask = args
        .mask
        .clone()
        .unwrap_or_else(|| default_output(&args.subject, &format!("{stem}_mask"), OutputFormat::Png));

    save_result(&processor, &result, &output, &mask)?;
    spinner.finish_and_clear();
    report(&output, &mask, &result);
    Ok(())
}

fn run_adjust(cli: &Cli, args: &AdjustArgs) -> Result<()> {
    let factors = CliConfigBuilder::enhance_factors(args)?;

    let spinner = spinner(format!("Adjusting {}", args.input));
    let mut handler = ImageHandler::open(ImageSource::from_location(&args.input))
        .with_context(|| format!("Failed to load {}", args.input))?;

    if let Some((width, height)) = args.resize {
        handler.resize(width, height, !args.stretch)?;
    }
    handler.enhance(&factors)?;

    match cli.format {
        Some(format) => handler.save_with_format(&args.output, format.into(), cli.jpeg_quality),
        None => handler.save(&args.output),
    }
    .with_context(|| format!("Failed to save {}", args.output.display()))?;

    spinner.finish_and_clear();
    let (width, height) = handler.dimensions();
    println!("Saved {} ({width}x{height})", args.output.display());
    Ok(())
}

fn save_result(processor: &BackgroundProcessor, result: &MaskedImage, output: &Path, mask: &Path) -> Result<()> {
    debug!(output = %output.display(), mask = %mask.display(), "Saving result");
    processor
        .save(result, output, mask)
        .with_context(|| format!("Failed to save {} and {}", output.display(), mask.display()))
}

fn report(output: &Path, mask: &Path, result: &MaskedImage) {
    println!("Saved {}", output.display());
    println!(
        "Saved {} ({} subject pixels)",
        mask.display(),
        result.subject_pixel_count()
    );
}

fn spinner(message: impl Into<std::borrow::Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// File stem of a path or of the last URL path segment
pub(crate) fn input_stem(location: &str) -> String {
    let name = if ImageIOService::is_url(location) {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        path.rsplit('/').next().unwrap_or(path)
    } else {
        location
    };
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// `<name>.<ext>` next to a local input, or in the working directory for URLs
pub(crate) fn default_output(location: &str, name: &str, format: OutputFormat) -> PathBuf {
    let file_name = format!("{name}.{}", format.extension());
    if ImageIOService::is_url(location) {
        return PathBuf::from(file_name);
    }
    Path::new(location)
        .parent()
        .map_or_else(|| PathBuf::from(&file_name), |parent| parent.join(&file_name))
}
