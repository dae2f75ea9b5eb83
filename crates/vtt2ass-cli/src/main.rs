//! vtt2ass CLI
//!
//! Converts WebVTT subtitles to ASS (with ruby annotations laid out as
//! separate events) or to SRT.
//!
//! ```text
//! vtt2ass ass -W 1920 -H 1080 -f NotoSansJP.otf -o out.ass in.vtt
//! vtt2ass srt -o out.srt in.vtt
//! vtt2ass config -W 1280 -H 720 -o settings.json
//! ```

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use vtt2ass_core::captions::{export_srt, parse_vtt};
use vtt2ass_core::convert::{ConversionReport, Converter};
use vtt2ass_core::settings::ConvertSettings;
use vtt2ass_core::text::{FixedAdvanceMetrics, ShapingMetrics, TextMetrics};
use vtt2ass_core::VideoInfo;

// =============================================================================
// Arguments
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "vtt2ass", version, about = "Convert WebVTT subtitles to ASS or SRT")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert to Advanced SubStation Alpha
    Ass(AssArgs),
    /// Convert to SubRip
    Srt(SrtArgs),
    /// Write a settings file with every option at its default
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default)]
struct VideoArgs {
    /// Video width in pixels
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Video height in pixels
    #[arg(short = 'H', long)]
    height: Option<u32>,
}

#[derive(Args, Debug)]
struct AssArgs {
    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    video: VideoArgs,

    /// Font file used to measure text
    #[arg(short, long)]
    font: Option<PathBuf>,

    /// Outline width of the default style
    #[arg(short = 'B', long)]
    border: Option<f64>,

    /// Draw layout boxes under the text
    #[arg(short = 'D', long)]
    debug_boxes: bool,

    /// Settings file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Layout threads (0 = one per CPU)
    #[arg(long)]
    jobs: Option<usize>,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,

    /// WebVTT input file
    input: PathBuf,
}

#[derive(Args, Debug)]
struct SrtArgs {
    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// WebVTT input file
    input: PathBuf,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    video: VideoArgs,
}

// =============================================================================
// Commands
// =============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose, cli.log_dir.as_deref());

    match cli.command {
        Command::Ass(args) => {
            let json = args.json;
            let report = run_ass(args)?;
            print_report(&report, json)?;
            Ok(())
        }
        Command::Srt(args) => run_srt(&args),
        Command::Config(args) => run_config(&args),
    }
}

/// Builds the run settings: config file first, then flags
fn resolve_settings(args: &AssArgs) -> Result<ConvertSettings> {
    let mut settings = match &args.config {
        Some(path) => ConvertSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => {
            let (Some(width), Some(height)) = (args.video.width, args.video.height) else {
                bail!("--width and --height are required unless --config is given");
            };
            ConvertSettings {
                video: VideoInfo::new(width, height),
                ..Default::default()
            }
        }
    };

    if let Some(width) = args.video.width {
        settings.video.width = width;
    }
    if let Some(height) = args.video.height {
        settings.video.height = height;
    }
    if let Some(font) = &args.font {
        settings.font_path = Some(font.clone());
    }
    if let Some(border) = args.border {
        settings.border_size = Some(border);
    }
    if let Some(jobs) = args.jobs {
        settings.jobs = jobs;
    }
    settings.debug_boxes |= args.debug_boxes;
    settings.normalize();
    Ok(settings)
}

fn load_metrics(font_path: Option<&Path>) -> Result<Box<dyn TextMetrics>> {
    match font_path {
        Some(path) => {
            let (metrics, _key) = ShapingMetrics::with_font(path)
                .with_context(|| format!("Failed to load font {}", path.display()))?;
            Ok(Box::new(metrics))
        }
        None => {
            warn!("No font given, measuring text with fixed advances");
            Ok(Box::new(FixedAdvanceMetrics::default()))
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn run_ass(args: AssArgs) -> Result<ConversionReport> {
    let settings = resolve_settings(&args)?;
    let metrics = load_metrics(settings.font_path.as_deref())?;
    let content = read_input(&args.input)?;

    let converter = Converter::new(settings, metrics.as_ref());
    let (ass, report) = converter
        .convert_str(&content)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;
    ass.write_to(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!("Wrote {}", args.output.display());
    Ok(report)
}

fn print_report(report: &ConversionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{} cue(s) converted, {} skipped, {} field(s) recovered",
        report.converted,
        report.skipped.len(),
        report.recovered.len()
    );
    for diagnostic in report.diagnostics() {
        println!("  {}", diagnostic);
    }
    Ok(())
}

fn run_srt(args: &SrtArgs) -> Result<()> {
    let content = read_input(&args.input)?;
    let doc = parse_vtt(&content)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;
    for diagnostic in &doc.diagnostics {
        warn!("{}", diagnostic);
    }

    std::fs::write(&args.output, export_srt(&doc.cues, &doc.styles))
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("{} cue(s) written to {}", doc.cues.len(), args.output.display());
    Ok(())
}

fn run_config(args: &ConfigArgs) -> Result<()> {
    let mut settings = ConvertSettings::default();
    if let Some(width) = args.video.width {
        settings.video.width = width;
    }
    if let Some(height) = args.video.height {
        settings.video.height = height;
    }
    settings
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Settings written to {}", args.output.display());
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
