//! board-locate CLI: find a chessboard in an image and print the result as JSON.

use std::path::{Path, PathBuf};

use board_locate::contour::{extract_edges, ContourDetectorParams, MinArea};
use board_locate::core::{ImagePrimitives, ImageprocPrimitives, LogFilter, LogSpecError};
use board_locate::detect::{gray_view, load_gray, to_core_gray};
use board_locate::render::{draw_region, draw_segments};
use board_locate::template::{BoardTemplate, TemplateBoardDetector};
use board_locate::{
    split_board_squares, BoardDetector, Detection, DetectionStrategy, LocateConfig,
    DEFAULT_SQUARE_SIZE,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::Rgb;
use serde::Serialize;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

/// Frame fraction used as the contour area floor when nothing else is given.
const DEFAULT_MIN_AREA_FRACTION: f32 = 0.01;

#[derive(Parser)]
#[command(name = "board-locate")]
#[command(about = "Locate a chessboard in an image by grid-line contours or template matching")]
#[command(version)]
struct Cli {
    /// Log filter: a level (off, error, warn, info, debug, trace) or
    /// `target=level` directives, e.g. `warn,board_locate_contour=debug`.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect with the grid-line contour strategy.
    Contour(ContourArgs),

    /// Detect with the coarse-to-fine template strategy.
    Template(TemplateArgs),

    /// Detect, then write the 64 board squares as PNG files.
    Squares(SquaresArgs),

    /// Write a config file with every default spelled out.
    InitConfig {
        /// Destination JSON path.
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct ContourArgs {
    /// Input image.
    image: PathBuf,

    /// JSON config (see `init-config`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Absolute contour area floor in pixels; overrides the config.
    #[arg(long, conflicts_with = "min_area_fraction")]
    min_area: Option<f32>,

    /// Contour area floor as a fraction of the frame area; overrides the config.
    #[arg(long)]
    min_area_fraction: Option<f32>,

    /// Write the frame with detected segments and the board outline.
    #[arg(long)]
    overlay: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct TemplateArgs {
    /// Input image.
    image: PathBuf,

    /// Reference image of the board.
    #[arg(long)]
    template: PathBuf,

    /// JSON config (see `init-config`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Single full-resolution scale sweep instead of coarse-to-fine.
    #[arg(long)]
    single_pass: bool,

    /// Write the frame with the matched box drawn on it.
    #[arg(long)]
    overlay: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Contour,
    Template,
}

#[derive(Debug, Clone, Args)]
struct SquaresArgs {
    /// Input image.
    image: PathBuf,

    /// Output directory for `r{row}_c{col}.png` files.
    #[arg(long)]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = StrategyArg::Template)]
    strategy: StrategyArg,

    /// Reference image of the board (template strategy).
    #[arg(long, required_if_eq("strategy", "template"))]
    template: Option<PathBuf>,

    /// JSON config (see `init-config`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side of each written square in pixels.
    #[arg(long, default_value_t = DEFAULT_SQUARE_SIZE)]
    size: usize,
}

#[derive(Serialize)]
struct Report<'a> {
    image: &'a Path,
    strategy: DetectionStrategy,
    detection: Detection,
    #[serde(skip_serializing_if = "Option::is_none")]
    squares_written: Option<usize>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Contour(args) => run_contour(&args),
        Commands::Template(args) => run_template(&args),
        Commands::Squares(args) => run_squares(&args),
        Commands::InitConfig { out } => run_init_config(&out),
    }
}

fn parse_log_filter(spec: &str) -> CliResult<LogFilter> {
    spec.parse().map_err(|e: LogSpecError| e.to_string().into())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(spec: &str) -> CliResult<()> {
    board_locate::core::init_logger(parse_log_filter(spec)?)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(spec: &str) -> CliResult<()> {
    parse_log_filter(spec)?;
    board_locate::core::init_tracing(spec, false);
    // Already installed when the subscriber bridges `log` itself.
    let _ = tracing_log::LogTracer::init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> CliResult<LocateConfig> {
    Ok(match path {
        Some(p) => LocateConfig::load_json(p)?,
        None => LocateConfig::new(MinArea::FractionOfFrame {
            fraction: DEFAULT_MIN_AREA_FRACTION,
        }),
    })
}

fn contour_params(args: &ContourArgs) -> CliResult<ContourDetectorParams> {
    let mut params = load_config(args.config.as_deref())?.contour;
    if let Some(pixels) = args.min_area {
        params.min_area = MinArea::Absolute { pixels };
    } else if let Some(fraction) = args.min_area_fraction {
        params.min_area = MinArea::FractionOfFrame { fraction };
    }
    Ok(params)
}

fn load_template(path: &Path) -> CliResult<BoardTemplate> {
    Ok(BoardTemplate::new(to_core_gray(&load_gray(path)?))?)
}

fn print_report(report: &Report<'_>) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn run_contour(args: &ContourArgs) -> CliResult<()> {
    let params = contour_params(args)?;
    let gray = load_gray(&args.image)?;
    let view = gray_view(&gray);
    let detector = BoardDetector::contour(ImageprocPrimitives, params.clone())?;
    let detection = detector.detect(&view);

    if let Some(out) = &args.overlay {
        let mut canvas = image::DynamicImage::ImageLuma8(gray.clone()).to_rgb8();
        let edges = extract_edges(&ImageprocPrimitives, &view, &params.edges);
        let segments = ImageprocPrimitives.line_segments(&edges, &params.hough);
        draw_segments(&mut canvas, &segments, Rgb([0, 160, 255]));
        if let Some(loc) = detection.found() {
            draw_region(&mut canvas, &loc.region, Rgb([255, 0, 0]));
        }
        canvas.save(out)?;
    }

    print_report(&Report {
        image: &args.image,
        strategy: DetectionStrategy::Contour,
        detection,
        squares_written: None,
    })
}

fn run_template(args: &TemplateArgs) -> CliResult<()> {
    let cfg = load_config(args.config.as_deref())?;
    let template = load_template(&args.template)?;
    let gray = load_gray(&args.image)?;
    let view = gray_view(&gray);

    let detection = if args.single_pass {
        TemplateBoardDetector::new(template, cfg.template)?.detect_single_pass(
            &ImageprocPrimitives,
            &view,
            &Default::default(),
        )
    } else {
        BoardDetector::template(ImageprocPrimitives, template, cfg.template)?.detect(&view)
    };

    if let Some(out) = &args.overlay {
        let mut canvas = image::DynamicImage::ImageLuma8(gray.clone()).to_rgb8();
        if let Some(loc) = detection.found() {
            draw_region(&mut canvas, &loc.region, Rgb([255, 0, 0]));
        }
        canvas.save(out)?;
    }

    print_report(&Report {
        image: &args.image,
        strategy: DetectionStrategy::Template,
        detection,
        squares_written: None,
    })
}

fn run_squares(args: &SquaresArgs) -> CliResult<()> {
    let cfg = load_config(args.config.as_deref())?;
    let gray = load_gray(&args.image)?;
    let view = gray_view(&gray);

    let detector = match (args.strategy, &args.template) {
        (StrategyArg::Template, Some(path)) => {
            BoardDetector::template(ImageprocPrimitives, load_template(path)?, cfg.template)?
        }
        (StrategyArg::Template, None) => return Err("--template is required".into()),
        (StrategyArg::Contour, _) => BoardDetector::contour(ImageprocPrimitives, cfg.contour)?,
    };
    let detection = detector.detect(&view);

    let mut written = 0;
    if let Some(loc) = detection.found() {
        std::fs::create_dir_all(&args.out_dir)?;
        for sq in split_board_squares(&view, &loc.region, args.size) {
            let img = image::GrayImage::from_raw(
                sq.image.width as u32,
                sq.image.height as u32,
                sq.image.data,
            )
            .ok_or("square buffer does not match its dimensions")?;
            img.save(args.out_dir.join(format!("r{}_c{}.png", sq.row, sq.col)))?;
            written += 1;
        }
        log::info!("wrote {written} squares to {}", args.out_dir.display());
    }

    print_report(&Report {
        image: &args.image,
        strategy: detector.strategy(),
        detection,
        squares_written: Some(written),
    })
}

fn run_init_config(out: &Path) -> CliResult<()> {
    LocateConfig::new(MinArea::FractionOfFrame {
        fraction: DEFAULT_MIN_AREA_FRACTION,
    })
    .write_json(out)?;
    println!("{}", out.display());
    Ok(())
}
