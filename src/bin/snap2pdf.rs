//! CLI binary for snap2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConvertOptions`, runs the conversion and writes the PDF.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use snap2pdf::{
    acquire, convert, read_files, save_pdf, Compression, ConversionOutput,
    ConversionProgressCallback, ConvertOptions, Orientation, OutlineFont, PageSize, ProgressCallback, WatermarkOptions,
    WatermarkPosition,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn human_bytes(n: usize) -> String {
    match n {
        n if n >= 1 << 20 => format!("{:.1} MB", n as f64 / (1u64 << 20) as f64),
        n if n >= 1 << 10 => format!("{:.1} KB", n as f64 / 1024.0),
        n => format!("{n} B"),
    }
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Starts as a spinner while files are read and decoded; the bar length
    /// is set by `on_conversion_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .map(|mut m| m.remove(&page_num))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_images} image(s)…"))
        ));
    }

    fn on_image_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("image {page_num}"));
    }

    fn on_image_complete(&self, page_num: usize, total: usize, jpeg_bytes: usize) {
        let elapsed = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page_num,
            total,
            dim(&human_bytes(jpeg_bytes)),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.elapsed_secs(page_num);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.finish_and_clear();
    }

    // The summary line is printed by `main` once the PDF is on disk.
    fn on_conversion_complete(&self, _total_pages: usize, _pdf_bytes: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Two photos → output.pdf (A4 portrait)
  snap2pdf front.jpg back.jpg

  # iPhone photos on US Letter, landscape
  snap2pdf --size letter --orientation landscape IMG_0001.HEIC IMG_0002.HEIC -o trip.pdf

  # Smaller file: compression on at the default level (70)
  snap2pdf --compress scans/*.png -o scans.pdf

  # Explicit JPEG quality
  snap2pdf --quality 0.6 *.jpg -o small.pdf

  # Watermark every page
  snap2pdf --watermark "CONFIDENTIAL" --watermark-rotation -45 --watermark-opacity 0.5 contract-*.jpg

  # Machine-readable summary
  snap2pdf --json a.png b.png -o out.pdf > summary.json

ENVIRONMENT VARIABLES:
  Every flag can also be set through SNAP2PDF_<FLAG>, for example
  SNAP2PDF_SIZE=letter or SNAP2PDF_WATERMARK="DRAFT".
  RUST_LOG overrides the log level chosen by --verbose / --quiet.

HEIC/HEIF:
  Requires a build with `--features heif` (links libheif).
"#;

/// Combine images into a PDF, one image per page.
#[derive(Parser, Debug)]
#[command(
    name = "snap2pdf",
    version,
    about = "Combine images into a PDF, one image per page",
    long_about = "Combine JPEG, PNG, WebP, GIF, BMP (and HEIC/HEIF with the `heif` feature) \
images into a single PDF. Each image is scaled to fit its page, centred, and can be stamped \
with a text watermark. Nothing leaves your machine.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image files, in page order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, env = "SNAP2PDF_OUTPUT", default_value = "output.pdf")]
    output: PathBuf,

    /// Page size.
    #[arg(long, env = "SNAP2PDF_SIZE", value_enum, default_value = "a4")]
    size: SizeArg,

    /// Page orientation.
    #[arg(long, env = "SNAP2PDF_ORIENTATION", value_enum, default_value = "portrait")]
    orientation: OrientationArg,

    /// JPEG quality factor, 0.1–1.0. Default: 0.95.
    #[arg(long, env = "SNAP2PDF_QUALITY", value_parser = parse_unit_interval,
          conflicts_with = "compress")]
    quality: Option<f32>,

    /// Enable compression (quality = level / 100).
    #[arg(long, env = "SNAP2PDF_COMPRESS")]
    compress: bool,

    /// Compression level used with --compress (40–95).
    #[arg(long, env = "SNAP2PDF_COMPRESSION_LEVEL",
          default_value_t = Compression::DEFAULT_LEVEL,
          value_parser = clap::value_parser!(u8).range(40..=95))]
    compression_level: u8,

    /// Watermark text drawn on every image.
    #[arg(long, env = "SNAP2PDF_WATERMARK")]
    watermark: Option<String>,

    /// Watermark font size in image pixels (12–96).
    #[arg(long, env = "SNAP2PDF_WATERMARK_SIZE", default_value_t = 32,
          value_parser = clap::value_parser!(u32).range(12..=96))]
    watermark_size: u32,

    /// Watermark opacity, 0.1–1.0.
    #[arg(long, env = "SNAP2PDF_WATERMARK_OPACITY", default_value_t = 0.3,
          value_parser = parse_unit_interval)]
    watermark_opacity: f32,

    /// Watermark rotation in degrees (−90…90).
    #[arg(long, env = "SNAP2PDF_WATERMARK_ROTATION", default_value_t = 0,
          allow_negative_numbers = true,
          value_parser = clap::value_parser!(i32).range(-90..=90))]
    watermark_rotation: i32,

    /// Watermark anchor.
    #[arg(long, env = "SNAP2PDF_WATERMARK_POSITION", value_enum, default_value = "center")]
    watermark_position: PositionArg,

    /// TrueType/OpenType font for the watermark (default: a system sans-serif).
    #[arg(long, env = "SNAP2PDF_FONT")]
    font: Option<PathBuf>,

    /// Document title stored in the PDF metadata.
    #[arg(long, env = "SNAP2PDF_TITLE")]
    title: Option<String>,

    /// Print a JSON summary (pages, placements, stats) to stdout.
    #[arg(long, env = "SNAP2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SNAP2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SNAP2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SNAP2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SizeArg {
    A4,
    Letter,
}

impl From<SizeArg> for PageSize {
    fn from(v: SizeArg) -> Self {
        match v {
            SizeArg::A4 => PageSize::A4,
            SizeArg::Letter => PageSize::Letter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PositionArg {
    TopLeft,
    Center,
    BottomRight,
}

impl From<PositionArg> for WatermarkPosition {
    fn from(v: PositionArg) -> Self {
        match v {
            PositionArg::TopLeft => WatermarkPosition::TopLeft,
            PositionArg::Center => WatermarkPosition::Center,
            PositionArg::BottomRight => WatermarkPosition::BottomRight,
        }
    }
}

fn parse_unit_interval(s: &str) -> std::result::Result<f32, String> {
    let v: f32 = s.trim().parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.1..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} is outside 0.1–1.0"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new_dynamic);
    let options = build_options(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn ConversionProgressCallback>),
    )?;

    // ── Read + decode ────────────────────────────────────────────────────
    let result = async {
        let files = read_files(&cli.inputs)
            .await
            .context("Failed to read input images")?;
        let images = acquire(files).await.context("Failed to load images")?;
        convert(&images, &options).await.context("Conversion failed")
    }
    .await;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if let Some(ref cb) = progress {
                cb.abandon();
            }
            return Err(e);
        }
    };

    save_pdf(&output.pdf, &cli.output)
        .await
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        eprintln!("{}", summary_line(&output, &cli.output));
    }

    Ok(())
}

fn summary_line(output: &ConversionOutput, path: &Path) -> String {
    format!(
        "{}  {} page(s)  {}  {}ms  →  {}",
        green("✔"),
        output.stats.total_images,
        dim(&human_bytes(output.stats.pdf_bytes)),
        output.stats.duration_ms,
        bold(&path.display().to_string()),
    )
}

/// Map CLI args to `ConvertOptions`.
fn build_options(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConvertOptions> {
    let mut builder = ConvertOptions::builder()
        .size(cli.size.into())
        .orientation(cli.orientation.into());

    builder = match (cli.compress, cli.quality) {
        (true, _) => builder.compression(Compression::On(cli.compression_level)),
        (false, Some(q)) => builder.quality(q),
        (false, None) => builder.compression(Compression::Off),
    };

    if let Some(ref text) = cli.watermark {
        builder = builder.watermark(
            WatermarkOptions::new(text.clone())
                .font_size(cli.watermark_size as f32)
                .opacity(cli.watermark_opacity)
                .rotation(cli.watermark_rotation as f32)
                .position(cli.watermark_position.into()),
        );
    }

    if let Some(ref path) = cli.font {
        let font = OutlineFont::from_file(path)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("Failed to load font {}", path.display()))?;
        builder = builder.font(Arc::new(font));
    }

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["snap2pdf", "a.jpg"]).unwrap();
        assert_eq!(cli.output, PathBuf::from("output.pdf"));
        let options = build_options(&cli, None).unwrap();
        assert_eq!(options.quality(), 0.95);
        assert!(options.watermark.is_none());
        assert_eq!(options.page_dimensions().width, 595.0);
    }

    #[test]
    fn compression_flag_sets_quality() {
        let cli = Cli::try_parse_from(["snap2pdf", "--compress", "--compression-level", "55", "a.jpg"])
            .unwrap();
        let options = build_options(&cli, None).unwrap();
        assert!((options.quality() - 0.55).abs() < 1e-6);
    }

    #[test]
    fn watermark_flags() {
        let cli = Cli::try_parse_from([
            "snap2pdf",
            "--watermark",
            "DRAFT",
            "--watermark-rotation",
            "-45",
            "--watermark-position",
            "bottom-right",
            "--size",
            "letter",
            "--orientation",
            "landscape",
            "a.jpg",
        ])
        .unwrap();
        let options = build_options(&cli, None).unwrap();
        let wm = options.active_watermark().expect("watermark active");
        assert_eq!(wm.rotation, -45.0);
        assert_eq!(wm.position, WatermarkPosition::BottomRight);
        assert_eq!(options.page_dimensions().width, 792.0);
    }

    fn quiet_callback() -> CliProgressCallback {
        CliProgressCallback {
            bar: ProgressBar::hidden(),
            start_times: Mutex::new(HashMap::new()),
        }
    }

    #[test]
    fn completed_run_clears_the_bar() {
        let cb = quiet_callback();
        cb.on_conversion_start(2);
        cb.on_image_start(1, 2);
        cb.on_image_complete(1, 2, 2048);
        cb.on_image_start(2, 2);
        cb.on_image_complete(2, 2, 4096);
        assert_eq!(cb.bar.position(), 2);
        cb.on_conversion_complete(2, 9000);
        assert!(cb.bar.is_finished());
        assert!(cb.start_times.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_image_clears_the_bar() {
        let cb = quiet_callback();
        cb.on_conversion_start(3);
        cb.on_image_start(1, 3);
        cb.on_image_error(1, 3, &"x".repeat(200));
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn summary_line_names_pages_and_path() {
        let output = ConversionOutput {
            pdf: Vec::new(),
            pages: Vec::new(),
            stats: snap2pdf::ConversionStats {
                total_images: 3,
                total_jpeg_bytes: 1500,
                pdf_bytes: 2048,
                duration_ms: 12,
            },
        };
        let line = summary_line(&output, Path::new("out.pdf"));
        assert_eq!(line.matches("page(s)").count(), 1);
        assert!(line.contains("3 page(s)"));
        assert!(line.contains("2.0 KB"));
        assert!(line.contains("out.pdf"));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Cli::try_parse_from(["snap2pdf", "--quality", "1.5", "a.jpg"]).is_err());
        assert!(Cli::try_parse_from(["snap2pdf", "--compression-level", "20", "a.jpg"]).is_err());
        assert!(Cli::try_parse_from(["snap2pdf", "--quality", "0.5", "--compress", "a.jpg"]).is_err());
    }
}
