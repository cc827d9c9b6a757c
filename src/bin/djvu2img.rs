//! CLI binary for djvu-raster.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExportConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use djvu_raster::{
    export_file, inspect, ExportConfig, ExportProgressCallback, OutputFormat, PageSelection,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner only; the bar length is set by `on_export_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening DjVu…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rasterising");
        self.bar.reset_eta();
    }

    fn elapsed_ms(&self, page_num: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_export_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rasterising {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, bytes_written: usize) {
        let elapsed_ms = self.elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} Page {:>4}/{:<4}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>7} KiB", bytes_written / 1024)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed_ms = self.elapsed_ms(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep output on one line.
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>4}/{:<4}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_export_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages rasterised successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages rasterised  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rasterise every page into ./scan/
  djvu2img scan.djvu

  # Specific pages into a chosen directory
  djvu2img --pages 1-5 scan.djvu -o pages/

  # Force PNG output with a custom file prefix
  djvu2img --format png --prefix leaf scan.djvu

  # Page sizes and types only
  djvu2img --inspect-only scan.djvu

  # JSON summary of the export
  djvu2img --json scan.djvu > export.json

OUTPUT:
  Bitonal pages are written as 8-bit grayscale TIFF holding only black
  (0) and white (255), photo and compound pages as RGB JPEG. If a codec is not compiled in, pages are saved as PNG instead and
  a warning is logged. Files are named <prefix>-NNNN.<ext>, 1-based.

ENVIRONMENT VARIABLES:
  RUST_LOG          Override the log filter (e.g. djvu_raster=debug)
  DDJVU_LIB_DIR     Build time: directory containing libdjvulibre
"#;

/// Rasterise DjVu pages into image files.
#[derive(Parser, Debug)]
#[command(
    name = "djvu2img",
    version,
    about = "Rasterise DjVu pages into TIFF/JPEG images",
    long_about = "Rasterise the pages of a DjVu document into image files. Bitonal pages \
are rendered black and white and saved as grayscale TIFF; photographic and compound pages \
are rendered in RGB and saved as JPEG.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// DjVu file path.
    input: PathBuf,

    /// Directory to write pages into. Default: the input file name without extension.
    #[arg(short, long, env = "DJVU2IMG_OUTPUT")]
    output: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "DJVU2IMG_PAGES", default_value = "all")]
    pages: String,

    /// Output format: auto (TIFF for bitonal, JPEG otherwise), tiff, jpeg, png.
    #[arg(long, env = "DJVU2IMG_FORMAT", value_enum, default_value = "auto")]
    format: FormatArg,

    /// JPEG quality (1–100).
    #[arg(long, env = "DJVU2IMG_JPEG_QUALITY", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// File name prefix for written pages.
    #[arg(long, env = "DJVU2IMG_PREFIX", default_value = "page")]
    prefix: String,

    /// Fail a page instead of replacing an existing file.
    #[arg(long, env = "DJVU2IMG_NO_OVERWRITE")]
    no_overwrite: bool,

    /// Output structured JSON (ExportOutput) on stdout.
    #[arg(long, env = "DJVU2IMG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DJVU2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Print page sizes and types only, no rasterisation.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DJVU2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DJVU2IMG_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Auto,
    Tiff,
    Jpeg,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Auto => OutputFormat::Auto,
            FormatArg::Tiff => OutputFormat::Tiff,
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; warnings (missing codecs, blank
    // pages) still get through.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input)
            .await
            .context("Failed to inspect DjVu")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:   {}", cli.input.display());
            println!("Pages:  {}", meta.page_count);
            for p in &meta.pages {
                println!(
                    "  {:>4}  {:>5}x{:<5}  {:<9} {}",
                    p.page_num,
                    p.width,
                    p.height,
                    format!("{:?}", p.page_type).to_lowercase(),
                    p.mode.name()
                );
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExportProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let out_dir = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_dir(&cli.input));

    // ── Run export ───────────────────────────────────────────────────────
    let output = export_file(&cli.input, &out_dir, &config)
        .await
        .context("Export failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} pages  {} bitonal / {} RGB  {}ms  →  {}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed_pages,
            stats.processed_pages + stats.failed_pages,
            stats.bitonal_pages,
            stats.multitone_pages,
            stats.total_duration_ms,
            bold(&out_dir.display().to_string()),
        );
        eprintln!(
            "   {} written",
            dim(&format!("{} KiB", stats.total_bytes / 1024))
        );
        if !show_progress && stats.failed_pages > 0 {
            for e in output.errors() {
                eprintln!("  {} {}", red("✗"), e);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ExportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExportConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = ExportConfig::builder()
        .pages(pages)
        .format(cli.format.into())
        .jpeg_quality(cli.jpeg_quality)
        .file_prefix(cli.prefix.clone())
        .overwrite(!cli.no_overwrite);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `scan.djvu` → `scan/`, next to the current directory.
fn default_output_dir(input: &Path) -> PathBuf {
    input
        .file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("pages"))
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
