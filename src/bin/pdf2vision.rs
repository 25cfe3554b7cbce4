//! CLI binary for edgequake-pdf2vision.
//!
//! A thin shim over the library crate that maps CLI flags to `VisionConfig`,
//! shows per-page progress and writes the two transcripts.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2vision::{
    config::{ENV_API_KEY, ENV_ENDPOINT_URL},
    convert, convert::write_atomic, ConversionOutput, Observer, PageError, SessionObserver,
    VisionConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a live progress bar plus one log line per page.
/// Page failures are printed and the bar moves on.
struct CliObserver {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliObserver {
    /// Spinner while pdfium renders; switched to a bar in `on_run_start`.
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Rendering");
        bar.set_message("Rasterising PDF pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Recognising");
        self.bar.reset_eta();
    }
}

impl SessionObserver for CliObserver {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Sending {total_pages} pages to the OCR endpoint…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, word_count: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{word_count:>5} words")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &PageError) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let detail = &error.detail;
        let msg = if detail.chars().count() > 80 {
            let cut: String = detail.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            detail.clone()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages recognised",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages recognised  ({} failed)",
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

/// Plain observer used with `--no-progress`: failures still reach the user.
struct StderrObserver;

impl SessionObserver for StderrObserver {
    fn on_page_error(&self, _page_num: usize, _total: usize, error: &PageError) {
        eprintln!("{} {}", red("An error occurred within the Vision API:"), error);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extracted text to stdout
  pdf2vision scan.pdf

  # Text and raw JSON to files
  pdf2vision scan.pdf -o scan.txt --raw-output scan.json.txt

  # Explicit endpoint and key
  pdf2vision --endpoint https://westeurope.api.cognitive.microsoft.com/vision/v2.0/ocr \
             --api-key 0123456789abcdef scan.pdf

  # Structured output (pages, stats, transcripts)
  pdf2vision --json scan.pdf > run.json

PAGE IMAGES:
  Pages are written to ./images/<file name><page index>.jpeg (override with
  --image-dir) and overwritten on every run.

ENVIRONMENT VARIABLES:
  PDF2VISION_API_KEY       Subscription key (Ocp-Apim-Subscription-Key)
  PDF2VISION_ENDPOINT_URL  OCR endpoint URL
  PDFIUM_LIB_PATH          Path to libpdfium
  RUST_LOG                 Log filter, e.g. edgequake_pdf2vision=debug

  Variables may also be placed in a .env file in the working directory.
"#;

/// Rasterise a PDF and extract its text with a cloud OCR endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2vision",
    version,
    about = "Rasterise a PDF and extract its text with a cloud OCR endpoint",
    long_about = "Render every page of a PDF to a 300 DPI JPEG, send each image to a \
Computer Vision OCR endpoint in page order, and print the extracted text. \
The pretty-printed JSON responses can be written alongside.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Subscription key sent as Ocp-Apim-Subscription-Key.
    #[arg(long, env = ENV_API_KEY, hide_env_values = true)]
    api_key: Option<String>,

    /// OCR endpoint URL (without query string).
    #[arg(long, env = ENV_ENDPOINT_URL)]
    endpoint: Option<String>,

    /// Directory for page images [default: ./images].
    #[arg(long, env = "PDF2VISION_IMAGE_DIR")]
    image_dir: Option<PathBuf>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF2VISION_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// OCR language hint; "unk" lets the service detect it.
    #[arg(long, env = "PDF2VISION_LANGUAGE", default_value = "unk")]
    language: String,

    /// Do not ask the service to detect text orientation.
    #[arg(long)]
    no_detect_orientation: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2VISION_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PDF2VISION_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Write the extracted text to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the pretty-printed JSON responses to this file.
    #[arg(long)]
    raw_output: Option<PathBuf>,

    /// Print the full run (pages, stats, transcripts) as JSON on stdout.
    #[arg(long, conflicts_with = "output")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2VISION_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2VISION_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2VISION_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
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

    let observer: Option<Observer> = if show_progress {
        Some(CliObserver::new() as Arc<dyn SessionObserver>)
    } else if !cli.quiet {
        Some(Arc::new(StderrObserver))
    } else {
        None
    };

    let config = build_config(&cli, observer)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = convert(&cli.input, &config)
        .await
        .context("OCR run failed")?;

    emit(&cli, &output).await?;

    if !cli.quiet && !show_progress {
        eprintln!(
            "Recognised {}/{} pages ({} words) in {}ms",
            output.stats.processed_pages,
            output.stats.total_pages,
            output.stats.total_words,
            output.stats.total_duration_ms
        );
    }

    if output.stats.total_pages > 0 && output.stats.processed_pages == 0 {
        anyhow::bail!("all {} pages failed OCR", output.stats.total_pages);
    }

    Ok(())
}

/// Write the transcripts (or the JSON run) where the flags say.
async fn emit(cli: &Cli, output: &ConversionOutput) -> Result<()> {
    if let Some(ref path) = cli.raw_output {
        write_atomic(path, output.transcript.raw())
            .await
            .context("Failed to write raw output")?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    match cli.output {
        Some(ref path) => {
            write_atomic(path, output.transcript.text())
                .await
                .context("Failed to write text output")?;
            if !cli.quiet {
                eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.transcript.text().as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Map CLI args to `VisionConfig`.
fn build_config(cli: &Cli, observer: Option<Observer>) -> Result<VisionConfig> {
    let mut builder = VisionConfig::builder()
        .dpi(cli.dpi)
        .language(cli.language.clone())
        .detect_orientation(!cli.no_detect_orientation)
        .request_timeout_secs(cli.timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref url) = cli.endpoint {
        builder = builder.endpoint_url(url.clone());
    }
    if let Some(ref dir) = cli.image_dir {
        builder = builder.image_dir(dir.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_and_output_are_mutually_exclusive() {
        let err = Cli::try_parse_from(["pdf2vision", "--json", "-o", "out.txt", "scan.pdf"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn json_combines_with_raw_output() {
        let cli = Cli::try_parse_from([
            "pdf2vision",
            "--json",
            "--raw-output",
            "raw.txt",
            "scan.pdf",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.raw_output, Some(PathBuf::from("raw.txt")));
    }
}
