//! CLI binary for docx-translate.
//!
//! A thin shim over the library crate that maps CLI flags and `config.toml`
//! to a `TranslatorConfig`, translates one file and prints the result path.

use anyhow::{Context, Result};
use clap::Parser;
use docx_translate::pipeline::input::default_output_path;
use docx_translate::{
    build_client, translate_file, Direction, FileConfig, ProgressCallback,
    TranslationProgressCallback, TranslatorConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per paragraph.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the paragraph currently in flight.
    started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_translation_start` reports how many paragraphs
    /// will be sent.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, pending: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} paragraphs  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(pending as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Translating");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_translation_start(&self, pending: usize) {
        self.activate_bar(pending);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Translating {pending} paragraphs…"))
        ));
    }

    fn on_paragraph_start(&self, paragraph_num: usize, _total: usize) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(format!("paragraph {paragraph_num}"));
    }

    fn on_paragraph_complete(&self, paragraph_num: usize, total: usize, chars: usize) {
        self.bar.println(format!(
            "  {} Paragraph {:>4}/{:<4}  {:<8}  {}",
            green("✓"),
            paragraph_num,
            total,
            dim(&format!("{chars:>5} chars")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_paragraph_error(&self, paragraph_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Paragraph {:>4}/{:<4}  {}  {}",
            red("✗"),
            paragraph_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.abandon();
    }

    fn on_translation_complete(&self, pending: usize, translated: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}/{} paragraphs translated",
            green("✔"),
            bold(&translated.to_string()),
            pending
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Arabic to English, writes translated_report.docx next to the input
  docx-translate report.docx

  # English to Arabic with an explicit output path
  docx-translate --direction en-to-ar memo.docx -o memo_ar.docx

  # Another edgequake-llm provider
  docx-translate --provider openai --model gpt-4.1-mini report.docx

CONFIGURATION (config.toml):
  [groq]
  api_key = "gsk_..."

  [translation]
  provider    = "groq"
  temperature = 0.2

ENVIRONMENT VARIABLES:
  GROQ_API_KEY                 Groq API key (overrides config.toml)
  DOCX_TRANSLATE_CONFIG        Path to config.toml
  DOCX_TRANSLATE_DIRECTION     ar-to-en | en-to-ar
  OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY
                               Keys for --provider other than groq
"#;

/// Translate a Word document between Arabic and English.
#[derive(Parser, Debug)]
#[command(
    name = "docx-translate",
    version,
    about = "Translate .docx files between Arabic and English using LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input .docx file.
    input: PathBuf,

    /// Output file. Default: translated_<input name> beside the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Translation direction.
    #[arg(long, env = "DOCX_TRANSLATE_DIRECTION", value_enum, default_value = "ar-to-en")]
    direction: Direction,

    /// Path to config.toml.
    #[arg(long, env = "DOCX_TRANSLATE_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Groq API key.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Backend: groq, or any edgequake-llm provider (openai, anthropic, gemini, ollama…).
    #[arg(long, env = "DOCX_TRANSLATE_PROVIDER")]
    provider: Option<String>,

    /// Model ID.
    #[arg(long, env = "DOCX_TRANSLATE_MODEL")]
    model: Option<String>,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn TranslationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let client = build_client(&config).context("Failed to set up translation client")?;

    // ── Run translation ──────────────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));
    let stats = translate_file(
        &cli.input,
        &output_path,
        cli.direction,
        client.as_ref(),
        config.progress_callback.as_ref(),
    )
    .await
    .with_context(|| format!("Translation of {} failed", cli.input.display()))?;

    if !cli.quiet {
        eprintln!(
            "   {} paragraphs, {} skipped  —  {}ms total",
            dim(&stats.translated_paragraphs.to_string()),
            dim(&stats.skipped_paragraphs.to_string()),
            stats.total_duration_ms,
        );
    }
    println!(
        "✅ Full-document translation saved as: {}",
        output_path.display()
    );

    Ok(())
}

/// Map `config.toml` plus CLI flags to a `TranslatorConfig`.
///
/// An unreadable config file is not fatal here: the key may come from
/// `--api-key`/`GROQ_API_KEY`, or a non-Groq provider may not need it.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslatorConfig> {
    let file = match FileConfig::load(&cli.config) {
        Ok(file) => file,
        Err(e) => {
            warn!("{}", e);
            FileConfig::default()
        }
    };

    let mut builder = TranslatorConfig::builder_from_file(&file);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}
