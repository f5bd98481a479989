//! CLI binary for resume-feedback.
//!
//! A thin shim over the library crate that maps CLI flags to `ReviewConfig`,
//! runs submissions and prints stored reviews.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resume_feedback::record::{list_records, load_record, CategoryFeedback, TipKind};
use resume_feedback::store::FsRecordStore;
use resume_feedback::{
    load_document, ProgressCallback, ResumePipeline, ReviewConfig, Stage, SubmissionId,
    SubmissionOutcome, SubmissionProgressCallback, SubmissionRecord, SubmissionRequest,
};
use std::io;
use std::path::PathBuf;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner showing the current status, plus one log
/// line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    current: Mutex<Option<(String, Instant)>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Submitting");

        Arc::new(Self {
            bar,
            current: Mutex::new(None),
        })
    }

    /// Log the stage that just ended, if any.
    fn close_current(&self, ok: bool) {
        let previous = match self.current.lock() {
            Ok(mut current) => current.take(),
            Err(_) => None,
        };
        if let Some((text, started)) = previous {
            let mark = if ok { green("✓") } else { red("✗") };
            self.bar.println(format!(
                "  {} {:<28} {}",
                mark,
                text,
                dim(&format!("{:.1}s", started.elapsed().as_secs_f64())),
            ));
        }
    }
}

impl SubmissionProgressCallback for CliProgressCallback {
    fn on_processing_changed(&self, processing: bool) {
        if processing {
            self.bar.enable_steady_tick(Duration::from_millis(80));
        } else {
            self.bar.finish_and_clear();
        }
    }

    fn on_status(&self, stage: Stage, text: &str) {
        match stage {
            Stage::Succeeded => self.close_current(true),
            Stage::Failed => self.close_current(false),
            _ => {
                self.close_current(true);
                if let Ok(mut current) = self.current.lock() {
                    *current = Some((text.to_string(), Instant::now()));
                }
                self.bar.set_message(text.to_string());
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Review a résumé against a job posting
  resume-feedback submit cv.pdf --company Acme --job-title "Backend Engineer" \
      --job-description-file posting.txt

  # Review a résumé hosted online, print the stored record as JSON
  resume-feedback submit https://example.com/cv.pdf --json

  # Show a stored review
  resume-feedback show 1b4e28ba-2fa1-11d2-883f-0016d3cca427

  # List every stored submission
  resume-feedback list

STORAGE:
  Uploaded files:  <storage-dir>/files/<id>/<name>
  Records:         <storage-dir>/records/resume/<id>.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY            OpenAI API key
  ANTHROPIC_API_KEY         Anthropic API key
  GEMINI_API_KEY            Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER    Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL           Override model ID
  PDFIUM_LIB_PATH           Path to an existing libpdfium
  RESUME_FEEDBACK_STORAGE   Storage directory (default: ./resume-data)
"#;

/// Submit résumés for AI-generated ATS feedback.
#[derive(Parser, Debug)]
#[command(
    name = "resume-feedback",
    version,
    about = "Submit résumés for AI-generated ATS feedback",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Root directory of uploaded files and records.
    #[arg(long, global = true, env = "RESUME_FEEDBACK_STORAGE", default_value = "resume-data")]
    storage_dir: PathBuf,

    /// Print JSON instead of a human-readable summary.
    #[arg(long, global = true, env = "RESUME_FEEDBACK_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RESUME_FEEDBACK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "RESUME_FEEDBACK_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a résumé (local file or URL) and wait for the review.
    Submit(SubmitArgs),
    /// Print one stored submission.
    Show {
        /// Submission id.
        id: String,
    },
    /// List stored submissions.
    List,
}

#[derive(clap::Args, Debug)]
struct SubmitArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Company the résumé is submitted to.
    #[arg(long, default_value = "")]
    company: String,

    /// Title of the job applied for.
    #[arg(long, default_value = "")]
    job_title: String,

    /// Job description text.
    #[arg(long, default_value = "", conflicts_with = "job_description_file")]
    job_description: String,

    /// Read the job description from a file.
    #[arg(long)]
    job_description_file: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long)]
    provider: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Longest edge of the rendered preview in pixels.
    #[arg(long, env = "RESUME_FEEDBACK_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Max LLM output tokens.
    #[arg(long, env = "RESUME_FEEDBACK_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RESUME_FEEDBACK_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Analysis call timeout in seconds.
    #[arg(long, env = "RESUME_FEEDBACK_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RESUME_FEEDBACK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "RESUME_FEEDBACK_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers what INFO logs would say; keep them quiet while it runs.
    let show_progress = match cli.command {
        Command::Submit(ref args) => !cli.quiet && !args.no_progress && !cli.json,
        _ => false,
    };
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

    match cli.command {
        Command::Submit(ref args) => run_submit(&cli, args, show_progress).await,
        Command::Show { ref id } => run_show(&cli, id).await,
        Command::List => run_list(&cli).await,
    }
}

async fn run_submit(cli: &Cli, args: &SubmitArgs, show_progress: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SubmissionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, args, progress)?;

    let job_description = match args.job_description_file {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path))?,
        None => args.job_description.clone(),
    };

    let document = load_document(&args.input, config.download_timeout_secs)
        .await
        .context("Failed to load résumé")?;
    let pipeline = ResumePipeline::from_config(&config).context("Failed to set up pipeline")?;

    let request = SubmissionRequest::new(
        args.company.clone(),
        args.job_title.clone(),
        job_description,
        document,
    );

    match pipeline.submit(request).await {
        SubmissionOutcome::Succeeded(record) => {
            if !cli.quiet && !cli.json {
                eprintln!("{} {}", green("✔"), bold("Analysis complete"));
            }
            print_record(&record, cli.json)
        }
        SubmissionOutcome::Failed(failure) => {
            anyhow::bail!("{failure}")
        }
    }
}

async fn run_show(cli: &Cli, id: &str) -> Result<()> {
    let store = record_store(cli)?;
    let id: SubmissionId = id
        .parse()
        .with_context(|| format!("'{id}' is not a submission id"))?;
    let record = load_record(&store, &id)
        .await
        .context("Failed to read submission")?
        .with_context(|| format!("No submission with id {id}"))?;
    print_record(&record, cli.json)
}

async fn run_list(cli: &Cli) -> Result<()> {
    let store = record_store(cli)?;
    let records = list_records(&store).await.context("Failed to list submissions")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&records).context("Failed to serialise records")?;
        println!("{json}");
        return Ok(());
    }

    if records.is_empty() && !cli.quiet {
        eprintln!("{}", dim("No submissions yet."));
    }
    for record in &records {
        let score = record
            .resume_feedback()
            .map(|f| f.overall_score.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:>3}  {} @ {}",
            record.id,
            score,
            or_dash(&record.job_title),
            or_dash(&record.company_name)
        );
    }
    Ok(())
}

/// The record store under `--storage-dir`; reading needs no LLM provider.
fn record_store(cli: &Cli) -> Result<FsRecordStore> {
    let config = ReviewConfig::builder()
        .storage_dir(&cli.storage_dir)
        .build()
        .context("Invalid configuration")?;
    Ok(FsRecordStore::new(config.records_dir()))
}

/// Map CLI args to `ReviewConfig`.
fn build_config(cli: &Cli, args: &SubmitArgs, progress: Option<ProgressCallback>) -> Result<ReviewConfig> {
    let mut builder = ReviewConfig::builder()
        .storage_dir(&cli.storage_dir)
        .max_rendered_pixels(args.max_pixels)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .api_timeout_secs(args.api_timeout)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_record(record: &SubmissionRecord, json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(record).context("Failed to serialise record")?;
        println!("{json}");
        return Ok(());
    }

    println!("{} {}", bold("Submission"), record.id);
    println!("Company:      {}", or_dash(&record.company_name));
    println!("Job title:    {}", or_dash(&record.job_title));
    println!("Résumé:       {}", record.resume_path);
    println!("Preview:      {}", record.image_path);

    if !record.has_feedback() {
        println!("{}", dim("No feedback yet."));
        return Ok(());
    }

    match record.resume_feedback() {
        Some(feedback) => {
            println!();
            println!("{} {}/100", bold("Overall score:"), feedback.overall_score);
            for (name, category) in feedback.categories() {
                print_category(name, category);
            }
        }
        None => {
            // Valid JSON in an unexpected shape: show it as is.
            let raw = serde_json::to_string_pretty(&record.feedback)
                .context("Failed to serialise feedback")?;
            println!();
            println!("{raw}");
        }
    }
    Ok(())
}

fn print_category(name: &str, category: &CategoryFeedback) {
    println!();
    println!("{} {}", cyan(&format!("{name:<16}")), bold(&format!("{:>3}", category.score)));
    for tip in &category.tips {
        let mark = match tip.kind {
            TipKind::Good => green("+"),
            TipKind::Improve => red("-"),
        };
        println!("  {} {}", mark, tip.tip);
        if let Some(ref explanation) = tip.explanation {
            println!("    {}", dim(explanation));
        }
    }
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}
