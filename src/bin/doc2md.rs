//! CLI binary for edgequake-doc2md.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`,
//! reads the input files and reports one line per document.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2md::export::{self, export_stem};
use edgequake_doc2md::{
    process_batch, BatchConfig, BatchOutput, BatchProgressCallback, CommandEngine,
    ConversionOutcome, ExportFormat, ProgressCallback, SubmittedDocument,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Extensions the upload filter accepts unless `--any-format` is given.
const SUPPORTED_EXTENSIONS: [&str; 6] = ["docx", "xlsx", "pptx", "pdf", "html", "zip"];

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

/// Terminal progress callback: a progress bar over documents plus one log
/// line per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    // Per-document lines come from the summary printed after the batch.
    fn on_document_complete(&self, _index: usize, _total: usize, _name: &str, _len: usize) {
        self.bar.inc(1);
    }

    fn on_document_error(&self, _index: usize, _total: usize, _name: &str, _error: &str) {
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one document, Markdown to stdout
  doc2md report.docx

  # Convert several documents, write .md and .txt exports
  doc2md report.docx budget.xlsx slides.pptx -o converted/

  # Markdown exports only
  doc2md --format md *.pdf -o converted/

  # Use a different extraction engine
  doc2md --engine pandoc --engine-arg=--to=markdown notes.html

  # JSON output (outcomes + stats)
  doc2md --json report.docx > report.json

ENVIRONMENT VARIABLES:
  DOC2MD_ENGINE           Extraction engine program (default: markitdown)
  DOC2MD_ENGINE_ARGS      Extra engine arguments, whitespace-separated
  DOC2MD_ENGINE_TIMEOUT   Per-document extraction timeout in seconds
  DOC2MD_STAGING_DIR      Directory for staging files (default: system temp)
  RUST_LOG                Override log filter (e.g. edgequake_doc2md=debug)

The engine is invoked as `<engine> <engine args...> <staged file>` and must
print the extracted text on stdout. Staging files keep the document's
extension so the engine can pick the right parser.
"#;

/// Convert Office, PDF and HTML documents to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "doc2md",
    version,
    about = "Convert Office, PDF and HTML documents to Markdown",
    long_about = "Convert a batch of documents (DOCX, XLSX, PPTX, PDF, HTML, ZIP) to clean \
Markdown through an external extraction engine. One bad document never stops the batch: \
each one is reported separately with its size reduction.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Documents to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write export files to this directory instead of printing to stdout.
    #[arg(short, long, env = "DOC2MD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Export formats written with --output-dir.
    #[arg(long, env = "DOC2MD_FORMAT", value_enum, default_value = "both")]
    format: FormatArg,

    /// Extraction engine program.
    #[arg(long, env = "DOC2MD_ENGINE", default_value = "markitdown")]
    engine: String,

    /// Extra argument passed to the engine before the file path (repeatable).
    #[arg(long = "engine-arg", env = "DOC2MD_ENGINE_ARGS", value_delimiter = ' ',
          allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Per-document extraction timeout in seconds (default: none).
    #[arg(long, env = "DOC2MD_ENGINE_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    engine_timeout: Option<u64>,

    /// Directory for staging files.
    #[arg(long, env = "DOC2MD_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Accept files outside the docx/xlsx/pptx/pdf/html/zip filter.
    #[arg(long, env = "DOC2MD_ANY_FORMAT")]
    any_format: bool,

    /// Output structured JSON (BatchOutput) instead of Markdown.
    #[arg(long, env = "DOC2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOC2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Md,
    Txt,
    Both,
}

impl FormatArg {
    fn formats(self) -> &'static [ExportFormat] {
        match self {
            FormatArg::Md => &[ExportFormat::Markdown],
            FormatArg::Txt => &[ExportFormat::Text],
            FormatArg::Both => &ExportFormat::ALL,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already tells the user what is happening; keep
    // library INFO lines out of its way unless -v was given.
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

    // ── Read inputs ──────────────────────────────────────────────────────
    let documents = read_inputs(&cli)?;
    if documents.is_empty() {
        anyhow::bail!("No supported documents to convert (use --any-format to accept any file)");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run batch ────────────────────────────────────────────────────────
    let output = process_batch(&documents, &config).await;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if let Some(ref dir) = cli.output_dir {
        write_exports(&output, dir, cli.format.formats()).await?;
    } else {
        print_texts(&output, &mut io::stdout().lock())?;
    }

    if !cli.json {
        for line in summary_lines(&output, cli.quiet) {
            eprintln!("{line}");
        }
    }

    if output.stats.succeeded == 0 {
        anyhow::bail!(
            "All {} documents failed to convert",
            output.stats.total_documents
        );
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let engine = CommandEngine::new(&cli.engine).args(cli.engine_args.iter().cloned());

    let mut builder = BatchConfig::builder().engine_command(engine);
    if let Some(secs) = cli.engine_timeout {
        builder = builder.engine_timeout_secs(secs);
    }
    if let Some(ref dir) = cli.staging_dir {
        builder = builder.staging_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Read every input file, skipping unsupported extensions unless allowed.
fn read_inputs(cli: &Cli) -> Result<Vec<SubmittedDocument>> {
    let mut documents = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        if !cli.any_format && !is_supported(path) {
            warn!("Skipping {}: unsupported file type", path.display());
            if !cli.quiet {
                eprintln!(
                    "{} Skipping {} (supported: {})",
                    cyan("⚠"),
                    path.display(),
                    SUPPORTED_EXTENSIONS.join(", ")
                );
            }
            continue;
        }
        let doc = SubmittedDocument::from_path(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        documents.push(doc);
    }
    Ok(documents)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Write export artifacts for every successful document.
///
/// Documents that share a name get `-2`, `-3`, … appended to their stem so
/// their exports do not overwrite each other.
async fn write_exports(output: &BatchOutput, dir: &Path, formats: &[ExportFormat]) -> Result<()> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for outcome in output.successes() {
        let stem = unique_stem(&mut seen, export_stem(&outcome.document_name));
        let artifacts = export::artifacts_with_stem(outcome, &stem, formats);
        let paths = export::write_artifacts(&artifacts, dir)
            .await
            .with_context(|| format!("Failed to write exports for {}", outcome.document_name))?;
        for path in paths {
            eprintln!("  {} {}", dim("→"), path.display());
        }
    }
    Ok(())
}

fn unique_stem(seen: &mut HashMap<String, usize>, stem: String) -> String {
    let count = seen.entry(stem.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        stem
    } else {
        format!("{stem}-{count}")
    }
}

/// Print each converted text to stdout, with a marker per document when
/// there is more than one.
fn print_texts(output: &BatchOutput, handle: &mut impl Write) -> Result<()> {
    let multiple = output.outcomes.len() > 1;

    for outcome in output.successes() {
        let text = outcome.text_content.as_deref().unwrap_or_default();
        if multiple {
            writeln!(handle, "<!-- {} -->\n", outcome.document_name)
                .context("Failed to write to stdout")?;
        }
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle
                .write_all(b"\n")
                .context("Failed to write to stdout")?;
        }
        if multiple {
            handle
                .write_all(b"\n")
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Per-document size readout and failure messages, printed on stderr.
///
/// In quiet mode only failed documents are listed: their message and detail
/// are never suppressed.
fn summary_lines(output: &BatchOutput, quiet: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in &output.outcomes {
        if quiet && outcome.is_success() {
            continue;
        }
        lines.push(summary_line(outcome));
        if let Some(detail) = outcome.error_detail() {
            lines.push(format!("     {}", dim(detail)));
        }
    }
    if quiet {
        return lines;
    }

    let stats = &output.stats;
    lines.push(format!(
        "{}  {}/{} documents  {}ms",
        if stats.failed == 0 {
            green("✔")
        } else if stats.succeeded == 0 {
            red("✘")
        } else {
            cyan("⚠")
        },
        bold(&stats.succeeded.to_string()),
        stats.total_documents,
        stats.total_duration_ms,
    ));
    lines
}

fn summary_line(outcome: &ConversionOutcome) -> String {
    if let Some(message) = outcome.user_message() {
        return format!("  {} {}", red("⚠"), message);
    }

    let delta = match outcome.size_delta_percent {
        Some(d) if d >= 0.0 => format!("{d:.1}% smaller"),
        Some(d) => format!("{:.1}% larger", -d),
        None => "empty source".to_string(),
    };
    format!(
        "  {} {}  {} → {}  ({})",
        green("✓"),
        bold(&outcome.document_name),
        outcome.original_size_label,
        outcome.converted_size_label.as_deref().unwrap_or("-"),
        delta,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported(Path::new("a/REPORT.DOCX")));
        assert!(is_supported(Path::new("page.html")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("Makefile")));
    }

    fn mixed_output() -> BatchOutput {
        use edgequake_doc2md::{BatchStats, DocumentError};

        BatchOutput {
            outcomes: vec![
                ConversionOutcome::success("good.html", 100, "# Good".into(), 1),
                ConversionOutcome::failure(
                    50,
                    DocumentError::Conversion {
                        name: "bad.html".into(),
                        detail: "'grep' exited with exit status: 1".into(),
                    },
                    1,
                ),
            ],
            stats: BatchStats {
                total_documents: 2,
                succeeded: 1,
                failed: 1,
                total_original_bytes: 150,
                total_converted_bytes: 6,
                total_duration_ms: 2,
            },
        }
    }

    #[test]
    fn quiet_summary_keeps_failures_only() {
        let lines = summary_lines(&mixed_output(), true);
        let text = lines.join("\n");

        assert_eq!(lines.len(), 2, "got: {lines:?}");
        assert!(text.contains("Could not read bad.html"), "got: {text}");
        assert!(text.contains("exit status: 1"), "got: {text}");
        assert!(!text.contains("good.html"), "got: {text}");
        assert!(!text.contains("documents"), "got: {text}");
    }

    #[test]
    fn full_summary_lists_every_document_once() {
        let lines = summary_lines(&mixed_output(), false);
        let text = lines.join("\n");

        assert_eq!(text.matches("good.html").count(), 1, "got: {text}");
        assert_eq!(text.matches("bad.html").count(), 1, "got: {text}");
        assert!(text.contains("1/2 documents"), "got: {text}");
    }

    /// Accepts `writes_left` writes, then fails like a closed pipe.
    struct ClosingPipe {
        writes_left: usize,
        written: Vec<u8>,
    }

    impl Write for ClosingPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.writes_left == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            self.writes_left -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn print_texts_writes_trailing_newline() {
        let output = BatchOutput {
            outcomes: vec![ConversionOutcome::success("good.html", 100, "# Good".into(), 1)],
            stats: Default::default(),
        };
        let mut pipe = ClosingPipe { writes_left: usize::MAX, written: Vec::new() };

        print_texts(&output, &mut pipe).unwrap();

        assert_eq!(pipe.written, b"# Good\n");
    }

    #[test]
    fn print_texts_reports_failed_newline_write() {
        let output = BatchOutput {
            outcomes: vec![ConversionOutcome::success("good.html", 100, "# Good".into(), 1)],
            stats: Default::default(),
        };
        // The text goes through; the trailing newline hits the closed pipe.
        let mut pipe = ClosingPipe { writes_left: 1, written: Vec::new() };

        let err = print_texts(&output, &mut pipe).unwrap_err();

        assert_eq!(pipe.written, b"# Good");
        assert!(err.to_string().contains("Failed to write to stdout"), "got: {err}");
    }

    #[test]
    fn duplicate_stems_get_numbered() {
        let mut seen = HashMap::new();
        assert_eq!(unique_stem(&mut seen, "a_converted".into()), "a_converted");
        assert_eq!(unique_stem(&mut seen, "a_converted".into()), "a_converted-2");
        assert_eq!(unique_stem(&mut seen, "b_converted".into()), "b_converted");
        assert_eq!(unique_stem(&mut seen, "a_converted".into()), "a_converted-3");
    }

    #[test]
    fn cli_parses_engine_args() {
        let cli = Cli::try_parse_from([
            "doc2md",
            "--engine",
            "pandoc",
            "--engine-arg=--to=markdown",
            "--format",
            "md",
            "a.docx",
            "b.pdf",
        ])
        .unwrap();
        assert_eq!(cli.engine, "pandoc");
        assert_eq!(cli.engine_args, ["--to=markdown"]);
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.format.formats(), [ExportFormat::Markdown]);
    }
}
