//! # edgequake-doc2md
//!
//! Batch-convert Office, PDF and HTML documents to Markdown / plain text
//! through an external extraction engine.
//!
//! ## What this crate does (and does not)
//!
//! Parsing DOCX, XLSX, PPTX, PDF or HTML is the engine's job. This crate is
//! the batch pipeline around it: it stages each submitted document as a temp
//! file that keeps its extension, runs the engine on it, turns every engine
//! fault into a per-document failure, measures how much smaller the text is
//! than the source, and removes the staging file whatever happened.
//!
//! ## Pipeline Overview
//!
//! ```text
//! [(name, bytes), …]
//!  │
//!  ├─ 1. Stage    unique temp file, original suffix kept
//!  ├─ 2. Extract  engine call; errors / panics / timeouts caught here
//!  ├─ 3. Metrics  "24.00 KB → 3.10 KB", 87.1 % smaller
//!  ├─ 4. Release  staging file removed on every path
//!  └─ 5. Outcome  one per document, in input order
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2md::{process_batch, BatchConfig, SubmittedDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Engine auto-detected from DOC2MD_ENGINE, defaulting to `markitdown`
//!     let config = BatchConfig::default();
//!     let docs = vec![SubmittedDocument::from_path("report.docx")?];
//!     let output = process_batch(&docs, &config).await;
//!     for outcome in &output.outcomes {
//!         match outcome.text_content {
//!             Some(ref text) => println!("{}", text),
//!             None => eprintln!("{}", outcome.user_message().unwrap_or_default()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2md` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{process_batch, process_batch_sync, process_files};
pub use config::{BatchConfig, BatchConfigBuilder};
pub use engine::{CommandEngine, ExtractionEngine};
pub use error::{Doc2MdError, DocumentError, EngineError};
pub use export::{ExportArtifact, ExportFormat};
pub use output::{BatchOutput, BatchStats, ConversionOutcome, OutcomeStatus, SubmittedDocument};
pub use pipeline::metrics::{delta_percent, size_label};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
