//! Error types for the edgequake-doc2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2MdError`] — **Fatal**: the batch cannot be set up or its results
//!   cannot be delivered (unreadable input file, invalid configuration, export
//!   write failure). Returned as `Err(Doc2MdError)` from the helpers that sit
//!   around the batch, never from [`crate::batch::process_batch`] itself.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document could not be staged
//!   or converted, but every other document in the batch is unaffected. Stored
//!   inside [`crate::output::ConversionOutcome`] so callers always receive one
//!   outcome per submitted document.
//!
//! The extraction engine has its own error type, [`EngineError`]; the
//! conversion adapter folds it into [`DocumentError::Conversion`] and keeps the
//! engine's message as diagnostic detail.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2md library.
///
/// Per-document failures use [`DocumentError`] and are stored in
/// [`crate::output::ConversionOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Doc2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Input file exists but could not be read.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an export artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Stored in [`crate::output::ConversionOutcome::error`] when the document
/// fails. The batch always continues with the next document.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentError {
    /// The document bytes could not be written to a staging file.
    #[error("{name}: staging failed: {detail}")]
    Staging { name: String, detail: String },

    /// The extraction engine rejected the document, panicked or timed out.
    #[error("{name}: conversion failed: {detail}")]
    Conversion { name: String, detail: String },
}

impl DocumentError {
    /// Technical detail for diagnostic display, without the document name.
    pub fn detail(&self) -> &str {
        match self {
            DocumentError::Staging { detail, .. } | DocumentError::Conversion { detail, .. } => {
                detail
            }
        }
    }

    /// Name of the document the error belongs to.
    pub fn document_name(&self) -> &str {
        match self {
            DocumentError::Staging { name, .. } | DocumentError::Conversion { name, .. } => name,
        }
    }
}

/// Errors raised by an [`crate::engine::ExtractionEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine program could not be started (not installed, not executable).
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but reported a failure.
    #[error("'{program}' exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// I/O error while talking to the engine.
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Free-form failure reported by an in-process engine.
    #[error("{0}")]
    Message(String),
}

impl EngineError {
    /// Build a free-form engine error.
    pub fn message(msg: impl Into<String>) -> Self {
        EngineError::Message(msg.into())
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
