//! The extraction-engine seam.
//!
//! The batch pipeline never parses documents itself. It hands a staged file
//! path to an [`ExtractionEngine`] and receives the extracted text back. The
//! engine dispatches on the file extension, which is why the staging step
//! preserves it.
//!
//! [`CommandEngine`] is the default implementation: it runs an external
//! converter program (`markitdown` unless configured otherwise) with the staged
//! path as its last argument and treats standard output as the extracted text.
//! Library users can plug in any other engine through
//! [`crate::config::BatchConfigBuilder::engine`].

use crate::error::EngineError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Program used when neither the config nor the environment names one.
pub const DEFAULT_ENGINE_PROGRAM: &str = "markitdown";

/// Environment variable naming the engine program.
pub const ENGINE_ENV: &str = "DOC2MD_ENGINE";

/// Environment variable holding extra whitespace-separated engine arguments.
pub const ENGINE_ARGS_ENV: &str = "DOC2MD_ENGINE_ARGS";

/// Converts a document on disk into plain text / Markdown.
///
/// Implementations must be `Send + Sync` so a single engine can be shared via
/// `Arc` across batches. Errors are reported through [`EngineError`]; the
/// conversion adapter also catches panics, so an implementation that panics
/// only fails the current document.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Extract the textual content of the file at `path`.
    async fn convert(&self, path: &Path) -> Result<String, EngineError>;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "engine"
    }
}

/// Engine that shells out to an external converter program.
///
/// The command line is `<program> <args...> <path>`. Exit status 0 means
/// success and stdout is the text; any other status is an
/// [`EngineError::Failed`] carrying the trimmed stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument placed before the document path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the engine from `DOC2MD_ENGINE` / `DOC2MD_ENGINE_ARGS`,
    /// falling back to [`DEFAULT_ENGINE_PROGRAM`].
    pub fn from_env() -> Self {
        let program = std::env::var(ENGINE_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENGINE_PROGRAM.to_string());
        let args = std::env::var(ENGINE_ARGS_ENV).unwrap_or_default();
        Self::new(program.trim()).args(args.split_whitespace())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn extra_args(&self) -> &[String] {
        &self.args
    }
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE_PROGRAM)
    }
}

#[async_trait]
impl ExtractionEngine for CommandEngine {
    async fn convert(&self, path: &Path) -> Result<String, EngineError> {
        debug!("Running {} on {}", self.program, path.display());

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out conversion drops this future; take the child with it.
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EngineError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &str {
        &self.program
    }
}
