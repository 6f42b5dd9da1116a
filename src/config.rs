//! Configuration types for batch document conversion.
//!
//! All pipeline behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. Keeping every knob in one struct makes it easy to
//! share a config between the CLI and library callers and to log exactly what
//! a run was configured with.

use crate::engine::{CommandEngine, ExtractionEngine};
use crate::error::Doc2MdError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default prefix for staging file names.
pub const DEFAULT_STAGING_PREFIX: &str = "doc2md-";

/// Configuration for a batch conversion.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{BatchConfig, CommandEngine};
///
/// let config = BatchConfig::builder()
///     .engine_command(CommandEngine::new("markitdown"))
///     .engine_timeout_secs(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.engine_timeout_secs, Some(300));
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory that receives staging files. Default: the system temp dir.
    pub staging_dir: Option<PathBuf>,

    /// File-name prefix for staging files. Default: `doc2md-`.
    ///
    /// The rest of the name is random and the suffix is the document's own
    /// extension, so the prefix only helps when eyeballing a temp directory.
    pub staging_prefix: String,

    /// Pre-constructed extraction engine. Takes precedence over `engine_command`.
    pub engine: Option<Arc<dyn ExtractionEngine>>,

    /// External converter command. If None along with `engine`, uses
    /// [`CommandEngine::from_env()`].
    pub engine_command: Option<CommandEngine>,

    /// Per-document extraction timeout in seconds. Default: None (wait as long
    /// as the engine takes).
    pub engine_timeout_secs: Option<u64>,

    /// Receives per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            staging_dir: None,
            staging_prefix: DEFAULT_STAGING_PREFIX.to_string(),
            engine: None,
            engine_command: None,
            engine_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("staging_dir", &self.staging_dir)
            .field("staging_prefix", &self.staging_prefix)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("engine_command", &self.engine_command)
            .field("engine_timeout_secs", &self.engine_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Extraction timeout as a `Duration`, if one is configured.
    pub fn engine_timeout(&self) -> Option<Duration> {
        self.engine_timeout_secs.map(Duration::from_secs)
    }

    /// Resolve the extraction engine, from most-specific to least-specific:
    /// pre-built engine, configured command, then environment / default.
    pub fn resolve_engine(&self) -> Arc<dyn ExtractionEngine> {
        if let Some(ref engine) = self.engine {
            return Arc::clone(engine);
        }
        match self.engine_command {
            Some(ref cmd) => Arc::new(cmd.clone()),
            None => Arc::new(CommandEngine::from_env()),
        }
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl fmt::Debug for BatchConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl BatchConfigBuilder {
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(dir.into());
        self
    }

    pub fn staging_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.staging_prefix = prefix.into();
        self
    }

    pub fn engine(mut self, engine: Arc<dyn ExtractionEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn engine_command(mut self, command: CommandEngine) -> Self {
        self.config.engine_command = Some(command);
        self
    }

    pub fn engine_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine_timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, Doc2MdError> {
        let c = &self.config;
        if c.staging_prefix.contains(['/', '\\']) {
            return Err(Doc2MdError::InvalidConfig(format!(
                "staging prefix must not contain path separators, got '{}'",
                c.staging_prefix
            )));
        }
        if c.engine_timeout_secs == Some(0) {
            return Err(Doc2MdError::InvalidConfig(
                "engine timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref cmd) = c.engine_command {
            if cmd.program().trim().is_empty() {
                return Err(Doc2MdError::InvalidConfig(
                    "engine program must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
