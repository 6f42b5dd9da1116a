//! Batch orchestration: stage, convert and measure every submitted document.
//!
//! The batch is a fold over the documents. Each step of the fold runs one
//! document through [`stage`] → [`extract`] → [`metrics`], releases its staging
//! file and appends exactly one [`ConversionOutcome`]. Nothing is carried from
//! one document to the next, so a failure in document `i` cannot affect
//! document `i + 1`, and [`process_batch`] itself never fails.
//!
//! Documents are processed strictly one after another; the outcome order is
//! the input order.
//!
//! [`metrics`]: crate::pipeline::metrics

use crate::config::BatchConfig;
use crate::engine::ExtractionEngine;
use crate::error::Doc2MdError;
use crate::output::{BatchOutput, BatchStats, ConversionOutcome, SubmittedDocument};
use crate::pipeline::{extract, stage};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a batch of documents.
///
/// Returns one outcome per document, in input order. Staging and conversion
/// failures are recorded in the corresponding outcome; every staging file
/// created during the run has been removed by the time this returns.
pub async fn process_batch(documents: &[SubmittedDocument], config: &BatchConfig) -> BatchOutput {
    let total_start = Instant::now();
    let total = documents.len();
    info!("Starting batch: {} documents", total);

    let engine = config.resolve_engine();
    let engine = engine.as_ref();
    debug!("Using extraction engine: {}", engine.name());

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let outcomes = stream::iter(documents.iter().enumerate())
        .fold(
            Vec::with_capacity(total),
            |mut outcomes, (index, document)| async move {
                outcomes.push(process_document(engine, document, index, total, config).await);
                outcomes
            },
        )
        .await;

    let stats = BatchStats::from_outcomes(&outcomes, elapsed_ms(total_start));
    info!(
        "Batch complete: {}/{} documents converted, {}ms total",
        stats.succeeded, stats.total_documents, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.succeeded);
    }

    BatchOutput { outcomes, stats }
}

/// Read local files and convert them as one batch.
///
/// # Errors
/// Fails before any conversion starts if an input file cannot be read.
pub async fn process_files<P: AsRef<Path>>(
    paths: &[P],
    config: &BatchConfig,
) -> Result<BatchOutput, Doc2MdError> {
    let documents = paths
        .iter()
        .map(SubmittedDocument::from_path)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(process_batch(&documents, config).await)
}

/// Synchronous wrapper around [`process_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_batch_sync(
    documents: &[SubmittedDocument],
    config: &BatchConfig,
) -> Result<BatchOutput, Doc2MdError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Doc2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?;
    Ok(runtime.block_on(process_batch(documents, config)))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run one document through the pipeline. Always yields an outcome.
async fn process_document(
    engine: &dyn ExtractionEngine,
    document: &SubmittedDocument,
    index: usize,
    total: usize,
    config: &BatchConfig,
) -> ConversionOutcome {
    let start = Instant::now();
    let original_size = document.original_size();

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(index, total, &document.name);
    }

    let staged = stage::stage(
        &document.name,
        &document.bytes,
        config.staging_dir.as_deref(),
        &config.staging_prefix,
    );

    let outcome = match staged {
        Err(e) => ConversionOutcome::failure(original_size, e, elapsed_ms(start)),
        Ok(mut resource) => {
            let result = extract::convert(engine, &resource, config.engine_timeout()).await;
            resource.release();
            match result {
                Ok(text) => ConversionOutcome::success(
                    &document.name,
                    original_size,
                    text,
                    elapsed_ms(start),
                ),
                Err(e) => ConversionOutcome::failure(original_size, e, elapsed_ms(start)),
            }
        }
    };

    match outcome.error {
        None => {
            let converted = outcome.converted_size.unwrap_or(0);
            debug!(
                "{}: {} → {} in {}ms",
                document.name,
                outcome.original_size_label,
                outcome.converted_size_label.as_deref().unwrap_or("-"),
                outcome.duration_ms
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(index, total, &document.name, converted as usize);
            }
        }
        Some(ref e) => {
            warn!("Error processing {}: {}", document.name, e.detail());
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(index, total, &document.name, e.detail());
            }
        }
    }

    outcome
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Upper;

    #[async_trait]
    impl ExtractionEngine for Upper {
        async fn convert(&self, path: &Path) -> Result<String, EngineError> {
            Ok(std::fs::read_to_string(path)?.to_uppercase())
        }
    }

    fn config(dir: &Path) -> BatchConfig {
        BatchConfig::builder()
            .staging_dir(dir)
            .engine(Arc::new(Upper))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = process_batch(&[], &config(dir.path())).await;
        assert!(out.outcomes.is_empty());
        assert_eq!(out.stats.total_documents, 0);
    }

    #[tokio::test]
    async fn single_document_success() {
        let dir = tempfile::tempdir().unwrap();
        let docs = [SubmittedDocument::new("note.html", "hello")];
        let out = process_batch(&docs, &config(dir.path())).await;

        assert_eq!(out.outcomes.len(), 1);
        let o = &out.outcomes[0];
        assert!(o.is_success());
        assert_eq!(o.text_content.as_deref(), Some("HELLO"));
        assert_eq!(o.size_delta_percent, Some(0.0));
    }

    #[test]
    fn sync_wrapper_runs_batch() {
        let dir = tempfile::tempdir().unwrap();
        let docs = [SubmittedDocument::new("a.html", "x")];
        let out = process_batch_sync(&docs, &config(dir.path())).unwrap();
        assert_eq!(out.stats.succeeded, 1);
    }

    #[tokio::test]
    async fn process_files_reads_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.html");
        std::fs::write(&input, "memo").unwrap();
        let staging = tempfile::tempdir().unwrap();

        let out = process_files(&[&input], &config(staging.path())).await.unwrap();
        assert_eq!(out.outcomes[0].document_name, "memo.html");
        assert_eq!(out.outcomes[0].text_content.as_deref(), Some("MEMO"));
    }

    #[tokio::test]
    async fn process_files_fails_fast_on_missing_input() {
        let staging = tempfile::tempdir().unwrap();
        let err = process_files(&["/no/such/input.docx"], &config(staging.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2MdError::InputNotFound { .. }));
    }
}
