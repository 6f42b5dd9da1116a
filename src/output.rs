//! Data types flowing into and out of a batch run.

use crate::error::{Doc2MdError, DocumentError};
use crate::pipeline::metrics;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One document submitted for conversion.
///
/// `name` must include the extension: the extraction engine dispatches on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SubmittedDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file into a document named after the file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Doc2MdError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Doc2MdError::InputNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Doc2MdError::InputReadFailed {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }

    /// Size of the original document in bytes.
    pub fn original_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Whether a document converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Result for a single document.
///
/// On success `text_content`, `converted_size` and `converted_size_label` are
/// set and `error` is `None`; on failure it is the other way round.
/// `size_delta_percent` is additionally `None` for zero-byte sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub document_name: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DocumentError>,
    pub original_size: u64,
    pub original_size_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_size_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_delta_percent: Option<f64>,
    pub duration_ms: u64,
}

impl ConversionOutcome {
    /// Successful conversion of a document of `original_size` bytes.
    pub fn success(
        document_name: impl Into<String>,
        original_size: u64,
        text: String,
        duration_ms: u64,
    ) -> Self {
        let converted_size = text.len() as u64;
        Self {
            document_name: document_name.into(),
            status: OutcomeStatus::Success,
            text_content: Some(text),
            error: None,
            original_size,
            original_size_label: metrics::size_label(original_size),
            converted_size: Some(converted_size),
            converted_size_label: Some(metrics::size_label(converted_size)),
            size_delta_percent: metrics::delta_percent(original_size, converted_size),
            duration_ms,
        }
    }

    /// Failed conversion.
    pub fn failure(original_size: u64, error: DocumentError, duration_ms: u64) -> Self {
        Self {
            document_name: error.document_name().to_string(),
            status: OutcomeStatus::Failure,
            text_content: None,
            error: Some(error),
            original_size,
            original_size_label: metrics::size_label(original_size),
            converted_size: None,
            converted_size_label: None,
            size_delta_percent: None,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Technical failure detail, for diagnostics.
    pub fn error_detail(&self) -> Option<&str> {
        self.error.as_ref().map(DocumentError::detail)
    }

    /// Short, non-technical message to show for a failed document.
    pub fn user_message(&self) -> Option<String> {
        self.error.as_ref().map(|_| {
            format!(
                "Could not read {}. Please check the format.",
                self.document_name
            )
        })
    }
}

/// Aggregate counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_original_bytes: u64,
    /// Sum of `converted_size` over successful documents.
    pub total_converted_bytes: u64,
    pub total_duration_ms: u64,
}

impl BatchStats {
    pub(crate) fn from_outcomes(outcomes: &[ConversionOutcome], total_duration_ms: u64) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total_documents: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            total_original_bytes: outcomes.iter().map(|o| o.original_size).sum(),
            total_converted_bytes: outcomes.iter().filter_map(|o| o.converted_size).sum(),
            total_duration_ms,
        }
    }
}

/// Everything a batch run produces: one outcome per input, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutput {
    pub outcomes: Vec<ConversionOutcome>,
    pub stats: BatchStats,
}

impl BatchOutput {
    pub fn successes(&self) -> impl Iterator<Item = &ConversionOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_fills_metrics() {
        let o = ConversionOutcome::success("a.docx", 1000, "x".repeat(400), 5);
        assert!(o.is_success());
        assert_eq!(o.converted_size, Some(400));
        assert_eq!(o.size_delta_percent, Some(60.0));
        assert_eq!(o.original_size_label, "1000 B");
        assert_eq!(o.converted_size_label.as_deref(), Some("400 B"));
        assert!(o.error.is_none());
        assert!(o.user_message().is_none());
    }

    #[test]
    fn success_of_empty_source_has_no_delta() {
        let o = ConversionOutcome::success("empty.html", 0, String::new(), 1);
        assert!(o.is_success());
        assert_eq!(o.converted_size, Some(0));
        assert_eq!(o.size_delta_percent, None);
    }

    #[test]
    fn failure_has_detail_and_user_message() {
        let err = DocumentError::Conversion {
            name: "bad.pdf".into(),
            detail: "xref table broken".into(),
        };
        let o = ConversionOutcome::failure(2048, err, 3);
        assert!(!o.is_success());
        assert_eq!(o.document_name, "bad.pdf");
        assert!(o.text_content.is_none());
        assert!(o.converted_size.is_none());
        assert_eq!(o.error_detail(), Some("xref table broken"));
        assert_eq!(
            o.user_message().as_deref(),
            Some("Could not read bad.pdf. Please check the format.")
        );
    }

    #[test]
    fn stats_sum_successes_only() {
        let outcomes = vec![
            ConversionOutcome::success("a.docx", 100, "abc".into(), 1),
            ConversionOutcome::failure(
                50,
                DocumentError::Staging {
                    name: "b.pdf".into(),
                    detail: "disk full".into(),
                },
                1,
            ),
        ];
        let stats = BatchStats::from_outcomes(&outcomes, 7);
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total_original_bytes, 150);
        assert_eq!(stats.total_converted_bytes, 3);
        assert_eq!(stats.total_duration_ms, 7);
    }

    #[test]
    fn failure_json_omits_text() {
        let o = ConversionOutcome::failure(
            1,
            DocumentError::Conversion {
                name: "x.zip".into(),
                detail: "boom".into(),
            },
            0,
        );
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"], "failure");
        assert!(json.get("text_content").is_none());
        assert_eq!(json["error"]["detail"], "boom");
    }

    #[test]
    fn from_path_missing_file() {
        let err = SubmittedDocument::from_path("/definitely/not/here.docx").unwrap_err();
        assert!(matches!(err, Doc2MdError::InputNotFound { .. }));
    }

    #[test]
    fn from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minutes.html");
        std::fs::write(&path, b"<h1>Minutes</h1>").unwrap();

        let doc = SubmittedDocument::from_path(&path).unwrap();
        assert_eq!(doc.name, "minutes.html");
        assert_eq!(doc.original_size(), 16);
    }
}
