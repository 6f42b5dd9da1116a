//! Download artifacts derived from a successful conversion.
//!
//! Every converted document is offered twice: as `<base>_converted.md` and as
//! `<base>_converted.txt`. Both carry the same bytes; only the file name and
//! MIME type differ.

use crate::error::Doc2MdError;
use crate::output::ConversionOutcome;
use crate::pipeline::stage::document_suffix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Anything outside word characters, dot, dash and space becomes `_`.
static UNSAFE_FILE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w.\- ]").unwrap());

/// Appended to the document's base name.
pub const EXPORT_STEM_SUFFIX: &str = "_converted";

/// Export flavour of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Text,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Markdown, ExportFormat::Text];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Text => "text/plain",
        }
    }
}

/// One downloadable payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub format: ExportFormat,
    pub mime_type: String,
    pub content: String,
}

/// `<base>_converted` for a document name, safe to use as a file name.
///
/// The base is the last path component without its extension; a name that
/// is nothing but an extension (`.bashrc`) is kept whole.
pub fn export_stem(document_name: &str) -> String {
    let file_name = document_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(document_name);
    let suffix = document_suffix(file_name);
    let base = if suffix.is_empty() || suffix.len() == file_name.len() {
        file_name
    } else {
        &file_name[..file_name.len() - suffix.len()]
    };

    let base = UNSAFE_FILE_CHARS.replace_all(base.trim(), "_");
    let base = if base.is_empty() { "document" } else { base.as_ref() };
    format!("{base}{EXPORT_STEM_SUFFIX}")
}

/// Artifacts for a successful outcome; empty for a failed one.
pub fn artifacts(outcome: &ConversionOutcome, formats: &[ExportFormat]) -> Vec<ExportArtifact> {
    artifacts_with_stem(outcome, &export_stem(&outcome.document_name), formats)
}

/// Like [`artifacts`], with an explicit file stem.
pub fn artifacts_with_stem(
    outcome: &ConversionOutcome,
    stem: &str,
    formats: &[ExportFormat],
) -> Vec<ExportArtifact> {
    let Some(ref text) = outcome.text_content else {
        return Vec::new();
    };
    formats
        .iter()
        .map(|&format| ExportArtifact {
            file_name: format!("{stem}.{}", format.extension()),
            format,
            mime_type: format.mime_type().to_string(),
            content: text.clone(),
        })
        .collect()
}

/// Write artifacts into `dir`, creating it if needed.
///
/// Uses atomic write (temp file + rename) so a reader never sees a partial
/// file. Returns the written paths in artifact order.
pub async fn write_artifacts(
    artifacts: &[ExportArtifact],
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, Doc2MdError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Doc2MdError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.file_name);
        let tmp_path = dir.join(format!(".{}.tmp", artifact.file_name));
        let write_err = |e| Doc2MdError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        };

        tokio::fs::write(&tmp_path, artifact.content.as_bytes())
            .await
            .map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }

        debug!("Wrote {} ({})", path.display(), artifact.mime_type);
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;

    #[test]
    fn stem_strips_extension() {
        assert_eq!(export_stem("report.docx"), "report_converted");
        assert_eq!(export_stem("archive.tar.gz"), "archive.tar_converted");
        assert_eq!(export_stem("README"), "README_converted");
        assert_eq!(export_stem(".bashrc"), ".bashrc_converted");
    }

    #[test]
    fn stem_sanitises_unsafe_characters() {
        assert_eq!(export_stem("../../etc/passwd.html"), "passwd_converted");
        assert_eq!(export_stem("Q3: plan*final?.pptx"), "Q3_ plan_final__converted");
        assert_eq!(export_stem("Überblick.pdf"), "Überblick_converted");
        assert_eq!(export_stem(".pdf"), ".pdf_converted");
    }

    #[test]
    fn success_yields_identical_md_and_txt() {
        let o = ConversionOutcome::success("deck.pptx", 10, "# Slide 1\n".into(), 1);
        let arts = artifacts(&o, &ExportFormat::ALL);

        assert_eq!(arts.len(), 2);
        assert_eq!(arts[0].file_name, "deck_converted.md");
        assert_eq!(arts[0].mime_type, "text/markdown");
        assert_eq!(arts[1].file_name, "deck_converted.txt");
        assert_eq!(arts[1].mime_type, "text/plain");
        assert_eq!(arts[0].content, arts[1].content);
    }

    #[test]
    fn failure_yields_nothing() {
        let o = ConversionOutcome::failure(
            10,
            DocumentError::Conversion {
                name: "x.pdf".into(),
                detail: "bad".into(),
            },
            1,
        );
        assert!(artifacts(&o, &ExportFormat::ALL).is_empty());
    }

    #[tokio::test]
    async fn write_creates_dir_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("exports");
        let o = ConversionOutcome::success("sheet.xlsx", 10, "| a | b |\n".into(), 1);

        let paths = write_artifacts(&artifacts(&o, &[ExportFormat::Markdown]), &out_dir)
            .await
            .unwrap();

        assert_eq!(paths, vec![out_dir.join("sheet_converted.md")]);
        assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "| a | b |\n");
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
    }
}
