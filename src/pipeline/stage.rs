//! Staging: materialise a submitted document as a file the engine can open.
//!
//! Extraction engines take a path and pick their parser from its extension,
//! so each document is written to a uniquely named temp file that ends in the
//! document's own suffix. The random part of the name comes from `tempfile`,
//! which means two documents called `report.docx` never share a staging file.
//!
//! A [`StagedResource`] owns its file. [`StagedResource::release`] removes it
//! and may be called any number of times; dropping the resource removes the
//! file too, so an unwinding panic cannot leave it behind.

use crate::error::DocumentError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// A document's bytes written to a uniquely named staging file.
#[derive(Debug)]
pub struct StagedResource {
    name: String,
    path: PathBuf,
    temp: Option<TempPath>,
}

impl StagedResource {
    /// Path of the staging file. Only valid until [`release`](Self::release).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the document this file was staged for.
    pub fn document_name(&self) -> &str {
        &self.name
    }

    pub fn is_released(&self) -> bool {
        self.temp.is_none()
    }

    /// Remove the staging file.
    ///
    /// A no-op when the file was already released or has disappeared from
    /// disk. Any other removal failure is logged and swallowed.
    pub fn release(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };
        match temp.close() {
            Ok(()) => debug!("Released staging file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Staging file {} already gone", self.path.display())
            }
            Err(e) => warn!(
                "Could not remove staging file {} for {}: {}",
                self.path.display(),
                self.name,
                e
            ),
        }
    }
}

/// The document's extension including the leading dot, or `""`.
///
/// Only the last path component is considered, so `dir.v2/readme` has no
/// suffix rather than `.v2/readme`.
pub fn document_suffix(name: &str) -> &str {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(idx) => &file_name[idx..],
        None => "",
    }
}

/// Write `bytes` to a new staging file named `<prefix><random><suffix>`.
///
/// `dir` defaults to the system temp directory. On any I/O failure the
/// partially written file is removed and a [`DocumentError::Staging`] is
/// returned.
pub fn stage(
    name: &str,
    bytes: &[u8],
    dir: Option<&Path>,
    prefix: &str,
) -> Result<StagedResource, DocumentError> {
    let staging_err = |e: std::io::Error| DocumentError::Staging {
        name: name.to_string(),
        detail: e.to_string(),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(document_suffix(name));
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(staging_err)?;

    file.write_all(bytes).map_err(staging_err)?;
    file.flush().map_err(staging_err)?;

    // Closes the handle so the engine is the only one with the file open.
    let temp = file.into_temp_path();
    let path = temp.to_path_buf();
    debug!("Staged {} ({} bytes) at {}", name, bytes.len(), path.display());

    Ok(StagedResource {
        name: name.to_string(),
        path,
        temp: Some(temp),
    })
}
