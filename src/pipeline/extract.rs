//! Conversion adapter: run the extraction engine on a staged file.
//!
//! This is the only place the pipeline talks to the engine, and it never lets
//! an engine fault escape. Engine errors, panics and (optional) timeouts all
//! come back as [`DocumentError::Conversion`] with the engine's own message
//! kept as the detail, so one bad document fails alone.

use crate::engine::ExtractionEngine;
use crate::error::DocumentError;
use crate::pipeline::stage::StagedResource;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::debug;

/// Extract the text of a staged document.
///
/// With `timeout = None` the call waits as long as the engine takes.
pub async fn convert(
    engine: &dyn ExtractionEngine,
    resource: &StagedResource,
    timeout: Option<Duration>,
) -> Result<String, DocumentError> {
    let name = resource.document_name();
    debug!("Converting {} with {}", name, engine.name());

    let call = AssertUnwindSafe(engine.convert(resource.path())).catch_unwind();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => {
                return Err(conversion_error(
                    name,
                    format!("extraction timed out after {}s", limit.as_secs()),
                ))
            }
        },
        None => call.await,
    };

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(conversion_error(name, e.to_string())),
        Err(payload) => Err(conversion_error(
            name,
            format!("engine panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

fn conversion_error(name: &str, detail: String) -> DocumentError {
    DocumentError::Conversion {
        name: name.to_string(),
        detail,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::pipeline::stage::stage;
    use async_trait::async_trait;
    use std::path::Path;

    struct Echo;

    #[async_trait]
    impl ExtractionEngine for Echo {
        async fn convert(&self, path: &Path) -> Result<String, EngineError> {
            Ok(std::fs::read_to_string(path)?)
        }
    }

    struct Reject;

    #[async_trait]
    impl ExtractionEngine for Reject {
        async fn convert(&self, _path: &Path) -> Result<String, EngineError> {
            Err(EngineError::message("File is not a zip file"))
        }
    }

    struct Explode;

    #[async_trait]
    impl ExtractionEngine for Explode {
        async fn convert(&self, _path: &Path) -> Result<String, EngineError> {
            panic!("parser state corrupted");
        }
    }

    struct Sleepy;

    #[async_trait]
    impl ExtractionEngine for Sleepy {
        async fn convert(&self, _path: &Path) -> Result<String, EngineError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(String::new())
        }
    }

    fn staged(dir: &Path) -> StagedResource {
        stage("doc.html", b"<h1>Title</h1>", Some(dir), "doc2md-").unwrap()
    }

    #[tokio::test]
    async fn success_passes_text_through() {
        let dir = tempfile::tempdir().unwrap();
        let res = staged(dir.path());
        assert_eq!(convert(&Echo, &res, None).await.unwrap(), "<h1>Title</h1>");
    }

    #[tokio::test]
    async fn engine_error_keeps_message() {
        let dir = tempfile::tempdir().unwrap();
        let res = staged(dir.path());
        let err = convert(&Reject, &res, None).await.unwrap_err();
        assert_eq!(
            err,
            DocumentError::Conversion {
                name: "doc.html".into(),
                detail: "File is not a zip file".into(),
            }
        );
    }

    #[tokio::test]
    async fn panic_becomes_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = staged(dir.path());
        let err = convert(&Explode, &res, None).await.unwrap_err();
        assert!(err.detail().contains("parser state corrupted"), "got {err}");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = staged(dir.path());
        let err = convert(&Sleepy, &res, Some(Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert_eq!(err.detail(), "extraction timed out after 2s");
    }
}
