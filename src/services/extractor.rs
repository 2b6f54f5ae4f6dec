use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::Extractor;
use crate::error::CollaboratorFailure;
use crate::models::Document;

const COLLABORATOR: &str = "pdftotext";

/// Extracts text by running poppler's `pdftotext` on the document.
pub struct PdfTextExtractor {
    binary: String,
    timeout: Duration,
}

impl PdfTextExtractor {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Extractor for PdfTextExtractor {
    async fn extract(&self, document: &Document) -> Result<String, CollaboratorFailure> {
        let mut command = Command::new(&self.binary);
        command
            .arg("-enc")
            .arg("UTF-8")
            .arg(&document.path)
            .arg("-")
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CollaboratorFailure::Timeout {
                collaborator: COLLABORATOR,
                after: self.timeout,
            })?
            .map_err(|e| {
                CollaboratorFailure::Extraction(format!("failed to run {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorFailure::Extraction(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);

        // Clean up the text - drop blank lines and trailing whitespace
        let cleaned = text
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if cleaned.is_empty() {
            tracing::debug!("No text extracted from {}", document.name);
            return Err(CollaboratorFailure::Extraction(
                "document contains no extractable text".to_string(),
            ));
        }

        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn document() -> Document {
        Document {
            name: "missing.pdf".to_string(),
            content_type: crate::models::PDF_CONTENT_TYPE.to_string(),
            size: 10,
            path: PathBuf::from("/nonexistent/missing.pdf"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_extraction_failure() {
        let extractor = PdfTextExtractor::new(
            "definitely-not-a-real-pdftotext-binary",
            Duration::from_secs(5),
        );
        let result = extractor.extract(&document()).await;
        assert!(matches!(result, Err(CollaboratorFailure::Extraction(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_extraction_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("slow-pdftotext");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let timeout = Duration::from_millis(200);
        let extractor = PdfTextExtractor::new(script.to_string_lossy(), timeout);
        let result = extractor.extract(&document()).await;

        assert_eq!(
            result,
            Err(CollaboratorFailure::Timeout {
                collaborator: COLLABORATOR,
                after: timeout,
            })
        );
    }
}
