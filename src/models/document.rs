use std::path::{Path, PathBuf};

use crate::error::{Result, ValidationFailure};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// A user-selected file awaiting extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub path: PathBuf,
}

impl Document {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            content_type: content_type_for(path).to_string(),
            name,
            size: metadata.len(),
            path: path.to_path_buf(),
        })
    }

    /// Check type and size against the upload rules.
    pub fn validate(&self, max_bytes: u64) -> std::result::Result<(), ValidationFailure> {
        if self.content_type != PDF_CONTENT_TYPE {
            return Err(ValidationFailure::UnsupportedType {
                found: self.content_type.clone(),
                expected: PDF_CONTENT_TYPE,
            });
        }
        if self.size == 0 {
            return Err(ValidationFailure::EmptyDocument);
        }
        if self.size > max_bytes {
            return Err(ValidationFailure::TooLarge {
                size: self.size,
                limit: max_bytes,
            });
        }
        Ok(())
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => PDF_CONTENT_TYPE,
        Some("txt") => "text/plain",
        Some("html") | Some("htm") => "text/html",
        Some("epub") => "application/epub+zip",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn doc(content_type: &str, size: u64) -> Document {
        Document {
            name: "book.pdf".to_string(),
            content_type: content_type.to_string(),
            size,
            path: PathBuf::from("book.pdf"),
        }
    }

    #[test]
    fn test_accepts_pdf_within_limit() {
        assert!(doc(PDF_CONTENT_TYPE, 1024).validate(DEFAULT_MAX_UPLOAD_BYTES).is_ok());
        assert!(doc(PDF_CONTENT_TYPE, DEFAULT_MAX_UPLOAD_BYTES)
            .validate(DEFAULT_MAX_UPLOAD_BYTES)
            .is_ok());
    }

    #[test]
    fn test_rejects_wrong_type_and_oversize() {
        assert!(matches!(
            doc("text/plain", 10).validate(DEFAULT_MAX_UPLOAD_BYTES),
            Err(ValidationFailure::UnsupportedType { .. })
        ));
        assert_eq!(
            doc(PDF_CONTENT_TYPE, DEFAULT_MAX_UPLOAD_BYTES + 1).validate(DEFAULT_MAX_UPLOAD_BYTES),
            Err(ValidationFailure::TooLarge {
                size: DEFAULT_MAX_UPLOAD_BYTES + 1,
                limit: DEFAULT_MAX_UPLOAD_BYTES,
            })
        );
        assert_eq!(
            doc(PDF_CONTENT_TYPE, 0).validate(DEFAULT_MAX_UPLOAD_BYTES),
            Err(ValidationFailure::EmptyDocument)
        );
    }

    #[test]
    fn test_from_path_reads_size_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Paper.PDF");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4 fake").unwrap();

        let document = Document::from_path(&path).unwrap();
        assert_eq!(document.name, "Paper.PDF");
        assert_eq!(document.content_type, PDF_CONTENT_TYPE);
        assert_eq!(document.size, 13);
    }
}
