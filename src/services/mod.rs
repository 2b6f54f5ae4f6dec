mod extractor;

use async_trait::async_trait;

use crate::error::CollaboratorFailure;
use crate::models::Document;

pub use extractor::PdfTextExtractor;

/// Pulls plain text out of a selected document.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, document: &Document) -> Result<String, CollaboratorFailure>;
}
