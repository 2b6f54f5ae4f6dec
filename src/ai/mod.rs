mod claude;
pub mod prompt;

use async_trait::async_trait;

use crate::chat::ChatContext;
use crate::error::CollaboratorFailure;
use crate::models::SummaryOptions;

pub use claude::{ClaudeClient, DEFAULT_MODEL};

/// Turns extracted document text into a summary shaped by `options`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        text: &str,
        options: SummaryOptions,
    ) -> Result<String, CollaboratorFailure>;
}

/// Answers a question about a single history item.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(
        &self,
        context: &ChatContext,
        question: &str,
    ) -> Result<String, CollaboratorFailure>;
}
