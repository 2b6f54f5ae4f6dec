use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::{chat_prompt, summary_prompt, CHAT_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT};
use super::{Responder, Summarizer};
use crate::chat::ChatContext;
use crate::error::{CollaboratorFailure, Result};
use crate::models::{SummaryLength, SummaryOptions};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const COLLABORATOR: &str = "Claude API";

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: Option<String>,
}

/// Anthropic Messages API client used for both summaries and chat replies.
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    timeout: Duration,
    max_source_chars: usize,
}

impl ClaudeClient {
    pub fn new(
        api_key: String,
        model: String,
        timeout: Duration,
        max_source_chars: usize,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            timeout,
            max_source_chars,
        })
    }

    async fn complete(
        &self,
        system: &str,
        user_message: String,
        max_tokens: u32,
    ) -> std::result::Result<String, CollaboratorFailure> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: user_message,
            }],
            system: Some(system.to_string()),
        };

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.failure(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.map_err(|e| self.failure(e))?;
            return Err(CollaboratorFailure::Generation(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let message_response: MessageResponse =
            response.json().await.map_err(|e| self.failure(e))?;

        let text = message_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(CollaboratorFailure::Generation(
                "empty response from model".to_string(),
            ));
        }
        Ok(text)
    }

    fn failure(&self, error: reqwest::Error) -> CollaboratorFailure {
        if error.is_timeout() {
            CollaboratorFailure::Timeout {
                collaborator: COLLABORATOR,
                after: self.timeout,
            }
        } else {
            CollaboratorFailure::Generation(error.to_string())
        }
    }
}

fn max_tokens_for(length: SummaryLength) -> u32 {
    match length {
        SummaryLength::Short => 512,
        SummaryLength::Medium => 1024,
        SummaryLength::Long => 2048,
    }
}

#[async_trait]
impl Summarizer for ClaudeClient {
    async fn summarize(
        &self,
        text: &str,
        options: SummaryOptions,
    ) -> std::result::Result<String, CollaboratorFailure> {
        let prompt = summary_prompt(text, options, self.max_source_chars);
        self.complete(SUMMARY_SYSTEM_PROMPT, prompt, max_tokens_for(options.length))
            .await
    }
}

#[async_trait]
impl Responder for ClaudeClient {
    async fn respond(
        &self,
        context: &ChatContext,
        question: &str,
    ) -> std::result::Result<String, CollaboratorFailure> {
        self.complete(CHAT_SYSTEM_PROMPT, chat_prompt(context, question), 1024)
            .await
    }
}
