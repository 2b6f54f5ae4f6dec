//! Conversation scoped to one history item.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::ai::prompt::bounded;
use crate::ai::Responder;
use crate::error::{AppError, CollaboratorFailure, Result, ValidationFailure};
use crate::models::{ChatMessage, HistoryItem, Sender, SummaryOptions};

pub const DEFAULT_CONTEXT_CHARS: usize = 12_000;
pub const ERROR_NOTICE: &str =
    "Sorry, I encountered an error while generating a response. Please try again.";

const EVENT_CAPACITY: usize = 64;

/// What the responder is allowed to see: one item, with its body bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatContext {
    pub title: String,
    pub body: String,
    pub options: SummaryOptions,
}

impl ChatContext {
    pub fn from_item(item: &HistoryItem, max_chars: usize) -> Self {
        Self {
            title: item.title.clone(),
            body: bounded(item.body(), max_chars).to_string(),
            options: item.options,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTicket(u64);

/// An accepted question waiting for the responder.
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub ticket: ChatTicket,
    pub context: ChatContext,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Bound { item_id: Option<String> },
    MessageAppended(ChatMessage),
}

pub struct ChatSession {
    bound: Option<HistoryItem>,
    messages: Vec<ChatMessage>,
    epoch: u64,
    in_flight: Option<ChatTicket>,
    context_chars: usize,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatSession {
    pub fn new(context_chars: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            bound: None,
            messages: Vec::new(),
            epoch: 0,
            in_flight: None,
            context_chars,
            events,
        }
    }

    pub fn bound_item(&self) -> Option<&HistoryItem> {
        self.bound.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Switch to `item`, or detach with `None`. Clears the transcript and
    /// drops any reply still in flight.
    pub fn bind(&mut self, item: Option<HistoryItem>) {
        self.epoch += 1;
        self.in_flight = None;
        self.messages.clear();
        self.bound = item;

        let item_id = self.bound.as_ref().map(|item| item.id.clone());
        let _ = self.events.send(ChatEvent::Bound { item_id });

        if let Some(item) = &self.bound {
            let intro = format!(
                "I'm your AI assistant for \"{}\". Ask me any questions about this document based on its summary! I'll answer based solely on the content that's been summarized.",
                item.title
            );
            self.push(ChatMessage::new(Sender::Assistant, intro));
        }
    }

    /// Accept a question: append it to the transcript and return what the
    /// responder needs. Rejected without touching the transcript when the
    /// text is blank, nothing is bound, or a reply is pending.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingReply> {
        let question = text.trim();
        if question.is_empty() {
            return Err(ValidationFailure::EmptyQuestion.into());
        }
        let Some(item) = &self.bound else {
            return Err(AppError::NotBound);
        };
        if self.in_flight.is_some() {
            return Err(AppError::Busy);
        }

        let context = ChatContext::from_item(item, self.context_chars);
        let ticket = ChatTicket(self.epoch);
        self.in_flight = Some(ticket);
        self.push(ChatMessage::new(Sender::User, question));

        Ok(PendingReply {
            ticket,
            context,
            question: question.to_string(),
        })
    }

    /// Apply the responder's result. Failures become a fixed notice in the
    /// transcript. Returns `false` if the reply belongs to an earlier binding.
    pub fn complete_send(
        &mut self,
        ticket: ChatTicket,
        result: std::result::Result<String, CollaboratorFailure>,
    ) -> bool {
        if self.in_flight != Some(ticket) {
            tracing::debug!("Discarding stale chat reply");
            return false;
        }
        self.in_flight = None;

        let content = match result {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Failed to generate chat response: {}", e);
                ERROR_NOTICE.to_string()
            }
        };
        self.push(ChatMessage::new(Sender::Assistant, content));
        true
    }

    /// Ask `responder` and wait for the answer. Returns `false` if the
    /// question was rejected.
    pub async fn send(&mut self, text: &str, responder: &dyn Responder) -> bool {
        let pending = match self.begin_send(text) {
            Ok(pending) => pending,
            Err(e) => {
                tracing::debug!("Chat message not sent: {}", e);
                return false;
            }
        };
        let result = responder.respond(&pending.context, &pending.question).await;
        self.complete_send(pending.ticket, result)
    }

    fn push(&mut self, message: ChatMessage) {
        let _ = self.events.send(ChatEvent::MessageAppended(message.clone()));
        self.messages.push(message);
    }
}
