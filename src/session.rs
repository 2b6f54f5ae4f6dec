//! Upload-to-summary lifecycle for a single document.
//!
//! ```text
//! Idle -> DocumentSelected -> TextExtracted -> Summarizing -> Summarized
//!               |                  |               |
//!               +------------------+---------------+--> Error
//! ```
//!
//! Collaborator calls happen outside the machine. Each call is issued with a
//! [`Ticket`] and its result is handed back with that ticket; results whose
//! ticket predates the latest `select_document`, `request_summary` or `reset`
//! are discarded.

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::{AppError, CollaboratorFailure, Result};
use crate::ledger::HistoryLedger;
use crate::models::{Document, HistoryItem, SummaryOptions};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    DocumentSelected,
    TextExtracted,
    Summarizing,
    Summarized,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::DocumentSelected => "document selected",
            Phase::TextExtracted => "text extracted",
            Phase::Summarizing => "summarizing",
            Phase::Summarized => "summarized",
            Phase::Error => "in error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the request a collaborator result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub selected_document: Option<Document>,
    pub extracted_text: Option<String>,
    pub options: SummaryOptions,
    pub summary: Option<String>,
    pub phase: Phase,
    /// Most recent failure, cleared by the next successful transition.
    pub last_error: Option<CollaboratorFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged { from: Phase, to: Phase },
    Rejected { action: &'static str, reason: String },
    HistoryAppended { id: String },
    PersistFailed { reason: String },
}

/// Everything the host needs to run the summarizer for an accepted request.
#[derive(Debug, Clone)]
pub struct SummaryJob {
    pub ticket: Ticket,
    pub text: String,
    pub options: SummaryOptions,
}

pub struct SessionStateMachine {
    state: SessionState,
    epoch: u64,
    ledger: Arc<HistoryLedger>,
    max_upload_bytes: u64,
    preview_chars: usize,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStateMachine {
    pub fn new(ledger: Arc<HistoryLedger>, max_upload_bytes: u64, preview_chars: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: SessionState::default(),
            epoch: 0,
            ledger,
            max_upload_bytes,
            preview_chars,
            events,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Accept a new document. Allowed from `Idle`, `Summarized` and `Error`.
    ///
    /// A document that fails validation leaves the phase untouched.
    pub fn select_document(&mut self, document: Document) -> Result<Ticket> {
        const ACTION: &str = "select a document";

        if !matches!(
            self.state.phase,
            Phase::Idle | Phase::Summarized | Phase::Error
        ) {
            return Err(self.reject_transition(ACTION));
        }
        if let Err(failure) = document.validate(self.max_upload_bytes) {
            self.emit(SessionEvent::Rejected {
                action: ACTION,
                reason: failure.to_string(),
            });
            return Err(failure.into());
        }

        tracing::debug!("Selected document {} ({} bytes)", document.name, document.size);
        self.state.selected_document = Some(document);
        self.state.extracted_text = None;
        self.state.summary = None;
        self.state.last_error = None;
        let ticket = self.next_ticket();
        self.transition(Phase::DocumentSelected);
        Ok(ticket)
    }

    /// Record extracted text. Returns `false` when the result is stale.
    pub fn extract_complete(&mut self, ticket: Ticket, text: String) -> bool {
        if !self.accepts(ticket, Phase::DocumentSelected, "extraction result") {
            return false;
        }
        self.state.extracted_text = Some(text);
        self.transition(Phase::TextExtracted);
        true
    }

    /// Record an extraction failure. The selected document is kept so the
    /// host can retry or the user can pick another file.
    pub fn extract_failed(&mut self, ticket: Ticket, failure: CollaboratorFailure) -> bool {
        if !self.accepts(ticket, Phase::DocumentSelected, "extraction failure") {
            return false;
        }
        tracing::error!("Failed to extract text: {}", failure);
        self.state.last_error = Some(failure);
        self.transition(Phase::Error);
        true
    }

    /// Start a summary of the extracted text.
    ///
    /// Requires extracted text; permitted from `TextExtracted`, and from
    /// `Summarized` or `Error` to regenerate or retry. Rejected while a
    /// summary is already in flight.
    pub fn request_summary(&mut self, options: SummaryOptions) -> Result<SummaryJob> {
        const ACTION: &str = "request a summary";

        if self.state.phase == Phase::Summarizing {
            self.emit(SessionEvent::Rejected {
                action: ACTION,
                reason: AppError::Busy.to_string(),
            });
            return Err(AppError::Busy);
        }
        let text = match (&self.state.extracted_text, self.state.phase) {
            (Some(text), Phase::TextExtracted | Phase::Summarized | Phase::Error) => text.clone(),
            _ => return Err(self.reject_transition(ACTION)),
        };

        self.state.options = options;
        self.state.summary = None;
        self.state.last_error = None;
        let ticket = self.next_ticket();
        self.transition(Phase::Summarizing);
        Ok(SummaryJob {
            ticket,
            text,
            options,
        })
    }

    /// Record a finished summary and append it to the ledger.
    ///
    /// Returns `Ok(None)` for a stale ticket. If the ledger accepts the item
    /// but cannot persist it, the session still moves to `Summarized` and the
    /// store error is returned.
    pub async fn summary_complete(
        &mut self,
        ticket: Ticket,
        text: String,
    ) -> Result<Option<HistoryItem>> {
        if !self.accepts(ticket, Phase::Summarizing, "summary") {
            return Ok(None);
        }

        let document_name = self
            .state
            .selected_document
            .as_ref()
            .map(|d| d.name.as_str())
            .unwrap_or_default();
        let item = HistoryItem::new(
            document_name,
            self.state.options,
            text.clone(),
            self.preview_chars,
        );

        self.state.summary = Some(text);
        self.transition(Phase::Summarized);

        let appended = self.ledger.append(item.clone()).await;
        match appended {
            Ok(()) => {
                tracing::info!("Saved summary of '{}' to history", item.title);
                self.emit(SessionEvent::HistoryAppended {
                    id: item.id.clone(),
                });
                Ok(Some(item))
            }
            Err(AppError::Store(failure)) => {
                self.emit(SessionEvent::HistoryAppended {
                    id: item.id.clone(),
                });
                self.emit(SessionEvent::PersistFailed {
                    reason: failure.to_string(),
                });
                Err(AppError::Store(failure))
            }
            Err(e) => Err(e),
        }
    }

    /// Record a failed summary. Extracted text is kept for a retry.
    pub fn summary_failed(&mut self, ticket: Ticket, cause: CollaboratorFailure) -> bool {
        if !self.accepts(ticket, Phase::Summarizing, "summary failure") {
            return false;
        }
        tracing::error!("Failed to generate summary: {}", cause);
        self.state.last_error = Some(cause);
        self.transition(Phase::Error);
        true
    }

    /// Back to `Idle` from anywhere. Pending results become stale.
    pub fn reset(&mut self) {
        self.next_ticket();
        let options = self.state.options;
        self.state = SessionState {
            options,
            phase: self.state.phase,
            ..SessionState::default()
        };
        self.transition(Phase::Idle);
    }

    fn next_ticket(&mut self) -> Ticket {
        self.epoch += 1;
        Ticket(self.epoch)
    }

    fn accepts(&self, ticket: Ticket, expected: Phase, what: &str) -> bool {
        if ticket.0 != self.epoch || self.state.phase != expected {
            tracing::debug!(
                "Discarding stale {} (ticket {}, current {}, phase {})",
                what,
                ticket.0,
                self.epoch,
                self.state.phase
            );
            return false;
        }
        true
    }

    fn transition(&mut self, to: Phase) {
        let from = self.state.phase;
        self.state.phase = to;
        if from != to {
            self.emit(SessionEvent::PhaseChanged { from, to });
        }
    }

    fn reject_transition(&self, action: &'static str) -> AppError {
        let error = AppError::InvalidTransition {
            action,
            phase: self.state.phase.as_str(),
        };
        self.emit(SessionEvent::Rejected {
            action,
            reason: error.to_string(),
        });
        error
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
