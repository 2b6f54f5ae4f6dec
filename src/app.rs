use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::ai::{ClaudeClient, Responder, Summarizer};
use crate::chat::{ChatSession, ChatTicket};
use crate::config::Config;
use crate::db::{DurableStore, SqliteStore};
use crate::error::{AppError, CollaboratorFailure, Result, StoreFailure};
use crate::ledger::HistoryLedger;
use crate::models::{Document, SummaryOptions};
use crate::services::{Extractor, PdfTextExtractor};
use crate::session::{Phase, SessionStateMachine, Ticket};
use crate::stats::{self, Statistics, TimeRange};

const NO_API_KEY: &str =
    "no Claude API key configured; set claude_api_key in the config file or ANTHROPIC_API_KEY";

// Message for a finished collaborator call
pub enum JobResult {
    Extraction {
        ticket: Ticket,
        result: std::result::Result<String, CollaboratorFailure>,
    },
    Summary {
        ticket: Ticket,
        result: std::result::Result<String, CollaboratorFailure>,
    },
    Reply {
        ticket: ChatTicket,
        result: std::result::Result<String, CollaboratorFailure>,
    },
}

/// External collaborators. Summarizer and responder are optional so the
/// history and statistics commands work without an API key.
pub struct Services {
    pub extractor: Arc<dyn Extractor>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub responder: Option<Arc<dyn Responder>>,
}

pub struct App {
    // Core state
    pub ledger: Arc<HistoryLedger>,
    pub session: SessionStateMachine,
    pub chat: ChatSession,
    pub options: SummaryOptions,
    /// Set when the stored history could not be read at startup.
    pub load_failure: Option<StoreFailure>,

    // Async state
    job_rx: mpsc::Receiver<JobResult>,
    job_tx: mpsc::Sender<JobResult>,

    // Services
    services: Services,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::new(&config.db_path));

        let extractor = Arc::new(PdfTextExtractor::new(
            config.pdftotext_path.clone(),
            config.request_timeout(),
        ));

        let claude = match config.api_key() {
            Some(key) => Some(Arc::new(ClaudeClient::new(
                key,
                config.model.clone(),
                config.request_timeout(),
                config.max_source_chars,
            )?)),
            None => None,
        };

        let services = Services {
            extractor,
            summarizer: claude.clone().map(|c| c as Arc<dyn Summarizer>),
            responder: claude.map(|c| c as Arc<dyn Responder>),
        };

        Ok(Self::with_services(config, store, services).await)
    }

    /// Build around explicit collaborators and hydrate the ledger.
    pub async fn with_services(
        config: &Config,
        store: Arc<dyn DurableStore>,
        services: Services,
    ) -> Self {
        let ledger = Arc::new(HistoryLedger::new(store));
        let load_failure = ledger.load_from_store().await.err();

        let session = SessionStateMachine::new(
            ledger.clone(),
            config.max_upload_bytes,
            config.preview_chars,
        );
        let chat = ChatSession::new(config.chat_context_chars);

        let (job_tx, job_rx) = mpsc::channel(8);

        Self {
            ledger,
            session,
            chat,
            options: config.default_options,
            load_failure,
            job_rx,
            job_tx,
            services,
        }
    }

    /// Whether a collaborator call issued by this app is still outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.session.phase(),
            Phase::DocumentSelected | Phase::Summarizing
        ) || self.chat.is_awaiting_reply()
    }

    pub fn select_document(&mut self, path: &Path) -> Result<()> {
        let document = Document::from_path(path)?;
        let ticket = self.session.select_document(document.clone())?;

        let extractor = Arc::clone(&self.services.extractor);
        let tx = self.job_tx.clone();
        tokio::spawn(async move {
            let result = extractor.extract(&document).await;
            let _ = tx.send(JobResult::Extraction { ticket, result }).await;
        });
        Ok(())
    }

    pub fn request_summary(&mut self, options: SummaryOptions) -> Result<()> {
        let Some(summarizer) = &self.services.summarizer else {
            return Err(AppError::Config(NO_API_KEY.to_string()));
        };
        let summarizer = Arc::clone(summarizer);

        let job = self.session.request_summary(options)?;
        self.options = options;

        let tx = self.job_tx.clone();
        tokio::spawn(async move {
            let result = summarizer.summarize(&job.text, job.options).await;
            let _ = tx
                .send(JobResult::Summary {
                    ticket: job.ticket,
                    result,
                })
                .await;
        });
        Ok(())
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Bind the chat to the history item with `id`, or detach it.
    pub fn bind_chat(&mut self, id: Option<&str>) -> Result<()> {
        let item = match id {
            Some(id) => Some(
                self.ledger
                    .get(id)
                    .ok_or_else(|| AppError::NotFound(id.to_string()))?,
            ),
            None => None,
        };
        self.chat.bind(item);
        Ok(())
    }

    pub fn ask(&mut self, question: &str) -> Result<()> {
        let Some(responder) = &self.services.responder else {
            return Err(AppError::Config(NO_API_KEY.to_string()));
        };
        let responder = Arc::clone(responder);

        let pending = self.chat.begin_send(question)?;

        let tx = self.job_tx.clone();
        tokio::spawn(async move {
            let result = responder
                .respond(&pending.context, &pending.question)
                .await;
            let _ = tx
                .send(JobResult::Reply {
                    ticket: pending.ticket,
                    result,
                })
                .await;
        });
        Ok(())
    }

    /// Remove a history item. A chat bound to it is detached.
    pub async fn delete_history_item(&mut self, id: &str) -> Result<bool> {
        let removed = self.ledger.remove(id).await?;
        if removed {
            tracing::info!("Deleted history item {}", id);
            if self.chat.bound_item().is_some_and(|item| item.id == id) {
                self.chat.bind(None);
            }
        }
        Ok(removed)
    }

    pub fn statistics(&self, time_range: TimeRange, use_synthetic: bool) -> Statistics {
        if use_synthetic {
            stats::compute(&[], time_range, true)
        } else {
            stats::compute(&self.ledger.list(), time_range, false)
        }
    }

    /// Poll for completed collaborator results (non-blocking)
    pub async fn poll_job_result(&mut self) -> Result<bool> {
        match self.job_rx.try_recv() {
            Ok(job) => {
                self.apply(job).await?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Wait for the next collaborator result and apply it.
    pub async fn wait_job_result(&mut self) -> Result<()> {
        if let Some(job) = self.job_rx.recv().await {
            self.apply(job).await?;
        }
        Ok(())
    }

    /// Apply results until nothing issued by this app is outstanding.
    pub async fn run_until_settled(&mut self) -> Result<()> {
        while self.is_busy() {
            self.wait_job_result().await?;
        }
        Ok(())
    }

    async fn apply(&mut self, job: JobResult) -> Result<()> {
        match job {
            JobResult::Extraction { ticket, result } => match result {
                Ok(text) => {
                    self.session.extract_complete(ticket, text);
                }
                Err(e) => {
                    self.session.extract_failed(ticket, e);
                }
            },
            JobResult::Summary { ticket, result } => match result {
                Ok(text) => {
                    self.session.summary_complete(ticket, text).await?;
                }
                Err(e) => {
                    self.session.summary_failed(ticket, e);
                }
            },
            JobResult::Reply { ticket, result } => {
                self.chat.complete_send(ticket, result);
            }
        }
        Ok(())
    }
}
