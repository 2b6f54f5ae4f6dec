mod chat;
mod document;
mod history;
mod options;

pub use chat::{ChatMessage, Sender};
pub use document::{Document, DEFAULT_MAX_UPLOAD_BYTES, PDF_CONTENT_TYPE};
pub use history::{make_preview, title_from_document_name, HistoryItem, DEFAULT_PREVIEW_CHARS};
pub use options::{OptionValue, SummaryFocus, SummaryLength, SummaryOptions, SummaryStyle};
