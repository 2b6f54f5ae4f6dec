use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SummaryOptions;

pub const DEFAULT_PREVIEW_CHARS: usize = 150;
const ELLIPSIS: &str = "...";
const UNTITLED: &str = "Untitled Document";

static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[^/.]+$").expect("extension pattern is valid"));

/// One completed summarization, as persisted in the history ledger.
///
/// Field names and enum spellings are the storage format; changing them
/// breaks existing history files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub options: SummaryOptions,
    pub preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl HistoryItem {
    /// Build a fresh record for a summary of `document_name`.
    pub fn new(
        document_name: &str,
        options: SummaryOptions,
        summary: String,
        preview_chars: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title_from_document_name(document_name),
            date: Utc::now(),
            options,
            preview: make_preview(&summary, preview_chars),
            summary: Some(summary),
        }
    }

    /// Full summary text when stored, otherwise the preview.
    pub fn body(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.preview)
    }
}

/// Strip the final extension from a file name, e.g. `"report.v2.pdf"` -> `"report.v2"`.
pub fn title_from_document_name(name: &str) -> String {
    let stem = EXTENSION.replace(name.trim(), "");
    let stem = stem.trim();
    if stem.is_empty() {
        UNTITLED.to_string()
    } else {
        stem.to_string()
    }
}

/// Truncate to `max_chars` Unicode scalar values, appending an ellipsis only
/// when something was cut. Never splits a UTF-8 sequence.
pub fn make_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SummaryFocus, SummaryLength, SummaryStyle};

    #[test]
    fn test_title_strips_only_last_extension() {
        assert_eq!(title_from_document_name("Dune.pdf"), "Dune");
        assert_eq!(title_from_document_name("report.v2.pdf"), "report.v2");
        assert_eq!(title_from_document_name("notes"), "notes");
        assert_eq!(title_from_document_name(".pdf"), UNTITLED);
    }

    #[test]
    fn test_preview_keeps_short_text_intact() {
        assert_eq!(make_preview("short summary", 150), "short summary");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let text = "ééééé";
        assert_eq!(make_preview(text, 3), "ééé...");

        let long = "a".repeat(200);
        let preview = make_preview(&long, DEFAULT_PREVIEW_CHARS);
        assert_eq!(preview.chars().count(), DEFAULT_PREVIEW_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn test_legacy_record_without_summary_deserializes() {
        let json = r#"{
            "id": "1712345678901",
            "title": "Old Book",
            "date": "2025-03-01T12:00:00.000Z",
            "options": {"length": "long", "style": "paragraph", "focus": "academic"},
            "preview": "An old preview..."
        }"#;
        let item: HistoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.summary, None);
        assert_eq!(item.body(), "An old preview...");
        assert_eq!(item.options.length, SummaryLength::Long);
    }

    #[test]
    fn test_new_item_records_title_and_options() {
        let options = SummaryOptions::new(
            SummaryLength::Short,
            SummaryStyle::Bullet,
            SummaryFocus::Technical,
        );
        let item = HistoryItem::new("Manual.pdf", options, "Body".to_string(), 150);
        assert_eq!(item.title, "Manual");
        assert_eq!(item.options, options);
        assert_eq!(item.preview, "Body");
        assert_eq!(item.body(), "Body");
    }
}
