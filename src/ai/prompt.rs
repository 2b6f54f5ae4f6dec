use crate::chat::ChatContext;
use crate::models::{SummaryFocus, SummaryLength, SummaryOptions, SummaryStyle};

pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a document summarization assistant.
Follow the instructions you are given about length, style and focus.
Do not include headers like "Summary" or "Key Points" unless specifically requested.
Do not center-align text or use HTML/markdown formatting for alignment.
Start directly with the summary content."#;

pub const CHAT_SYSTEM_PROMPT: &str = r#"You are an AI assistant helping with questions about a single document.
Base your answer ONLY on the content of the document summary provided.
If you don't know the answer based on the available information, be honest about it and don't make up information.
Answer in a helpful, conversational way."#;

fn length_guidance(length: SummaryLength) -> &'static str {
    match length {
        SummaryLength::Short => "provide a brief overview with just the essential points",
        SummaryLength::Medium => "provide a balanced summary with key details",
        SummaryLength::Long => {
            "provide a comprehensive, detailed summary that captures most of the important information from the original document"
        }
    }
}

fn style_guidance(style: SummaryStyle) -> &'static str {
    match style {
        SummaryStyle::Paragraph => "Write in paragraph form",
        SummaryStyle::Bullet => "Use bullet points",
    }
}

fn focus_guidance(focus: SummaryFocus) -> &'static str {
    match focus {
        SummaryFocus::General => "general overview",
        SummaryFocus::Academic => "academic analysis",
        SummaryFocus::Technical => "technical details",
    }
}

/// Cut `text` to at most `max_chars` characters.
pub fn bounded(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

pub fn summary_prompt(text: &str, options: SummaryOptions, max_source_chars: usize) -> String {
    let content = bounded(text, max_source_chars);
    if content.len() < text.len() {
        tracing::debug!(
            "Source text truncated to {} characters for summarization",
            max_source_chars
        );
    }

    format!(
        "Create a summary of the following content.\n\n\
         Instructions (do not include these in your response):\n\
         - Length: {} ({})\n\
         - Style: {}\n\
         - Focus: {} (emphasize {})\n\n\
         Content to summarize:\n{}",
        options.length,
        length_guidance(options.length),
        style_guidance(options.style),
        options.focus,
        focus_guidance(options.focus),
        content
    )
}

pub fn chat_prompt(context: &ChatContext, question: &str) -> String {
    format!(
        "Document: \"{}\"\n\n\
         Here's what we know about the document from its summary:\n{}\n\n\
         The summary was generated with these options:\n\
         - Length: {}\n\
         - Style: {}\n\
         - Focus: {}\n\n\
         User question: {}",
        context.title,
        context.body,
        context.options.length,
        context.options.style,
        context.options.focus,
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_carries_every_option() {
        let options = SummaryOptions::new(
            SummaryLength::Short,
            SummaryStyle::Bullet,
            SummaryFocus::Technical,
        );
        let prompt = summary_prompt("The body.", options, 1000);
        assert!(prompt.contains("Length: short (provide a brief overview"));
        assert!(prompt.contains("Use bullet points"));
        assert!(prompt.contains("emphasize technical details"));
        assert!(prompt.ends_with("The body."));
    }

    #[test]
    fn test_summary_prompt_bounds_source_text() {
        let text = "x".repeat(50);
        let prompt = summary_prompt(&text, SummaryOptions::default(), 10);
        assert!(prompt.ends_with(&"x".repeat(10)));
        assert!(!prompt.contains(&"x".repeat(11)));
    }

    #[test]
    fn test_chat_prompt_includes_context_and_question() {
        let context = ChatContext {
            title: "Dune".to_string(),
            body: "Spice and sand.".to_string(),
            options: SummaryOptions::default(),
        };
        let prompt = chat_prompt(&context, "  Who is Paul? ");
        assert!(prompt.contains("Document: \"Dune\""));
        assert!(prompt.contains("Spice and sand."));
        assert!(prompt.contains("- Style: paragraph"));
        assert!(prompt.ends_with("User question: Who is Paul?"));
    }

    #[test]
    fn test_bounded_respects_char_boundaries() {
        assert_eq!(bounded("héllo", 2), "hé");
        assert_eq!(bounded("hi", 10), "hi");
    }
}
