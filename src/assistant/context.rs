//! ContextAssembler: grounds the conversation in the current document corpus.
//!
//! Builds a single system message holding every document (long ones cut with a
//! head/middle/tail strategy) plus citation instructions, and puts it in front
//! of the history. A previous turn's context message is dropped first, so the
//! assembled list never carries more than one.

use std::borrow::Cow;
use std::sync::Arc;

use super::errors::{AssistantError, StoreError};
use super::store::DocumentStore;
use super::tokens::{char_slice, estimate_message_tokens};
use super::types::{Document, Message, Role};
use crate::inference::config::ContextConfig;

// ─── Constants ──────────────────────────────────────────────────────────────

/// First line of every document-context message. Used to recognize and
/// replace the message on later turns.
pub const DOCUMENT_CONTEXT_HEADER: &str = "### PROPERTY DOCUMENT CONTEXT ###";

/// Citation rules sent with the documents.
const CITATION_INSTRUCTIONS: &str = "\
You are a property-management assistant. Answer using the documents below when they are relevant.\n\
Whenever your answer draws on a document you MUST cite it in two ways:\n\
1. Inline, the document ID wrapped in angle brackets, e.g. <doc-id>.\n\
2. A markdown link in the form [Document Title](/documents/doc-id).\n\
Replace doc-id with the exact ID shown in the document header. Never invent IDs. \
If no document is relevant, answer without citations.";

// ─── ContextAssembler ───────────────────────────────────────────────────────

/// Builds the grounded message list for a turn.
pub struct ContextAssembler {
    documents: Arc<dyn DocumentStore>,
    config: ContextConfig,
}

impl ContextAssembler {
    /// Fails with a configuration error when the truncation budget does not
    /// fit `max_document_chars`.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        config: ContextConfig,
    ) -> Result<Self, AssistantError> {
        config.validate()?;
        Ok(Self { documents, config })
    }

    /// Fetch the corpus and assemble the message list.
    pub async fn assemble(&self, history: &[Message]) -> Result<Vec<Message>, StoreError> {
        let documents = self.documents.get_all().await?;
        Ok(self.assemble_with(history, &documents))
    }

    /// Assemble from an already-fetched corpus.
    pub fn assemble_with(&self, history: &[Message], documents: &[Document]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);

        if documents.is_empty() {
            tracing::debug!("empty document corpus, no context injected");
        } else {
            let context = self.render(documents);
            tracing::info!(
                document_count = documents.len(),
                estimated_tokens = estimate_message_tokens(&context),
                "assembled document context"
            );
            messages.push(Message::system(context));
        }

        messages.extend(
            history
                .iter()
                .filter(|m| !is_document_context(m))
                .cloned(),
        );
        messages
    }

    /// Render the context message body.
    pub fn render(&self, documents: &[Document]) -> String {
        let mut out = String::new();
        out.push_str(DOCUMENT_CONTEXT_HEADER);
        out.push('\n');
        out.push_str(CITATION_INSTRUCTIONS);
        out.push_str("\n\n");

        let mut truncated = 0usize;
        for doc in documents {
            let body = truncate_head_middle_tail(&doc.content, &self.config);
            if matches!(body, Cow::Owned(_)) {
                truncated += 1;
            }
            out.push_str(&format!("--- DOCUMENT: {} (ID: {}) ---\n", doc.title, doc.id));
            out.push_str(&body);
            out.push_str("\n\n");
        }

        if truncated > 0 {
            tracing::debug!(truncated, "documents truncated for context");
        }
        out
    }
}

/// Whether `message` is a document-context message injected by a prior turn.
pub fn is_document_context(message: &Message) -> bool {
    message.role == Role::System && message.content.starts_with(DOCUMENT_CONTEXT_HEADER)
}

/// Keep the head, a window around the midpoint, and the tail of `content`.
///
/// Content at or under `max_document_chars` characters is returned borrowed
/// and untouched. Otherwise the result is
/// `head + marker + middle + marker + tail`, whose length never exceeds
/// `max_document_chars` once the config passed [`ContextConfig::validate`]. The middle window is centered
/// on the midpoint and shifted, if needed, so it never overlaps head or tail.
pub fn truncate_head_middle_tail<'a>(content: &'a str, config: &ContextConfig) -> Cow<'a, str> {
    let len = content.chars().count();
    if len <= config.max_document_chars {
        return Cow::Borrowed(content);
    }

    let head_end = config.head_chars.min(len);
    let tail_start = len.saturating_sub(config.tail_chars).max(head_end);
    let room = tail_start - head_end;
    let middle_len = config.middle_chars.min(room);

    let centered = (len / 2).saturating_sub(middle_len / 2);
    let middle_start = centered.clamp(head_end, tail_start - middle_len);

    let mut out = String::with_capacity(config.truncated_len() * 4);
    out.push_str(char_slice(content, 0, head_end));
    out.push_str(&config.elision_marker);
    out.push_str(char_slice(content, middle_start, middle_start + middle_len));
    out.push_str(&config.elision_marker);
    out.push_str(char_slice(content, tail_start, len));
    Cow::Owned(out)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
