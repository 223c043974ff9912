//! Orchestrator: runs one conversational turn end to end.
//!
//! Pipeline per turn (strictly sequential):
//! 1. **Assemble**: document context + history ([`ContextAssembler`])
//! 2. **Complete**: one completion call ([`CompletionGateway`])
//! 3. **Interpret**: first tool call → [`ToolUse`](super::types::ToolUse)
//! 4. **Resolve**: single citation ([`DocumentReferenceResolver`])
//! 5. **Compose**: the outbound assistant [`Message`]
//!
//! `handle_chat` wraps the pipeline with input validation and persistence.
//! The user message and the reply are appended together in one
//! [`ConversationStore::append_turn`] call, only after the pipeline
//! succeeded, so a failed or cancelled turn leaves the conversation untouched.

use std::sync::Arc;
use std::time::Instant;

use crate::inference::client::CompletionGateway;
use crate::inference::config::ContextConfig;
use crate::inference::types::CompletionOptions;

use super::context::ContextAssembler;
use super::errors::AssistantError;
use super::interpreter::ToolCallInterpreter;
use super::resolver::DocumentReferenceResolver;
use super::store::{ConversationStore, DocumentStore};
use super::tools::ToolCatalog;
use super::types::Message;

// ─── Constants ──────────────────────────────────────────────────────────────

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

// ─── Orchestrator ───────────────────────────────────────────────────────────

pub struct Orchestrator {
    assembler: ContextAssembler,
    gateway: Arc<dyn CompletionGateway>,
    interpreter: ToolCallInterpreter,
    resolver: DocumentReferenceResolver,
    catalog: Arc<ToolCatalog>,
    documents: Arc<dyn DocumentStore>,
    conversations: Arc<dyn ConversationStore>,
}

impl Orchestrator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        conversations: Arc<dyn ConversationStore>,
        gateway: Arc<dyn CompletionGateway>,
        catalog: Arc<ToolCatalog>,
        context: ContextConfig,
    ) -> Result<Self, AssistantError> {
        Ok(Self {
            assembler: ContextAssembler::new(documents.clone(), context)?,
            gateway,
            interpreter: ToolCallInterpreter::new(catalog.clone(), documents.clone()),
            resolver: DocumentReferenceResolver::new(documents.clone()),
            catalog,
            documents,
            conversations,
        })
    }

    /// Replace the default citation resolver.
    pub fn with_resolver(mut self, resolver: DocumentReferenceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Produce the assistant reply for `history`. Does not persist anything.
    pub async fn respond(
        &self,
        history: &[Message],
        options: &CompletionOptions,
    ) -> Result<Message, AssistantError> {
        let messages = self.assembler.assemble(history).await?;
        self.run_pipeline(history, messages, options).await
    }

    /// Validate `text`, run a turn on `conversation_id`, and persist both the
    /// user message and the reply.
    pub async fn handle_chat(
        &self,
        conversation_id: &str,
        text: &str,
        options: &CompletionOptions,
    ) -> Result<Message, AssistantError> {
        validate_inbound(conversation_id, text)?;
        let started = Instant::now();

        let (mut history, documents) = futures::try_join!(
            self.conversations.list_messages(conversation_id),
            self.documents.get_all()
        )?;

        let user_message = Message::user(text);
        history.push(user_message.clone());

        let messages = self.assembler.assemble_with(&history, &documents);
        let reply = self.run_pipeline(&history, messages, options).await?;

        self.conversations
            .append_turn(conversation_id, &[user_message, reply.clone()])
            .await?;

        tracing::info!(
            conversation_id = %conversation_id,
            history_len = history.len(),
            document_count = documents.len(),
            tool = reply.tool_use.as_ref().map(|t| t.tool_name.as_str()).unwrap_or("none"),
            citation = reply.document_reference.as_ref().map(|d| d.id.as_str()).unwrap_or("none"),
            latency_ms = started.elapsed().as_millis() as u64,
            "turn completed"
        );

        Ok(reply)
    }

    async fn run_pipeline(
        &self,
        history: &[Message],
        messages: Vec<Message>,
        options: &CompletionOptions,
    ) -> Result<Message, AssistantError> {
        let raw = match self
            .gateway
            .complete(&messages, self.catalog.definitions(), options)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "completion failed, turn aborted");
                return Err(e.into());
            }
        };

        let interpretation = self.interpreter.interpret(&raw).await;
        let document_reference = self
            .resolver
            .resolve(&raw.content, interpretation.document.as_ref(), history)
            .await;

        Ok(Message::assistant(
            raw.content,
            interpretation.tool_use,
            document_reference,
        ))
    }
}

/// Reject inbound turns the pipeline should never see.
pub fn validate_inbound(conversation_id: &str, text: &str) -> Result<(), AssistantError> {
    if conversation_id.trim().is_empty() {
        return Err(AssistantError::InvalidMessage {
            reason: "conversation id must not be empty".to_string(),
        });
    }
    if text.trim().is_empty() {
        return Err(AssistantError::InvalidMessage {
            reason: "message must not be empty".to_string(),
        });
    }
    let chars = text.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(AssistantError::InvalidMessage {
            reason: format!("message is {chars} characters, limit is {MAX_MESSAGE_CHARS}"),
        });
    }
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────────────
