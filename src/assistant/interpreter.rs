//! ToolCallInterpreter: turns the model's tool call into a validated
//! [`ToolUse`] and, for lookup tools, a candidate document reference.
//!
//! Failures here never abort a turn. A malformed, unknown or schema-violating
//! call is logged and the message simply carries no tool use.

use std::sync::Arc;

use crate::inference::tool_call_parser::{first_tool_call, parse_raw_tool_call, ToolCall};
use crate::inference::types::{RawCompletion, RawToolCall};

use super::errors::ResolutionFailure;
use super::store::DocumentStore;
use super::tools::{ToolCatalog, GET_DOCUMENT_BY_ID, SEARCH_DOCUMENTS};
use super::types::{DocumentReference, Relevance, ToolStatus, ToolUse};

/// What the interpreter extracted from one completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpretation {
    pub tool_use: Option<ToolUse>,
    /// Document named by a lookup tool, handed to the resolver as the
    /// tool-directed candidate.
    pub document: Option<DocumentReference>,
}

pub struct ToolCallInterpreter {
    catalog: Arc<ToolCatalog>,
    documents: Arc<dyn DocumentStore>,
}

impl ToolCallInterpreter {
    pub fn new(catalog: Arc<ToolCatalog>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { catalog, documents }
    }

    /// Interpret the first tool call of `completion`, if any.
    pub async fn interpret(&self, completion: &RawCompletion) -> Interpretation {
        let Some(raw) = first_tool_call(completion) else {
            return Interpretation::default();
        };

        if completion.tool_calls.len() > 1 {
            let ignored: Vec<&str> = completion.tool_calls[1..]
                .iter()
                .map(|c| c.name.as_str())
                .collect();
            tracing::info!(
                used = %raw.name,
                ignored = ?ignored,
                "multiple tool calls returned, only the first is honored"
            );
        }

        let call = match self.validate(raw) {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!(tool = %raw.name, error = %e, "discarding tool call");
                return Interpretation::default();
            }
        };

        let document = match self.lookup(&call).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool lookup produced no document");
                None
            }
        };

        tracing::debug!(
            tool = %call.name,
            call_id = %call.id,
            document = ?document.as_ref().map(|d| d.id.as_str()),
            "tool call interpreted"
        );

        Interpretation {
            tool_use: Some(ToolUse {
                tool_name: call.name,
                tool_input: call.arguments,
                status: ToolStatus::Started,
            }),
            document,
        }
    }

    fn validate(&self, raw: &RawToolCall) -> Result<ToolCall, ResolutionFailure> {
        let call = parse_raw_tool_call(raw)?;
        self.catalog.validate(&call.name, &call.arguments)?;
        Ok(call)
    }

    /// Resolve the document a lookup tool points at. Non-lookup tools yield
    /// `Ok(None)` without touching the store.
    async fn lookup(&self, call: &ToolCall) -> Result<Option<DocumentReference>, ResolutionFailure> {
        match call.name.as_str() {
            GET_DOCUMENT_BY_ID => {
                let id = string_arg(call, "id");
                let doc = self
                    .documents
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| ResolutionFailure::DocumentNotFound { id: id.to_string() })?;
                Ok(Some(DocumentReference::from_document(&doc, Relevance::High)))
            }
            SEARCH_DOCUMENTS => {
                let hits = self.documents.search(string_arg(call, "query")).await?;
                Ok(hits
                    .first()
                    .map(|doc| DocumentReference::from_document(doc, Relevance::Medium)))
            }
            _ => Ok(None),
        }
    }
}

/// A string argument already checked by schema validation.
fn string_arg<'a>(call: &'a ToolCall, key: &str) -> &'a str {
    call.arguments
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
}

// ─── Tests ──────────────────────────────────────────────────────────────────
