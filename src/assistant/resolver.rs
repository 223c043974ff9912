//! DocumentReferenceResolver: picks the single citation for a reply.
//!
//! An ordered list of [`ResolveStrategy`]s is tried until one returns a
//! reference; later strategies are never invoked after a hit. The default
//! order is tool-directed, then inline citation, then relevance search.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use super::store::DocumentStore;
use super::types::{DocumentReference, Message, Relevance, Role};

/// Everything a strategy may look at.
pub struct ResolutionContext<'a> {
    /// Assistant text as returned by the model.
    pub raw_content: &'a str,
    /// Candidate found by the tool call interpreter.
    pub tool_candidate: Option<&'a DocumentReference>,
    /// Conversation history including the current user message.
    pub history: &'a [Message],
    pub store: &'a dyn DocumentStore,
}

/// One way of finding a citation.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means "no match", and the next strategy is tried.
    async fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<DocumentReference>;
}

// ─── Strategies ─────────────────────────────────────────────────────────────

/// Uses the interpreter's candidate as-is.
pub struct ToolDirected;

#[async_trait]
impl ResolveStrategy for ToolDirected {
    fn name(&self) -> &'static str {
        "tool_directed"
    }

    async fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<DocumentReference> {
        ctx.tool_candidate.cloned()
    }
}

/// Looks up the `<doc-id>` markers of the reply in order; the first one that
/// names a known document wins.
pub struct InlineCitation;

/// Most markers looked up per reply.
pub const MAX_INLINE_MARKERS: usize = 8;

fn citation_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"<([A-Za-z0-9][A-Za-z0-9_\-]*)>").expect("citation marker regex is valid")
    })
}

/// Distinct ids inside inline citation markers of `content`, in order of
/// first appearance.
pub fn citation_markers(content: &str) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for caps in citation_marker().captures_iter(content) {
        if let Some(id) = caps.get(1).map(|m| m.as_str()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

#[async_trait]
impl ResolveStrategy for InlineCitation {
    fn name(&self) -> &'static str {
        "inline_citation"
    }

    async fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<DocumentReference> {
        for id in citation_markers(ctx.raw_content)
            .into_iter()
            .take(MAX_INLINE_MARKERS)
        {
            match ctx.store.get_by_id(id).await {
                Ok(Some(doc)) => {
                    return Some(DocumentReference::from_document(&doc, Relevance::High));
                }
                Ok(None) => {
                    tracing::debug!(marker = %id, "inline marker names no known document");
                }
                Err(e) => {
                    tracing::warn!(marker = %id, error = %e, "inline citation lookup failed");
                }
            }
        }
        None
    }
}

/// Searches the corpus with the most recent user message.
pub struct RelevanceSearch;

#[async_trait]
impl ResolveStrategy for RelevanceSearch {
    fn name(&self) -> &'static str {
        "relevance_search"
    }

    async fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<DocumentReference> {
        let query = ctx
            .history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim())
            .filter(|q| !q.is_empty())?;

        match ctx.store.search(query).await {
            Ok(hits) => hits
                .first()
                .map(|doc| DocumentReference::from_document(doc, Relevance::Medium)),
            Err(e) => {
                tracing::warn!(error = %e, "relevance search failed");
                None
            }
        }
    }
}

// ─── Resolver ───────────────────────────────────────────────────────────────

pub struct DocumentReferenceResolver {
    store: Arc<dyn DocumentStore>,
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl DocumentReferenceResolver {
    /// Resolver with the default precedence.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_strategies(
            store,
            vec![
                Box::new(ToolDirected),
                Box::new(InlineCitation),
                Box::new(RelevanceSearch),
            ],
        )
    }

    pub fn with_strategies(
        store: Arc<dyn DocumentStore>,
        strategies: Vec<Box<dyn ResolveStrategy>>,
    ) -> Self {
        Self { store, strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First reference any strategy produces, in order.
    pub async fn resolve(
        &self,
        raw_content: &str,
        tool_candidate: Option<&DocumentReference>,
        history: &[Message],
    ) -> Option<DocumentReference> {
        let ctx = ResolutionContext {
            raw_content,
            tool_candidate,
            history,
            store: self.store.as_ref(),
        };

        for strategy in &self.strategies {
            if let Some(reference) = strategy.resolve(&ctx).await {
                tracing::debug!(
                    strategy = strategy.name(),
                    document_id = %reference.id,
                    "citation resolved"
                );
                return Some(reference);
            }
        }
        None
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
