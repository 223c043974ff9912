//! Assistant pipeline: grounded replies over a property document corpus.
//!
//! One user message plus the current corpus in, one assistant [`Message`]
//! out, optionally carrying one [`ToolUse`] and one [`DocumentReference`].

pub mod context;
pub mod database;
pub mod errors;
pub mod interpreter;
pub mod orchestrator;
pub mod resolver;
pub mod store;
pub mod tokens;
pub mod tools;
pub mod types;

pub use context::ContextAssembler;
pub use database::Database;
pub use errors::{AssistantError, ResolutionFailure, StoreError};
pub use interpreter::{Interpretation, ToolCallInterpreter};
pub use orchestrator::Orchestrator;
pub use resolver::{DocumentReferenceResolver, ResolveStrategy};
pub use store::{ConversationStore, DocumentStore};
pub use tools::{ToolCatalog, ToolDefinition};
pub use types::{Document, DocumentReference, Message, Relevance, Role, ToolStatus, ToolUse};
