//! Store capabilities consumed by the pipeline.
//!
//! The pipeline never owns documents or conversations; it reads and appends
//! through these two traits. [`crate::assistant::database::Database`]
//! implements both over SQLite.

use async_trait::async_trait;

use super::errors::StoreError;
use super::types::{Document, Message};

/// Read access to the document corpus.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document currently in the corpus.
    async fn get_all(&self) -> Result<Vec<Document>, StoreError>;

    /// One document by id; `Ok(None)` when it does not exist.
    async fn get_by_id(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Lexical search, best match first.
    async fn search(&self, query: &str) -> Result<Vec<Document>, StoreError>;
}

/// Append-only conversation history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append(&self, conversation_id: &str, message: &Message) -> Result<(), StoreError>;

    /// Append every message of one turn, in order.
    ///
    /// The default appends one by one and can leave a prefix behind on
    /// failure; stores that support transactions override it so a failed
    /// write leaves the conversation untouched.
    async fn append_turn(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        for message in messages {
            self.append(conversation_id, message).await?;
        }
        Ok(())
    }

    /// Messages in chronological (insertion) order.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError>;
}
