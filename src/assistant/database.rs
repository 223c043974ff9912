//! SQLite-backed document and conversation store.
//!
//! `rusqlite` is synchronous: the connection sits behind an `Arc<Mutex<_>>`
//! and every trait call runs on the blocking pool via
//! `tokio::task::spawn_blocking`, so turns never stall a runtime worker.
//! WAL mode is enabled so an external writer can keep the corpus fresh while
//! turns read it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::errors::StoreError;
use super::store::{ConversationStore, DocumentStore};
use super::types::{Associations, Document, Message, Role, Visibility};

/// Words ignored by lexical search.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "was", "our", "out",
    "has", "have", "had", "what", "when", "where", "which", "who", "why", "how", "this", "that",
    "with", "from", "about", "into", "there", "their", "them", "they", "does", "did", "will",
    "would", "could", "should", "please", "tell", "show", "give",
];

/// Minimum term length (in characters) considered by lexical search.
const MIN_TERM_CHARS: usize = 3;

const SELECT_DOCUMENT: &str =
    "SELECT id, title, doc_type, content, visibility, metadata, associations FROM documents";

// ─── Database ───────────────────────────────────────────────────────────────

/// SQLite handle implementing both [`DocumentStore`] and [`ConversationStore`].
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at the given path.
    ///
    /// Pass `":memory:"` for an in-memory database (tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        self.lock()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                doc_type TEXT NOT NULL,
                content TEXT NOT NULL,
                visibility TEXT NOT NULL DEFAULT 'private',
                metadata TEXT NOT NULL DEFAULT '{}',
                associations TEXT NOT NULL DEFAULT '{}',
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS conversation_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                tool_use TEXT,
                document_reference TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON conversation_messages(conversation_id, id);
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Database {
            reason: format!("blocking task failed: {e}"),
        })?
    }

    /// Insert a document or replace the one with the same id.
    ///
    /// Synchronous; the corpus is written by whoever owns it, not by turns.
    pub fn upsert_document(&self, doc: &Document) -> Result<(), StoreError> {
        let metadata = serde_json::to_string(&doc.metadata)?;
        let associations = serde_json::to_string(&doc.associations)?;
        self.lock()?.execute(
            "INSERT INTO documents (id, title, doc_type, content, visibility, metadata, associations)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                doc_type = excluded.doc_type,
                content = excluded.content,
                visibility = excluded.visibility,
                metadata = excluded.metadata,
                associations = excluded.associations,
                updated_at = datetime('now')",
            params![
                doc.id,
                doc.title,
                doc.doc_type,
                doc.content,
                doc.visibility.as_str(),
                metadata,
                associations
            ],
        )?;
        Ok(())
    }
}

// ─── Queries ────────────────────────────────────────────────────────────────

fn load_documents(conn: &Connection) -> Result<Vec<Document>, StoreError> {
    let mut stmt = conn.prepare(&format!("{SELECT_DOCUMENT} ORDER BY title ASC, id ASC"))?;
    let rows = stmt
        .query_map([], DocumentRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(DocumentRow::into_document).collect()
}

fn load_document(conn: &Connection, id: &str) -> Result<Option<Document>, StoreError> {
    let row = conn
        .query_row(
            &format!("{SELECT_DOCUMENT} WHERE id = ?1"),
            params![id],
            DocumentRow::from_row,
        )
        .optional()?;
    row.map(DocumentRow::into_document).transpose()
}

fn insert_message(
    conn: &Connection,
    conversation_id: &str,
    message: &Message,
) -> Result<(), StoreError> {
    let tool_use = message
        .tool_use
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let document_reference = message
        .document_reference
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO conversation_messages
            (conversation_id, role, content, timestamp, tool_use, document_reference)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            conversation_id,
            message.role.as_str(),
            message.content,
            message.timestamp.to_rfc3339(),
            tool_use,
            document_reference
        ],
    )?;
    Ok(())
}

fn load_messages(conn: &Connection, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT role, content, timestamp, tool_use, document_reference
         FROM conversation_messages
         WHERE conversation_id = ?1
         ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map(params![conversation_id], MessageRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(MessageRow::into_message).collect()
}

#[async_trait]
impl DocumentStore for Database {
    async fn get_all(&self) -> Result<Vec<Document>, StoreError> {
        self.blocking(|conn| load_documents(conn)).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        self.blocking(move |conn| load_document(conn, &id)).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Document>, StoreError> {
        let terms = search_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let documents = self.blocking(|conn| load_documents(conn)).await?;
        let mut scored: Vec<(usize, Document)> = documents
            .into_iter()
            .map(|doc| (score(&doc, &terms), doc))
            .filter(|(s, _)| *s > 0)
            .collect();
        // documents already arrive ordered by title; the sort is stable
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().map(|(_, doc)| doc).collect())
    }
}

#[async_trait]
impl ConversationStore for Database {
    async fn append(&self, conversation_id: &str, message: &Message) -> Result<(), StoreError> {
        let conversation_id = conversation_id.to_string();
        let message = message.clone();
        self.blocking(move |conn| insert_message(conn, &conversation_id, &message))
            .await
    }

    /// One transaction: either every message lands or none does.
    async fn append_turn(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        let conversation_id = conversation_id.to_string();
        let messages = messages.to_vec();
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            for message in &messages {
                insert_message(&tx, &conversation_id, message)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        let conversation_id = conversation_id.to_string();
        self.blocking(move |conn| load_messages(conn, &conversation_id))
            .await
    }
}

// ─── Lexical search ─────────────────────────────────────────────────────────

/// Lowercase alphanumeric terms of `query`, minus stop words and short terms.
pub fn search_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Title hits count double; each distinct term counts once per field.
fn score(doc: &Document, terms: &[String]) -> usize {
    let title = doc.title.to_lowercase();
    let content = doc.content.to_lowercase();
    terms
        .iter()
        .map(|term| {
            let mut s = 0;
            if title.contains(term.as_str()) {
                s += 2;
            }
            if content.contains(term.as_str()) {
                s += 1;
            }
            s
        })
        .sum()
}

// ─── Row mapping ────────────────────────────────────────────────────────────

struct DocumentRow {
    id: String,
    title: String,
    doc_type: String,
    content: String,
    visibility: String,
    metadata: String,
    associations: String,
}

impl DocumentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            doc_type: row.get(2)?,
            content: row.get(3)?,
            visibility: row.get(4)?,
            metadata: row.get(5)?,
            associations: row.get(6)?,
        })
    }

    fn into_document(self) -> Result<Document, StoreError> {
        let associations: Associations = serde_json::from_str(&self.associations)?;
        Ok(Document {
            id: self.id,
            title: self.title,
            doc_type: self.doc_type,
            content: self.content,
            visibility: Visibility::parse(&self.visibility),
            metadata: serde_json::from_str(&self.metadata)?,
            associations,
        })
    }
}

struct MessageRow {
    role: String,
    content: String,
    timestamp: String,
    tool_use: Option<String>,
    document_reference: Option<String>,
}

impl MessageRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            role: row.get(0)?,
            content: row.get(1)?,
            timestamp: row.get(2)?,
            tool_use: row.get(3)?,
            document_reference: row.get(4)?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let role = Role::parse(&self.role).ok_or_else(|| StoreError::Serialization {
            reason: format!("unknown role '{}'", self.role),
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| StoreError::Serialization {
                reason: format!("bad timestamp '{}': {e}", self.timestamp),
            })?
            .with_timezone(&Utc);
        Ok(Message {
            role,
            content: self.content,
            timestamp,
            tool_use: self.tool_use.as_deref().map(serde_json::from_str).transpose()?,
            document_reference: self
                .document_reference
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::types::{DocumentReference, Relevance, ToolStatus, ToolUse};
    use serde_json::json;

    fn test_db() -> Database {
        Database::open(":memory:").unwrap()
    }

    fn doc(id: &str, title: &str, content: &str) -> Document {
        Document {
            id: id.into(),
            title: title.into(),
            doc_type: "note".into(),
            content: content.into(),
            visibility: Visibility::Shared,
            metadata: json!({"source": "upload"}).as_object().cloned().unwrap(),
            associations: Associations {
                property_ids: vec!["p-1".into()],
                person_ids: vec![],
                tags: vec!["hvac".into()],
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = test_db();
        db.upsert_document(&doc("d1", "Boiler manual", "Reset by holding the button"))
            .unwrap();

        let found = db.get_by_id("d1").await.unwrap().unwrap();
        assert_eq!(found.title, "Boiler manual");
        assert_eq!(found.metadata["source"], "upload");
        assert_eq!(found.associations.tags, vec!["hvac"]);
        assert!(db.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let db = test_db();
        db.upsert_document(&doc("d1", "Old", "old")).unwrap();
        db.upsert_document(&doc("d1", "New", "new")).unwrap();

        let all = db.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "New");
    }

    #[test]
    fn test_search_terms() {
        assert_eq!(
            search_terms("What is the boiler's reset code? Boiler!"),
            vec!["boiler", "reset", "code"]
        );
        assert!(search_terms("is it ok").is_empty());
    }

    #[tokio::test]
    async fn test_search_ranks_title_hits_higher() {
        let db = test_db();
        db.upsert_document(&doc("a", "Inspection report", "The boiler was inspected"))
            .unwrap();
        db.upsert_document(&doc("b", "Boiler manual", "How to reset")).unwrap();
        db.upsert_document(&doc("c", "Lease", "Rent due monthly")).unwrap();

        let hits = db.search("boiler").await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_search_ties_ordered_by_title() {
        let db = test_db();
        db.upsert_document(&doc("z", "Zoning letter", "parking rules")).unwrap();
        db.upsert_document(&doc("y", "Annual notice", "parking rules")).unwrap();

        let hits = db.search("parking").await.unwrap();
        assert_eq!(hits[0].id, "y");
        assert_eq!(hits[1].id, "z");
    }

    #[tokio::test]
    async fn test_search_stop_words_only_returns_nothing() {
        let db = test_db();
        db.upsert_document(&doc("a", "The lease", "the and for")).unwrap();
        assert!(db.search("the and for").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_messages_roundtrip_in_order() {
        let db = test_db();
        let reply = Message::assistant(
            "Done <d1>",
            Some(ToolUse {
                tool_name: "getDocumentById".into(),
                tool_input: json!({"id": "d1"}).as_object().cloned().unwrap(),
                status: ToolStatus::Started,
            }),
            Some(DocumentReference::from_document(
                &doc("d1", "Boiler manual", ""),
                Relevance::High,
            )),
        );

        db.append("conv-1", &Message::user("first")).await.unwrap();
        db.append("conv-1", &reply).await.unwrap();
        db.append("conv-2", &Message::user("elsewhere")).await.unwrap();

        let history = db.list_messages("conv-1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1], reply);
        assert_eq!(db.list_messages("conv-2").await.unwrap().len(), 1);
        assert!(db.list_messages("conv-3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_turn_writes_all_in_order() {
        let db = test_db();
        db.append_turn(
            "conv-1",
            &[Message::user("question"), Message::assistant("answer", None, None)],
        )
        .await
        .unwrap();

        let history = db.list_messages("conv-1").await.unwrap();
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_append_turn_rolls_back_when_second_insert_fails() {
        let db = test_db();
        db.append("conv-1", &Message::user("earlier")).await.unwrap();
        db.lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_assistant BEFORE INSERT ON conversation_messages
                 WHEN NEW.role = 'assistant'
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let result = db
            .append_turn(
                "conv-1",
                &[Message::user("hello"), Message::assistant("hi", None, None)],
            )
            .await;

        assert!(matches!(result, Err(StoreError::Database { .. })));
        let history = db.list_messages("conv-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "earlier");
    }

    #[tokio::test]
    async fn test_get_by_id_after_upsert_from_blocking_pool() {
        let db = Arc::new(test_db());
        db.upsert_document(&doc("d1", "Lease", "rent")).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db = Arc::clone(&db);
                tokio::spawn(async move { db.get_by_id("d1").await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().unwrap().id, "d1");
        }
    }
}
