//! Shared types for the assistant pipeline.
//!
//! Conversation messages, tool uses, documents and document references used
//! across the context assembler, interpreter, resolver and orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Conversation Messages ──────────────────────────────────────────────────

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

/// One entry of a conversation. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// RFC 3339 / ISO 8601, UTC.
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use: Option<ToolUse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_reference: Option<DocumentReference>,
}

impl Message {
    fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            tool_use: None,
            document_reference: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::now(Role::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::now(Role::System, content)
    }

    /// An assistant reply with its optional tool use and citation.
    pub fn assistant(
        content: impl Into<String>,
        tool_use: Option<ToolUse>,
        document_reference: Option<DocumentReference>,
    ) -> Self {
        Self {
            tool_use,
            document_reference,
            ..Self::now(Role::Assistant, content)
        }
    }
}

// ─── Tool Use ───────────────────────────────────────────────────────────────

/// Lifecycle of a tool invocation surfaced on a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Started,
    Completed,
    Failed,
}

/// A validated tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUse {
    pub tool_name: String,
    /// Arguments, already validated against the tool's parameter schema.
    pub tool_input: serde_json::Map<String, serde_json::Value>,
    pub status: ToolStatus,
}

// ─── Documents ──────────────────────────────────────────────────────────────

/// Who may see a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Shared,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Shared => "shared",
            Visibility::Public => "public",
        }
    }

    /// Unknown values fall back to the most restrictive setting.
    pub fn parse(s: &str) -> Self {
        match s {
            "public" => Visibility::Public,
            "shared" => Visibility::Shared,
            _ => Visibility::Private,
        }
    }
}

/// Links between a document and other records (properties, people, tags).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Associations {
    #[serde(default)]
    pub property_ids: Vec<String>,
    #[serde(default)]
    pub person_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A document as owned by the document store. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub content: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub associations: Associations,
}

// ─── Document References ────────────────────────────────────────────────────

/// How strongly a citation is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    Medium,
    Low,
}

/// The single citation attached to an assistant message. Never carries content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub relevance: Relevance,
    pub url: String,
    pub visibility: Visibility,
}

impl DocumentReference {
    /// Project a document down to a reference.
    pub fn from_document(doc: &Document, relevance: Relevance) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            doc_type: doc.doc_type.clone(),
            relevance,
            url: document_url(&doc.id),
            visibility: doc.visibility,
        }
    }
}

/// App-relative link to a document's detail page.
pub fn document_url(id: &str) -> String {
    format!("/documents/{id}")
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lease() -> Document {
        Document {
            id: "doc-1".into(),
            title: "Lease — Unit 4B".into(),
            doc_type: "lease".into(),
            content: "Tenant: Ada. Phone 555-0100.".into(),
            visibility: Visibility::Shared,
            metadata: serde_json::Map::new(),
            associations: Associations::default(),
        }
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::User, Role::Assistant, Role::System] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("tool"), None);
    }

    #[test]
    fn test_visibility_unknown_is_private() {
        assert_eq!(Visibility::parse("team"), Visibility::Private);
        assert_eq!(Visibility::parse("public"), Visibility::Public);
    }

    #[test]
    fn test_reference_projection_drops_content() {
        let reference = DocumentReference::from_document(&lease(), Relevance::High);
        assert_eq!(reference.id, "doc-1");
        assert_eq!(reference.url, "/documents/doc-1");
        let json = serde_json::to_string(&reference).unwrap();
        assert!(!json.contains("555-0100"));
        assert!(json.contains("\"type\":\"lease\""));
        assert!(json.contains("\"relevance\":\"high\""));
    }

    #[test]
    fn test_message_serialization_camel_case() {
        let msg = Message::assistant(
            "done",
            Some(ToolUse {
                tool_name: "getPropertyInfo".into(),
                tool_input: serde_json::Map::new(),
                status: ToolStatus::Started,
            }),
            None,
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["toolUse"]["toolName"], "getPropertyInfo");
        assert_eq!(json["toolUse"]["status"], "started");
        assert!(json.get("documentReference").is_none());
        // chrono serializes DateTime<Utc> as RFC 3339
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_message_deserializes_without_optional_fields() {
        let msg: Message = serde_json::from_str(
            r#"{"role":"user","content":"hi","timestamp":"2026-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        assert_eq!(msg.role, Role::User);
        assert!(msg.tool_use.is_none());
        assert!(msg.document_reference.is_none());
    }
}
