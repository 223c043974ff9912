//! Tool call parsing: normalizes a raw gateway tool call to a [`ToolCall`].
//!
//! The completion API returns tool calls in the OpenAI native JSON format:
//! a function name plus a JSON-encoded argument string. This module decodes
//! the argument string and enforces that it is a JSON object. Schema checks
//! against the tool catalog happen later, in the interpreter.

use thiserror::Error;
use uuid::Uuid;

use super::types::{RawCompletion, RawToolCall};

/// A tool call with decoded arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// Why a raw tool call could not be decoded.
#[derive(Debug, Error)]
pub enum ToolCallParseError {
    #[error("empty tool name")]
    EmptyName,

    #[error("invalid JSON arguments: {reason}")]
    InvalidJson { raw: String, reason: String },

    #[error("arguments must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// Parse a single native JSON tool call.
///
/// A blank argument string is treated as `{}`; some models send nothing for
/// tools without parameters.
pub fn parse_native_json_tool_call(
    id: Option<&str>,
    name: &str,
    arguments_json: &str,
) -> Result<ToolCall, ToolCallParseError> {
    let call_id = id
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("call_{}", Uuid::new_v4()));

    let name = name.trim();
    if name.is_empty() {
        return Err(ToolCallParseError::EmptyName);
    }

    let arguments = if arguments_json.trim().is_empty() {
        serde_json::Map::new()
    } else {
        let value: serde_json::Value = serde_json::from_str(arguments_json).map_err(|e| {
            ToolCallParseError::InvalidJson {
                raw: arguments_json.to_string(),
                reason: e.to_string(),
            }
        })?;
        match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(ToolCallParseError::NotAnObject {
                    kind: json_kind(&other),
                })
            }
        }
    };

    Ok(ToolCall {
        id: call_id,
        name: name.to_string(),
        arguments,
    })
}

/// Parse a [`RawToolCall`] as returned by the gateway.
pub fn parse_raw_tool_call(raw: &RawToolCall) -> Result<ToolCall, ToolCallParseError> {
    parse_native_json_tool_call(Some(&raw.id), &raw.name, &raw.arguments)
}

/// The first tool call of a completion. Only one tool call is honored per turn.
pub fn first_tool_call(completion: &RawCompletion) -> Option<&RawToolCall> {
    completion.tool_calls.first()
}

/// JSON type name, as used in JSON Schema `type` keywords.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_native_json_valid() {
        let call = parse_native_json_tool_call(
            Some("call_123"),
            "getDocumentById",
            r#"{"id": "doc-7"}"#,
        )
        .unwrap();

        assert_eq!(call.id, "call_123");
        assert_eq!(call.name, "getDocumentById");
        assert_eq!(call.arguments["id"], "doc-7");
    }

    #[test]
    fn test_parse_native_json_generates_id() {
        let call = parse_native_json_tool_call(None, "searchDocuments", r#"{"query":"lease"}"#)
            .unwrap();
        assert!(call.id.starts_with("call_"));
    }

    #[test]
    fn test_parse_native_json_empty_name() {
        let result = parse_native_json_tool_call(None, "  ", "{}");
        assert!(matches!(result, Err(ToolCallParseError::EmptyName)));
    }

    #[test]
    fn test_parse_native_json_invalid_json() {
        let result = parse_native_json_tool_call(None, "createMaintenanceTask", "{\"title\": ");
        match result {
            Err(ToolCallParseError::InvalidJson { raw, .. }) => {
                assert_eq!(raw, "{\"title\": ");
            }
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_native_json_rejects_array() {
        let result = parse_native_json_tool_call(None, "getPropertyInfo", "[1,2]");
        assert!(matches!(
            result,
            Err(ToolCallParseError::NotAnObject { kind: "array" })
        ));
    }

    #[test]
    fn test_blank_arguments_become_empty_object() {
        let call = parse_native_json_tool_call(None, "getPropertyInfo", "").unwrap();
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_first_tool_call_takes_head() {
        let completion = RawCompletion {
            tool_calls: vec![
                RawToolCall {
                    id: "a".into(),
                    name: "first".into(),
                    arguments: "{}".into(),
                },
                RawToolCall {
                    id: "b".into(),
                    name: "second".into(),
                    arguments: "{}".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(first_tool_call(&completion).unwrap().name, "first");
        assert!(first_tool_call(&RawCompletion::default()).is_none());
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&serde_json::json!(3)), "integer");
        assert_eq!(json_kind(&serde_json::json!(3.5)), "number");
        assert_eq!(json_kind(&serde_json::json!("x")), "string");
        assert_eq!(json_kind(&serde_json::json!({})), "object");
    }
}
