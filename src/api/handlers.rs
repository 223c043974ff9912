//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::assistant::types::Message;
use crate::inference::types::CompletionOptions;

use super::error::ApiError;
use super::state::AppState;

// ─── Request / response types ───────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub conversation_id: String,
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Handlers ───────────────────────────────────────────────────────────────

/// POST /chat - run one turn and return the assistant message.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(req) = payload?;
    let options = CompletionOptions {
        model: req.model,
        temperature: req.temperature,
        max_tokens: None,
    };

    let reply = state
        .orchestrator
        .handle_chat(&req.conversation_id, &req.message, &options)
        .await
        .inspect_err(|e| {
            tracing::warn!(conversation_id = %req.conversation_id, error = %e, "chat turn failed")
        })?;
    Ok(Json(reply))
}

/// GET /conversations/{id}/messages - stored history, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let messages = state.conversations.list_messages(&conversation_id).await?;
    Ok(Json(ConversationResponse {
        conversation_id,
        messages,
    }))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
