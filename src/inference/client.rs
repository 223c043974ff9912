//! OpenAI-compatible completion gateway.
//!
//! Turns the pipeline's messages and tool catalog into one non-streaming chat
//! completion request and reduces the response to a [`RawCompletion`]. There is
//! no retry or fallback here; a failed call fails the turn.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use uuid::Uuid;

use super::config::CompletionConfig;
use super::errors::GatewayError;
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, CompletionOptions,
    FunctionDefinition, RawCompletion, RawToolCall, ToolDefinition as WireToolDefinition, WireRole,
};
use crate::assistant::tools::ToolDefinition;
use crate::assistant::types::{Message, Role};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Gateway Trait ───────────────────────────────────────────────────────────

/// A chat-completion backend.
///
/// Implemented by [`CompletionClient`] for the real API; tests substitute
/// scripted gateways.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &CompletionOptions,
    ) -> Result<RawCompletion, GatewayError>;
}

// ─── CompletionClient ────────────────────────────────────────────────────────

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct CompletionClient {
    http: HttpClient,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Build the HTTP client. Does NOT check the credential or connectivity;
    /// the credential is checked on every call before any I/O.
    pub fn new(config: CompletionConfig) -> Result<Self, GatewayError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::ConnectionFailed {
                endpoint: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// The configured default model.
    pub fn default_model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body from domain values and per-turn overrides.
    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &CompletionOptions,
    ) -> ChatCompletionRequest {
        let wire_tools: Vec<WireToolDefinition> = tools.iter().map(to_wire_tool).collect();
        let has_tools = !wire_tools.is_empty();

        ChatCompletionRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: messages.iter().map(to_wire_message).collect(),
            tools: has_tools.then_some(wire_tools),
            tool_choice: has_tools.then(|| "auto".to_string()),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            stream: false,
        }
    }
}

#[async_trait]
impl CompletionGateway for CompletionClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &CompletionOptions,
    ) -> Result<RawCompletion, GatewayError> {
        let api_key = self
            .config
            .credential()
            .ok_or(GatewayError::MissingCredential)?;

        let url = self.endpoint();
        let body = self.build_request(messages, tools, options);

        // Request metadata only; the body carries the whole document context.
        tracing::info!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            tool_count = body.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            max_tokens = body.max_tokens,
            "completion request"
        );

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout {
                        duration_secs: self.config.timeout_secs,
                    }
                } else {
                    GatewayError::ConnectionFailed {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "completion API returned an error");
            return Err(GatewayError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout {
                    duration_secs: self.config.timeout_secs,
                }
            } else {
                GatewayError::MalformedResponse {
                    reason: format!("failed to read response body: {e}"),
                }
            }
        })?;

        let completion = parse_completion_response(&body_text)?;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            tool_calls = completion.tool_calls.len(),
            finish_reason = ?completion.finish_reason,
            "completion received"
        );
        Ok(completion)
    }
}

// ─── Response Parsing ────────────────────────────────────────────────────────

/// Decode a non-streaming response body and keep the first choice.
pub fn parse_completion_response(body: &str) -> Result<RawCompletion, GatewayError> {
    let resp: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::MalformedResponse {
            reason: format!("failed to parse completion response: {e}"),
        })?;

    let model = resp.model;
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(GatewayError::NoChoices)?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| RawToolCall {
            id: tc
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("call_{}", Uuid::new_v4())),
            name: tc.function.name,
            arguments: tc.function.arguments,
        })
        .collect();

    Ok(RawCompletion {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        finish_reason: choice.finish_reason,
        model,
    })
}

// ─── Conversions ─────────────────────────────────────────────────────────────

fn to_wire_message(message: &Message) -> ChatMessage {
    ChatMessage {
        role: match message.role {
            Role::System => WireRole::System,
            Role::User => WireRole::User,
            Role::Assistant => WireRole::Assistant,
        },
        content: message.content.clone(),
    }
}

fn to_wire_tool(tool: &ToolDefinition) -> WireToolDefinition {
    WireToolDefinition {
        r#type: "function".to_string(),
        function: FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameter_schema.clone(),
        },
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
