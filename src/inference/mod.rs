//! Completion gateway: OpenAI-compatible API client.
//!
//! This module handles all communication with the completion endpoint:
//! - Request construction from the pipeline's messages and tool catalog
//! - A single non-streaming HTTP call per turn
//! - Response reduction to a [`RawCompletion`]
//! - Tool call argument decoding
//! - Configuration loading from `config/assistant.yaml`
//!
//! Wire JSON shapes stay inside this module.

pub mod client;
pub mod config;
pub mod errors;
pub mod tool_call_parser;
pub mod types;

// Re-exports for convenience
pub use client::{CompletionClient, CompletionGateway};
pub use config::{AssistantConfig, CompletionConfig, ContextConfig};
pub use errors::GatewayError;
pub use types::{CompletionOptions, RawCompletion, RawToolCall};
