//! Assistant configuration loading and validation.
//!
//! Reads `config/assistant.yaml` and resolves environment variables.
//! Config is the single source of truth for the completion endpoint, the
//! context truncation budget, the HTTP bind address and the database path.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::errors::GatewayError;

/// Relative location of the config file, searched upward from the working dir.
const CONFIG_RELATIVE_PATH: &str = "config/assistant.yaml";

/// Env var that pins the config file location.
const CONFIG_ENV_VAR: &str = "PROPDESK_CONFIG";

// ─── Public Types ────────────────────────────────────────────────────────────

/// Top-level configuration (mirrors `config/assistant.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    pub completion: CompletionConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion API endpoint and sampling defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer credential. Blank after interpolation counts as absent.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Head/middle/tail truncation budget for document context.
#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    /// Documents longer than this (in characters) are truncated.
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
    #[serde(default = "default_head_chars")]
    pub head_chars: usize,
    #[serde(default = "default_middle_chars")]
    pub middle_chars: usize,
    #[serde(default = "default_tail_chars")]
    pub tail_chars: usize,
    #[serde(default = "default_elision_marker")]
    pub elision_marker: String,
}

/// HTTP surface settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Browser origins allowed by CORS. Empty allows none.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// SQLite location. `None` means the platform data directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub database_path: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_document_chars() -> usize {
    6_000
}
fn default_head_chars() -> usize {
    2_000
}
fn default_middle_chars() -> usize {
    1_500
}
fn default_tail_chars() -> usize {
    2_000
}
fn default_elision_marker() -> String {
    "\n[...]\n".to_string()
}
fn default_bind() -> String {
    "127.0.0.1:3040".to_string()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_document_chars: default_max_document_chars(),
            head_chars: default_head_chars(),
            middle_chars: default_middle_chars(),
            tail_chars: default_tail_chars(),
            elision_marker: default_elision_marker(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: Vec::new(),
        }
    }
}

impl CompletionConfig {
    /// The credential, if one is configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl ContextConfig {
    /// Longest possible truncated body: three slices plus two markers.
    pub fn truncated_len(&self) -> usize {
        self.head_chars
            + self.middle_chars
            + self.tail_chars
            + 2 * self.elision_marker.chars().count()
    }

    /// The three slices and two markers must fit in `max_document_chars`.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.truncated_len() > self.max_document_chars {
            return Err(GatewayError::ConfigError {
                reason: format!(
                    "context budget too small: head {} + middle {} + tail {} + markers exceed {}",
                    self.head_chars, self.middle_chars, self.tail_chars, self.max_document_chars
                ),
            });
        }
        Ok(())
    }
}

impl AssistantConfig {
    /// Structural checks that do not involve the credential.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.completion.base_url.trim().is_empty() {
            return Err(GatewayError::ConfigError {
                reason: "completion.base_url is empty".into(),
            });
        }
        if self.completion.model.trim().is_empty() {
            return Err(GatewayError::ConfigError {
                reason: "completion.model is empty".into(),
            });
        }
        self.context.validate()
    }

    /// Fail fast at startup when no credential is configured.
    pub fn require_credential(&self) -> Result<(), GatewayError> {
        self.completion
            .credential()
            .map(|_| ())
            .ok_or(GatewayError::MissingCredential)
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Resolve the config path.
///
/// Checks `PROPDESK_CONFIG` first, then searches upward from `start` for
/// `config/assistant.yaml`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, GatewayError> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&explicit));
        if candidate.exists() {
            return Ok(candidate);
        }
        return Err(GatewayError::ConfigError {
            reason: format!("{CONFIG_ENV_VAR} points to missing file {}", candidate.display()),
        });
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_RELATIVE_PATH);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(GatewayError::ConfigError {
        reason: format!("could not find {CONFIG_RELATIVE_PATH}"),
    })
}

/// Load, interpolate, parse and validate the configuration file.
///
/// Performs environment-variable interpolation on string values matching
/// `${VAR_NAME}` or `${VAR_NAME:-default}`.
pub fn load_config(path: &Path) -> Result<AssistantConfig, GatewayError> {
    let raw = std::fs::read_to_string(path).map_err(|e| GatewayError::ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_config(&raw)
}

/// Parse configuration text (already read from disk).
pub fn parse_config(raw: &str) -> Result<AssistantConfig, GatewayError> {
    let interpolated = interpolate_env_vars(raw);

    let config: AssistantConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| GatewayError::ConfigError {
            reason: format!("failed to parse config: {e}"),
        })?;

    config.validate()?;
    Ok(config)
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
pub(crate) fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
