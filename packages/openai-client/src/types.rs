//! OpenAI API request and response types.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

// =============================================================================
// Messages
// =============================================================================

/// Chat message.
///
/// Covers the four roles the chat-completions API accepts. Assistant messages
/// that request tools carry `tool_calls` in the raw API shape; tool results
/// carry the `tool_call_id` they answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", "assistant", "tool"
    pub role: String,

    /// Message content (absent on assistant messages that only call tools)
    #[serde(default)]
    pub content: Option<String>,

    /// Tool calls requested by the assistant, verbatim from the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<serde_json::Value>>,

    /// ID of the tool call this message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content)
    }

    /// Create a tool result message.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::text("tool", content)
        }
    }

    /// Whether this is a system message.
    pub fn is_system(&self) -> bool {
        self.role == "system"
    }

    /// Content as a string slice (empty when absent).
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

// =============================================================================
// Reasoning
// =============================================================================

/// How much hidden reasoning a reasoning model may spend before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    /// Check if a model accepts `reasoning_effort` (and `max_completion_tokens`).
    pub fn is_supported_by(model: &str) -> bool {
        model.starts_with("o1")
            || model.starts_with("o3")
            || model.starts_with("o4")
            || model.starts_with("gpt-5")
            || model.contains("-o1")
            || model.contains("-o3")
    }
}

impl std::str::FromStr for ReasoningEffort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown reasoning effort: {other}")),
        }
    }
}

// =============================================================================
// Usage
// =============================================================================

/// Token usage statistics for one API call.
///
/// Every counter defaults to zero, absent or `null`, so partial usage blocks
/// still parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default, deserialize_with = "null_as_zero")]
    pub prompt_tokens: u64,

    /// Tokens in the completion
    #[serde(default, deserialize_with = "null_as_zero")]
    pub completion_tokens: u64,

    /// Total tokens used
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_tokens: u64,

    /// Prompt breakdown (cache hits, modalities)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens_details: Option<PromptTokensDetails>,

    /// Completion breakdown (reasoning, modalities)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens_details: Option<CompletionTokensDetails>,
}

impl Usage {
    /// Parse the `usage` block of a raw response, if there is one.
    pub fn from_response(response: &serde_json::Value) -> Option<Self> {
        let usage = response.get("usage")?;
        if usage.is_null() {
            return None;
        }
        match serde_json::from_value(usage.clone()) {
            Ok(usage) => Some(usage),
            Err(e) => {
                warn!(error = %e, "Unreadable usage block in response");
                None
            }
        }
    }

    /// Prompt tokens served from the provider's prompt cache.
    pub fn cached_tokens(&self) -> u64 {
        self.prompt_tokens_details
            .as_ref()
            .map(|d| d.cached_tokens)
            .unwrap_or(0)
    }

    /// Hidden reasoning tokens spent by the model.
    pub fn reasoning_tokens(&self) -> u64 {
        self.completion_tokens_details
            .as_ref()
            .map(|d| d.reasoning_tokens)
            .unwrap_or(0)
    }
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Prompt token breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTokensDetails {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cached_tokens: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub text_tokens: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub image_tokens: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub audio_tokens: u64,
}

/// Completion token breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionTokensDetails {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub reasoning_tokens: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub text_tokens: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub audio_tokens: u64,
}

// =============================================================================
// Structured Output
// =============================================================================

/// Response format with JSON schema.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    pub json_schema: JsonSchemaFormat,
}

impl ResponseFormat {
    /// Strict `json_schema` response format.
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: name.into(),
                strict: true,
                schema,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

// =============================================================================
// Utilities
// =============================================================================

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}
