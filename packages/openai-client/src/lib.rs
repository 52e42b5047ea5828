//! OpenAI chat-completions client
//!
//! A small client for the OpenAI API with no domain-specific logic.
//! Supports chat completions, strict structured outputs, function calling
//! through an agent loop, reasoning effort, and detailed token usage.
//!
//! # Structured Output
//!
//! ```rust,ignore
//! #[derive(Deserialize, JsonSchema)]
//! struct Practice {
//!     name: String,
//!     url: String,
//! }
//!
//! let format = Practice::response_format();
//! ```
//!
//! # Agent with Tools
//!
//! ```rust,ignore
//! let response = client
//!     .agent("gpt-5-mini")
//!     .tools(vec![Box::new(WebSearch) as Box<dyn ErasedTool>])
//!     .build()
//!     .chat_with_history(messages)
//!     .await?;
//! ```

pub mod agent;
pub mod error;
pub mod schema;
pub mod tool;
pub mod types;

pub use agent::{Agent, AgentBuilder, AgentResponse};
pub use error::{OpenAIError, Result};
pub use schema::StructuredOutput;
pub use tool::{ErasedTool, Tool, ToolCall, ToolDefinition, ToolError};
pub use types::*;

use reqwest::Client;
use tracing::warn;

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create an agent builder with the specified model.
    pub fn agent(&self, model: impl Into<String>) -> AgentBuilder<'_> {
        AgentBuilder::new(self, model)
    }

    /// POST a raw body to `/chat/completions` and return the raw JSON answer.
    pub(crate) async fn send_chat(&self, body: &serde_json::Value) -> Result<serde_json::Value> {
        if self.api_key.trim().is_empty() {
            return Err(OpenAIError::Config("API key is empty".into()));
        }

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(OpenAIError::Api(format!("OpenAI API error {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))
    }
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://custom.api.com");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://custom.api.com");
    }

    #[tokio::test]
    async fn test_empty_key_is_config_error() {
        let client = OpenAIClient::new("  ");
        let err = client.send_chat(&serde_json::json!({})).await.unwrap_err();

        assert!(matches!(err, OpenAIError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = OpenAIClient::new("sk-secret");
        let debug = format!("{:?}", client);

        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
