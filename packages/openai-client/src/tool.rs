//! Tool calling traits and types for OpenAI function calling.
//!
//! A [`Tool`] has typed arguments (schema generated with `schemars`) and a
//! serializable output. Agents hold tools as [`ErasedTool`] trait objects so
//! tools of different types can share one list.
//!
//! # Example
//!
//! ```rust,ignore
//! #[derive(Deserialize, JsonSchema)]
//! struct LookupArgs {
//!     name: String,
//! }
//!
//! struct Lookup;
//!
//! #[async_trait]
//! impl Tool for Lookup {
//!     const NAME: &'static str = "lookup";
//!     type Args = LookupArgs;
//!     type Output = Vec<String>;
//!     type Error = std::io::Error;
//!
//!     fn description(&self) -> &str {
//!         "Look up a person by name"
//!     }
//!
//!     async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
//!         Ok(vec![args.name])
//!     }
//! }
//! ```

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::schema::StructuredOutput;

/// A tool that can be called by the OpenAI model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    const NAME: &'static str;

    /// The argument type for this tool (must derive `Deserialize` and `JsonSchema`).
    type Args: DeserializeOwned + JsonSchema + Send;

    /// The output type for this tool (must derive `Serialize`).
    type Output: Serialize + Send;

    /// The error type for this tool.
    type Error: std::error::Error + Send + Sync + 'static;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// Execute the tool with the given arguments.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;

    /// Generate the OpenAI tool definition for this tool.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: self.description().to_string(),
            parameters: Self::Args::openai_schema(),
        }
    }
}

/// OpenAI tool definition format.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// The name of the tool.
    pub name: String,

    /// A description of what the tool does.
    pub description: String,

    /// JSON schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Convert to OpenAI API format.
    pub fn to_openai_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
                "strict": true
            }
        })
    }
}

/// A tool call from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// The ID of this tool call (for matching responses).
    pub id: String,

    /// The name of the tool to call.
    pub name: String,

    /// The arguments as a JSON string.
    pub arguments: String,
}

impl ToolCall {
    /// Parse a tool call from OpenAI's response format.
    pub fn from_openai_value(value: &serde_json::Value) -> Option<Self> {
        let function = value.get("function")?;
        Some(Self {
            id: value.get("id")?.as_str()?.to_string(),
            name: function.get("name")?.as_str()?.to_string(),
            arguments: function.get("arguments")?.as_str()?.to_string(),
        })
    }
}

/// Type-erased tool for storing heterogeneous tools in collections.
#[async_trait]
pub trait ErasedTool: Send + Sync {
    /// Get the tool's name.
    fn name(&self) -> &str;

    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with JSON arguments, returning JSON output.
    async fn call_erased(&self, arguments: &str) -> Result<String, ToolError>;
}

/// Error type for erased tool calls.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Failed to parse tool arguments.
    #[error("Failed to parse arguments: {0}")]
    ArgumentParse(String),

    /// Tool execution failed.
    #[error("Tool execution failed: {0}")]
    Execution(String),

    /// Failed to serialize tool output.
    #[error("Failed to serialize output: {0}")]
    OutputSerialize(String),
}

#[async_trait]
impl<T: Tool> ErasedTool for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn definition(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    async fn call_erased(&self, arguments: &str) -> Result<String, ToolError> {
        let args: T::Args = serde_json::from_str(arguments)
            .map_err(|e| ToolError::ArgumentParse(e.to_string()))?;

        let output = self
            .call(args)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        serde_json::to_string(&output).map_err(|e| ToolError::OutputSerialize(e.to_string()))
    }
}
