//! Agent with automatic tool calling loop.
//!
//! # Example
//!
//! ```rust,ignore
//! let response = client
//!     .agent("gpt-5-mini")
//!     .tools(vec![Box::new(WebSearch) as Box<dyn ErasedTool>])
//!     .reasoning_effort(ReasoningEffort::Medium)
//!     .build()
//!     .chat_with_history(vec![
//!         Message::system("You are a research assistant"),
//!         Message::user("Where does Dr. Jane Doe practice?"),
//!     ])
//!     .await?;
//!
//! println!("{} ({} API calls)", response.content, response.iterations);
//! ```

use crate::tool::{ErasedTool, ToolCall};
use crate::types::{truncate_to_char_boundary, Message, ReasoningEffort, ResponseFormat, Usage};
use crate::{OpenAIClient, OpenAIError, Result};
use tracing::{debug, info, warn};

/// Builder for creating an Agent.
pub struct AgentBuilder<'a> {
    client: &'a OpenAIClient,
    model: String,
    tools: Vec<Box<dyn ErasedTool>>,
    max_iterations: usize,
    reasoning_effort: Option<ReasoningEffort>,
    response_format: Option<ResponseFormat>,
}

impl<'a> AgentBuilder<'a> {
    pub(crate) fn new(client: &'a OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            tools: Vec::new(),
            max_iterations: 10,
            reasoning_effort: None,
            response_format: None,
        }
    }

    /// Add already boxed tools.
    pub fn tools(mut self, tools: impl IntoIterator<Item = Box<dyn ErasedTool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Set the maximum number of API calls.
    ///
    /// Default is 10. The agent fails once the model is still requesting
    /// tools after this many calls.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the reasoning budget. Dropped for models that do not reason.
    pub fn reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    /// Constrain the final answer to a JSON schema.
    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Build the agent.
    pub fn build(self) -> Agent<'a> {
        Agent {
            client: self.client,
            model: self.model,
            tools: self.tools,
            max_iterations: self.max_iterations,
            reasoning_effort: self.reasoning_effort,
            response_format: self.response_format,
        }
    }
}

/// An AI agent that can use tools to accomplish tasks.
pub struct Agent<'a> {
    client: &'a OpenAIClient,
    model: String,
    tools: Vec<Box<dyn ErasedTool>>,
    max_iterations: usize,
    reasoning_effort: Option<ReasoningEffort>,
    response_format: Option<ResponseFormat>,
}

/// Response from an agent chat.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final text response from the agent.
    pub content: String,

    /// The tool calls that were made during the conversation.
    pub tool_calls_made: Vec<String>,

    /// Number of iterations (API calls) made.
    pub iterations: usize,

    /// Usage reported by each API call, in order. Calls that reported
    /// no usage are skipped.
    pub usage: Vec<Usage>,
}

impl<'a> Agent<'a> {
    /// Run the agent over a pre-built message history, system message first.
    pub async fn chat_with_history(&self, messages: Vec<Message>) -> Result<AgentResponse> {
        self.run_tool_loop(messages).await
    }

    /// Request body for one iteration.
    fn request_body(&self, messages: &[Message], tool_defs: &[serde_json::Value]) -> Result<serde_json::Value> {
        let mut request = serde_json::json!({
            "model": self.model,
            "messages": serde_json::to_value(messages)
                .map_err(|e| OpenAIError::Parse(format!("Failed to serialize messages: {}", e)))?,
        });

        if !tool_defs.is_empty() {
            request["tools"] = serde_json::Value::Array(tool_defs.to_vec());
            request["tool_choice"] = serde_json::json!("auto");
        }

        if let Some(effort) = self.reasoning_effort {
            if ReasoningEffort::is_supported_by(&self.model) {
                request["reasoning_effort"] = serde_json::json!(effort);
            }
        }

        if let Some(ref format) = self.response_format {
            request["response_format"] = serde_json::to_value(format)
                .map_err(|e| OpenAIError::Parse(format!("Failed to serialize response format: {}", e)))?;
        }

        Ok(request)
    }

    /// Core tool-calling loop.
    ///
    /// 1. Send the history to the model
    /// 2. If the model requests tool calls, execute them and append results
    /// 3. Repeat until the model answers with text or the budget runs out
    async fn run_tool_loop(&self, mut messages: Vec<Message>) -> Result<AgentResponse> {
        let mut tool_calls_made = Vec::new();
        let mut usage = Vec::new();
        let mut iterations = 0;

        let tool_defs: Vec<serde_json::Value> = self
            .tools
            .iter()
            .map(|t| t.definition().to_openai_format())
            .collect();

        loop {
            iterations += 1;

            if iterations > self.max_iterations {
                warn!(
                    max_iterations = self.max_iterations,
                    "Agent reached max iterations"
                );
                return Err(OpenAIError::MaxIterations(self.max_iterations));
            }

            info!(
                iteration = iterations,
                model = %self.model,
                message_count = messages.len(),
                tool_count = self.tools.len(),
                "Agent iteration starting"
            );

            let request = self.request_body(&messages, &tool_defs)?;
            let response = self.client.send_chat(&request).await?;

            if let Some(turn_usage) = Usage::from_response(&response) {
                debug!(
                    iteration = iterations,
                    total_tokens = turn_usage.total_tokens,
                    "Agent iteration usage"
                );
                usage.push(turn_usage);
            }

            let message: Message = response
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("message"))
                .cloned()
                .ok_or_else(|| OpenAIError::Parse("No message in response".into()))
                .and_then(|m| {
                    serde_json::from_value(m).map_err(|e| OpenAIError::Parse(e.to_string()))
                })?;

            let tool_calls = message.tool_calls.clone().unwrap_or_default();

            if tool_calls.is_empty() {
                let content = message.content.unwrap_or_default();

                info!(
                    iterations = iterations,
                    tool_calls_total = tool_calls_made.len(),
                    response_len = content.len(),
                    "Agent finished - final response received"
                );
                debug!(response_content = %content, "Agent final response content");

                return Ok(AgentResponse {
                    content,
                    tool_calls_made,
                    iterations,
                    usage,
                });
            }

            info!(
                iteration = iterations,
                tool_call_count = tool_calls.len(),
                "Agent received tool call request"
            );

            messages.push(message);

            for tc_value in &tool_calls {
                if let Some(reply) = self.answer_tool_call(tc_value, &mut tool_calls_made).await {
                    messages.push(reply);
                }
            }
        }
    }

    /// Tool message answering one requested call.
    ///
    /// Every call id in an assistant turn needs a matching tool message, so an
    /// unreadable call with an id still gets an error reply. `None` only when
    /// there is no id to answer.
    async fn answer_tool_call(
        &self,
        tc_value: &serde_json::Value,
        tool_calls_made: &mut Vec<String>,
    ) -> Option<Message> {
        let Some(tc) = ToolCall::from_openai_value(tc_value) else {
            warn!("Failed to parse tool call: {:?}", tc_value);
            let id = tc_value.get("id")?.as_str()?;
            return Some(Message::tool(id, "Error: malformed tool call, expected a function name and string arguments"));
        };

        info!(
            tool = %tc.name,
            id = %tc.id,
            arguments = %tc.arguments,
            "Executing tool call"
        );
        tool_calls_made.push(tc.name.clone());

        let result = self.execute_tool(&tc).await;

        info!(
            tool = %tc.name,
            result_len = result.len(),
            result_preview = %truncate_to_char_boundary(&result, 200),
            "Tool execution complete"
        );

        Some(Message::tool(tc.id, result))
    }

    /// Execute a single tool call. Failures are reported back to the model
    /// as text rather than aborting the loop.
    async fn execute_tool(&self, call: &ToolCall) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == call.name) else {
            warn!(tool = %call.name, "Unknown tool requested");
            return format!("Error: Unknown tool '{}'", call.name);
        };

        match tool.call_erased(&call.arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                format!("Error executing tool: {}", e)
            }
        }
    }
}
