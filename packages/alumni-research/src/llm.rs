//! Language-model oracle.
//!
//! Stages describe one reasoning step as a [`StageRequest`]; a
//! [`LanguageModel`] runs it (including any tool calls) and answers with the
//! final text plus the usage reported by every call it made.

use async_trait::async_trait;
use openai_client::{ErasedTool, Message, OpenAIClient, ResponseFormat, Usage};

use crate::config::StageSettings;
use crate::error::Result;

/// One reasoning step of a stage.
pub struct StageRequest {
    /// Stage name, used for logging and usage attribution
    pub stage: &'static str,
    pub settings: StageSettings,
    /// System instructions first, then the stage context
    pub messages: Vec<Message>,
    pub tools: Vec<Box<dyn ErasedTool>>,
    pub response_format: Option<ResponseFormat>,
}

impl StageRequest {
    /// All message text joined, for matching in logs and test doubles.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(Message::content_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Final answer of a reasoning step.
#[derive(Debug, Clone, Default)]
pub struct StageReply {
    pub content: String,
    /// Usage per model call, in call order
    pub usage: Vec<Usage>,
    pub tool_calls_made: Vec<String>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn respond(&self, request: StageRequest) -> Result<StageReply>;
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    async fn respond(&self, request: StageRequest) -> Result<StageReply> {
        let StageRequest {
            settings,
            messages,
            tools,
            response_format,
            ..
        } = request;

        let mut builder = self
            .agent(settings.model)
            .tools(tools)
            .max_iterations(settings.max_iterations);
        if let Some(effort) = settings.reasoning_effort {
            builder = builder.reasoning_effort(effort);
        }
        if let Some(format) = response_format {
            builder = builder.response_format(format);
        }

        let response = builder.build().chat_with_history(messages).await?;

        Ok(StageReply {
            content: response.content,
            usage: response.usage,
            tool_calls_made: response.tool_calls_made,
        })
    }
}
