//! Test doubles for the search and language-model oracles.
//!
//! Used by unit tests and the integration tests under `tests/`.

use async_trait::async_trait;
use openai_client::{ErasedTool, OpenAIError, Usage};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use crate::error::{ResearchError, Result};
use crate::llm::{LanguageModel, StageReply, StageRequest};
use crate::search::{SearchResult, WebSearcher};

/// Web searcher with canned results per exact query.
///
/// Unknown queries return no results.
#[derive(Debug, Default)]
pub struct MockWebSearcher {
    results: HashMap<String, Vec<SearchResult>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        self.results.insert(query.into(), results);
        self
    }

    /// Make the exact query fail.
    pub fn failing_on(mut self, query: impl Into<String>) -> Self {
        self.failing.insert(query.into());
        self
    }

    /// Queries received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search_with_limit(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        if self.failing.contains(query) {
            return Err(ResearchError::search(format!("mock search failure for '{query}'")));
        }

        Ok(self
            .results
            .get(query)
            .map(|results| results.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// Scripted answer for one stage.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReply {
    /// Tool calls executed against the request's tools before answering: (tool name, JSON arguments)
    pub tool_calls: Vec<(String, String)>,
    pub content: String,
    pub usage: Vec<Usage>,
}

impl ScriptedReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_call(mut self, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        self.tool_calls.push((name.into(), arguments.into()));
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage.push(usage);
        self
    }
}

/// What the model saw for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub stage: String,
    pub model: String,
    pub transcript: String,
    pub tools: Vec<String>,
    pub structured: bool,
    /// Raw outputs of the scripted tool calls
    pub tool_outputs: Vec<String>,
}

/// Language model that answers from a script keyed by stage name.
#[derive(Debug, Default)]
pub struct MockLanguageModel {
    replies: HashMap<String, ScriptedReply>,
    failures: Vec<String>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, stage: impl Into<String>, reply: ScriptedReply) -> Self {
        self.replies.insert(stage.into(), reply);
        self
    }

    /// Fail every call whose messages contain `needle`.
    pub fn failing_when_prompt_contains(mut self, needle: impl Into<String>) -> Self {
        self.failures.push(needle.into());
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn respond(&self, request: StageRequest) -> Result<StageReply> {
        let transcript = request.transcript();
        let mut recorded = RecordedRequest {
            stage: request.stage.to_string(),
            model: request.settings.model.clone(),
            transcript: transcript.clone(),
            tools: request.tools.iter().map(|t| t.name().to_string()).collect(),
            structured: request.response_format.is_some(),
            tool_outputs: Vec::new(),
        };

        let outcome = self.answer(&request, &transcript, &mut recorded).await;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);
        outcome
    }
}

impl MockLanguageModel {
    async fn answer(
        &self,
        request: &StageRequest,
        transcript: &str,
        recorded: &mut RecordedRequest,
    ) -> Result<StageReply> {
        if let Some(needle) = self.failures.iter().find(|n| transcript.contains(n.as_str())) {
            return Err(OpenAIError::Api(format!("mock failure triggered by '{needle}'")).into());
        }

        let script = self
            .replies
            .get(request.stage)
            .ok_or_else(|| OpenAIError::Parse(format!("no scripted reply for stage '{}'", request.stage)))?;

        let mut tool_calls_made = Vec::new();
        for (name, arguments) in &script.tool_calls {
            let tool = request
                .tools
                .iter()
                .find(|t| t.name() == name)
                .ok_or_else(|| OpenAIError::Parse(format!("stage has no tool '{name}'")))?;
            let output = tool
                .call_erased(arguments)
                .await
                .unwrap_or_else(|e| format!("Error: {e}"));
            recorded.tool_outputs.push(output);
            tool_calls_made.push(name.clone());
        }

        Ok(StageReply {
            content: script.content.clone(),
            usage: script.usage.clone(),
            tool_calls_made,
        })
    }
}
