use std::sync::Arc;
use tracing::info;

use super::{prompts::SEARCH_PROMPT, StageOutput, StageRun};
use crate::config::StageSettings;
use crate::context::StageContext;
use crate::error::Result;
use crate::llm::{LanguageModel, StageRequest};
use crate::search::WebSearcher;
use crate::tools::WebSearchTool;

pub const NAME: &str = "search";

/// Researches current practices with the web search tool.
pub struct SearchStage {
    settings: StageSettings,
    searcher: Arc<dyn WebSearcher>,
    max_results: usize,
}

impl SearchStage {
    pub fn new(settings: StageSettings, searcher: Arc<dyn WebSearcher>, max_results: usize) -> Self {
        Self {
            settings,
            searcher,
            max_results,
        }
    }

    pub async fn run(&self, model: &dyn LanguageModel, context: &StageContext) -> Result<StageRun> {
        let request = StageRequest {
            stage: NAME,
            settings: self.settings.clone(),
            messages: context.to_messages(SEARCH_PROMPT),
            tools: vec![Box::new(WebSearchTool::new(self.searcher.clone(), self.max_results))],
            response_format: None,
        };

        let reply = model.respond(request).await?;
        info!(
            tool_calls = reply.tool_calls_made.len(),
            findings_len = reply.content.len(),
            "Search stage complete"
        );

        Ok(StageRun {
            output: StageOutput::Findings(reply.content.clone()),
            reply,
        })
    }
}
