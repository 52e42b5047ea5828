use openai_client::StructuredOutput;
use tracing::info;

use super::{prompts::FORMAT_PROMPT, StageOutput, StageRun};
use crate::config::StageSettings;
use crate::context::StageContext;
use crate::error::Result;
use crate::llm::{LanguageModel, StageRequest};
use crate::profile::ResearchProfile;

pub const NAME: &str = "format";

/// Maps earlier findings into the [`ResearchProfile`] schema.
pub struct FormatStage {
    settings: StageSettings,
}

impl FormatStage {
    pub fn new(settings: StageSettings) -> Self {
        Self { settings }
    }

    pub async fn run(&self, model: &dyn LanguageModel, context: &StageContext) -> Result<StageRun> {
        let request = StageRequest {
            stage: NAME,
            settings: self.settings.clone(),
            messages: context.to_messages(FORMAT_PROMPT),
            tools: Vec::new(),
            response_format: Some(ResearchProfile::response_format()),
        };

        let reply = model.respond(request).await?;
        info!(output_len = reply.content.len(), "Format stage complete");

        Ok(StageRun {
            output: StageOutput::Formatted(reply.content.clone()),
            reply,
        })
    }
}
