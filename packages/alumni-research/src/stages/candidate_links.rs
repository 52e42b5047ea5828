use tracing::info;

use super::{prompts::CANDIDATE_LINKS_PROMPT, RunState, StageOutput, StageRun};
use crate::candidates::{CandidateFinder, SelectedLinks};
use crate::config::StageSettings;
use crate::context::StageContext;
use crate::error::Result;
use crate::llm::{LanguageModel, StageRequest};
use crate::tools::SocialCandidatesTool;

pub const NAME: &str = "candidate_links";

/// Selects at most one link per platform from the run's candidates.
///
/// The model's "Platform: URL" answer is parsed, and any URL that the
/// candidate tool did not surface during this run is dropped.
pub struct CandidateLinkStage {
    settings: StageSettings,
    finder: CandidateFinder,
}

impl CandidateLinkStage {
    pub fn new(settings: StageSettings, finder: CandidateFinder) -> Self {
        Self { settings, finder }
    }

    pub async fn run(
        &self,
        model: &dyn LanguageModel,
        context: &StageContext,
        state: &RunState,
    ) -> Result<StageRun> {
        let tool = SocialCandidatesTool::new(self.finder.clone(), state.candidates.clone());
        let request = StageRequest {
            stage: NAME,
            settings: self.settings.clone(),
            messages: context.to_messages(CANDIDATE_LINKS_PROMPT),
            tools: vec![Box::new(tool)],
            response_format: None,
        };

        let reply = model.respond(request).await?;

        let mut selected = SelectedLinks::parse(&reply.content);
        let candidates = state.candidates.lock().await;
        let dropped = selected.retain_candidates(&candidates);
        info!(
            candidates = candidates.len(),
            selected = selected.iter().filter(|(_, url)| !url.is_empty()).count(),
            dropped = dropped.len(),
            "Candidate-link stage complete"
        );
        drop(candidates);

        Ok(StageRun {
            output: StageOutput::Selections(selected),
            reply,
        })
    }
}
