//! Pipeline stages.
//!
//! The pipeline is a fixed sequence drawn from a closed set of stage kinds:
//!
//! - [`SearchStage`] - tool-using research over web search, free-text findings
//! - [`CandidateLinkStage`] - closed-set selection of one link per platform
//! - [`FormatStage`] - schema-constrained mapping into a profile
//!
//! Every stage reads the record's [`StageContext`] and returns a typed
//! [`StageOutput`] together with the raw model reply.

pub mod candidate_links;
pub mod format;
pub mod prompts;
pub mod search;

pub use candidate_links::CandidateLinkStage;
pub use format::FormatStage;
pub use search::SearchStage;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::candidates::{CandidateSet, SelectedLinks};
use crate::context::StageContext;
use crate::error::Result;
use crate::llm::{LanguageModel, StageReply};

/// Per-record state shared between stages of one run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Every candidate link surfaced during the run
    pub candidates: Arc<Mutex<CandidateSet>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Typed result of a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    /// Free-text research findings
    Findings(String),
    /// Links kept after closed-set enforcement
    Selections(SelectedLinks),
    /// Raw structured-output text, not yet normalized
    Formatted(String),
}

impl StageOutput {
    /// Text appended to the stage context for later stages.
    pub fn context_text(&self) -> String {
        match self {
            Self::Findings(text) | Self::Formatted(text) => text.clone(),
            Self::Selections(links) => links.to_lines(),
        }
    }
}

/// What a stage produced, plus the model reply behind it.
#[derive(Debug, Clone)]
pub struct StageRun {
    pub output: StageOutput,
    pub reply: StageReply,
}

pub enum Stage {
    Search(SearchStage),
    CandidateLinks(CandidateLinkStage),
    Format(FormatStage),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Search(_) => search::NAME,
            Self::CandidateLinks(_) => candidate_links::NAME,
            Self::Format(_) => format::NAME,
        }
    }

    pub async fn run(
        &self,
        model: &dyn LanguageModel,
        context: &StageContext,
        state: &RunState,
    ) -> Result<StageRun> {
        match self {
            Self::Search(stage) => stage.run(model, context).await,
            Self::CandidateLinks(stage) => stage.run(model, context, state).await,
            Self::Format(stage) => stage.run(model, context).await,
        }
    }
}
