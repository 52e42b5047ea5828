//! Orchestrator for one record.
//!
//! A [`Researcher`] runs its stages in a fixed order inside a fresh session
//! and stage context per record, accumulates usage from every model call,
//! normalizes the final stage's text and re-checks the profile's links
//! against the candidates surfaced during the run.

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::candidates::{CandidateFinder, CandidateSet, Platform, SelectedLinks};
use crate::config::PipelineSettings;
use crate::context::StageContext;
use crate::error::{ResearchError, Result};
use crate::llm::LanguageModel;
use crate::normalize::{normalize, NormalizeError};
use crate::profile::ResearchProfile;
use crate::record::ResearchRecord;
use crate::search::WebSearcher;
use crate::session::{Session, SessionStore};
use crate::stages::{CandidateLinkStage, FormatStage, RunState, SearchStage, Stage, StageOutput};
use crate::usage::UsageReport;

/// Which pipeline to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    AlumniResearcher,
    EmailFinder,
}

impl PipelineMode {
    pub const SUPPORTED: [PipelineMode; 2] = [PipelineMode::AlumniResearcher, PipelineMode::EmailFinder];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlumniResearcher => "alumni_researcher",
            Self::EmailFinder => "email_finder",
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineMode {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        Self::SUPPORTED
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::SUPPORTED.iter().map(|m| m.as_str()).collect();
                ResearchError::Mode(format!(
                    "unknown mode '{}', supported modes: {}",
                    s.trim(),
                    supported.join(", ")
                ))
            })
    }
}

/// Result of researching one record.
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub session_id: Uuid,
    /// Text of the last stage, before normalization
    pub raw_output: String,
    pub profile: std::result::Result<ResearchProfile, NormalizeError>,
    pub selected_links: SelectedLinks,
    /// Profile links cleared because they were never candidates
    pub cleared_links: Vec<(Platform, String)>,
    pub usage: UsageReport,
}

/// Runs the staged pipeline for one record at a time.
pub struct Researcher {
    mode: PipelineMode,
    stages: Vec<Stage>,
    model: Arc<dyn LanguageModel>,
    sessions: Arc<dyn SessionStore>,
    user_id: String,
}

impl Researcher {
    /// Build the pipeline for `mode`.
    pub fn build(
        mode: PipelineMode,
        settings: &PipelineSettings,
        model: Arc<dyn LanguageModel>,
        searcher: Arc<dyn WebSearcher>,
        sessions: Arc<dyn SessionStore>,
        user_id: impl Into<String>,
    ) -> Result<Self> {
        let stages = match mode {
            PipelineMode::AlumniResearcher => vec![
                Stage::Search(SearchStage::new(
                    settings.search.clone(),
                    searcher.clone(),
                    settings.search_max_results,
                )),
                Stage::CandidateLinks(CandidateLinkStage::new(
                    settings.social.clone(),
                    CandidateFinder::new(searcher, settings.social_max_links),
                )),
                Stage::Format(FormatStage::new(settings.formatter.clone())),
            ],
            PipelineMode::EmailFinder => {
                return Err(ResearchError::Mode(format!("{mode} is not implemented yet")));
            }
        };

        Ok(Self {
            mode,
            stages,
            model,
            sessions,
            user_id: user_id.into(),
        })
    }

    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Research one record.
    ///
    /// A failing stage aborts the record with [`ResearchError::Stage`]. A
    /// final text that does not normalize is not an error here; it is
    /// reported through [`ResearchOutcome::profile`] with the usage so far.
    pub async fn research(&self, record: &ResearchRecord) -> Result<ResearchOutcome> {
        let started = Instant::now();
        let mut session = self
            .sessions
            .create(self.mode.as_str(), &self.user_id, initial_state(record))
            .await?;

        info!(
            record = %record.full_name,
            year = record.context_year,
            session_id = %session.id,
            "Researching record"
        );

        let mut context = StageContext::new(record.query());
        let state = RunState::new();
        let mut usage = UsageReport::new();
        let mut selected_links = SelectedLinks::default();
        let mut raw_output = String::new();

        for stage in &self.stages {
            let stage_started = Instant::now();
            let run = match stage.run(self.model.as_ref(), &context, &state).await {
                Ok(run) => run,
                Err(e) => {
                    let err = ResearchError::in_stage(stage.name(), e);
                    self.mark_failed(&mut session, &err).await;
                    return Err(err);
                }
            };

            for (idx, turn_usage) in run.reply.usage.iter().enumerate() {
                usage.record(stage.name(), idx + 1, Some(turn_usage));
            }
            if run.reply.usage.is_empty() {
                usage.record(stage.name(), 1, None);
            }

            info!(
                record = %record.full_name,
                stage = stage.name(),
                duration_ms = stage_started.elapsed().as_millis() as u64,
                "Stage finished"
            );

            raw_output = run.output.context_text();
            if let StageOutput::Selections(links) = run.output {
                selected_links = links;
            }
            context.push_stage_output(stage.name(), raw_output.clone());

            session.turns = context.turns().to_vec();
            self.sessions.save(&session).await?;
        }

        let candidates = state.candidates.lock().await.clone();
        let mut cleared_links = Vec::new();
        let profile = normalize(&raw_output).map(|mut profile| {
            cleared_links = clear_unlisted_links(&mut profile, &candidates);
            profile
        });

        session.state.insert(
            "status".into(),
            Value::from(if profile.is_ok() { "complete" } else { "unparsed" }),
        );
        self.sessions.save(&session).await?;

        info!(
            record = %record.full_name,
            total_tokens = usage.totals.total,
            duration_ms = started.elapsed().as_millis() as u64,
            normalized = profile.is_ok(),
            "Record finished"
        );

        Ok(ResearchOutcome {
            session_id: session.id,
            raw_output,
            profile,
            selected_links,
            cleared_links,
            usage,
        })
    }

    async fn mark_failed(&self, session: &mut Session, err: &ResearchError) {
        session.state.insert("status".into(), Value::from("failed"));
        session.state.insert("error".into(), Value::from(err.to_string()));
        if let Err(save_err) = self.sessions.save(session).await {
            warn!(session_id = %session.id, error = %save_err, "Failed to record stage failure in session");
        }
    }
}

fn initial_state(record: &ResearchRecord) -> Map<String, Value> {
    let mut state = Map::new();
    state.insert("full_name".into(), Value::from(record.full_name.clone()));
    state.insert("context_year".into(), Value::from(record.context_year));
    state.insert("instructions".into(), Value::from(record.instructions.clone()));
    state
}

/// Clear profile links that are not candidates for their platform.
fn clear_unlisted_links(profile: &mut ResearchProfile, candidates: &CandidateSet) -> Vec<(Platform, String)> {
    let mut cleared = Vec::new();
    for platform in Platform::ALL {
        let link = profile.link_mut(platform);
        if link.trim().is_empty() {
            link.clear();
            continue;
        }
        if !(platform.matches(link) && candidates.contains(platform, link)) {
            warn!(platform = %platform, url = %link, "Clearing profile link that was not a candidate");
            cleared.push((platform, std::mem::take(link)));
        }
    }
    cleared
}
