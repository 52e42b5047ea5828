//! Tools handed to the reasoning stages.
//!
//! - [`WebSearchTool`] - unfiltered keyword search for the search stage
//! - [`SocialCandidatesTool`] - per-platform candidate report for the
//!   candidate-link stage; records every surfaced URL in the run's
//!   [`CandidateSet`]

use async_trait::async_trait;
use openai_client::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::candidates::{CandidateFinder, CandidateSet};
use crate::error::ResearchError;
use crate::search::{SearchResult, WebSearcher};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WebSearchArgs {
    /// A single information-dense keyword query
    pub query: String,
}

/// Keyword web search.
pub struct WebSearchTool {
    searcher: Arc<dyn WebSearcher>,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(searcher: Arc<dyn WebSearcher>, max_results: usize) -> Self {
        Self { searcher, max_results }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    const NAME: &'static str = "web_search";
    type Args = WebSearchArgs;
    type Output = Vec<SearchResult>;
    type Error = ResearchError;

    fn description(&self) -> &str {
        "Search the web. Returns title, url and snippet for each result."
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        info!(query = %args.query, "web_search called");
        self.searcher.search_with_limit(&args.query, self.max_results).await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SocialCandidatesArgs {
    /// Full name of the person
    pub alumni_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialCandidatesOutput {
    pub action: String,
    pub alumni_name: String,
    pub message: String,
    pub candidate_links_markdown: String,
}

/// Candidate social-profile links for one person.
///
/// The result limit per platform is fixed by configuration; the model only
/// supplies the name.
pub struct SocialCandidatesTool {
    finder: CandidateFinder,
    candidates: Arc<Mutex<CandidateSet>>,
}

impl SocialCandidatesTool {
    pub fn new(finder: CandidateFinder, candidates: Arc<Mutex<CandidateSet>>) -> Self {
        Self { finder, candidates }
    }
}

#[async_trait]
impl Tool for SocialCandidatesTool {
    const NAME: &'static str = "search_social_media_candidates";
    type Args = SocialCandidatesArgs;
    type Output = SocialCandidatesOutput;
    type Error = ResearchError;

    fn description(&self) -> &str {
        "Find candidate X (Twitter), LinkedIn, Doximity, Google Scholar and Facebook profile links \
         for a person. Takes only the person's full name. Returns a markdown report."
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let name = args.alumni_name.trim();
        if name.is_empty() {
            return Ok(SocialCandidatesOutput {
                action: "search_social_media_candidates".into(),
                alumni_name: String::new(),
                message: "Error: alumni_name is empty".into(),
                candidate_links_markdown: String::new(),
            });
        }

        let report = self.finder.search_candidates(name).await;
        self.candidates.lock().await.extend_from(&report);

        Ok(SocialCandidatesOutput {
            action: "search_social_media_candidates".into(),
            alumni_name: name.to_string(),
            message: format!(
                "Found {} candidate link(s) across {} platforms",
                report.total_links(),
                report.platforms.len()
            ),
            candidate_links_markdown: report.to_markdown(),
        })
    }
}
