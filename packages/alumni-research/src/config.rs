use openai_client::ReasoningEffort;
use std::env;
use std::num::NonZeroUsize;

use crate::credentials::SecretString;
use crate::error::{ResearchError, Result};

/// Default chat model for every stage.
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// Results collected per platform by the candidate-link search.
pub const DEFAULT_SOCIAL_MAX_LINKS: usize = 20;

/// Results returned per query by the search stage's web search tool.
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 10;

/// Model settings for one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    pub model: String,
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Upper bound on model calls within the stage (tool loop iterations)
    pub max_iterations: usize,
}

impl StageSettings {
    pub fn new(model: impl Into<String>, reasoning_effort: ReasoningEffort) -> Self {
        Self {
            model: model.into(),
            reasoning_effort: Some(reasoning_effort),
            max_iterations: 8,
        }
    }
}

/// Per-stage settings for the research pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub search: StageSettings,
    pub social: StageSettings,
    pub formatter: StageSettings,
    pub search_max_results: usize,
    pub social_max_links: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            search: StageSettings::new(DEFAULT_MODEL, ReasoningEffort::Medium),
            social: StageSettings::new(DEFAULT_MODEL, ReasoningEffort::Medium),
            formatter: StageSettings::new(DEFAULT_MODEL, ReasoningEffort::Low),
            search_max_results: DEFAULT_SEARCH_MAX_RESULTS,
            social_max_links: DEFAULT_SOCIAL_MAX_LINKS,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: SecretString,
    pub openai_base_url: Option<String>,
    pub tavily_api_key: SecretString,
    /// SQLite URL for the session store; in-memory sessions when absent
    pub session_database_url: Option<String>,
    pub user_id: String,
    pub pipeline: PipelineSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let defaults = PipelineSettings::default();
        let pipeline = PipelineSettings {
            search: StageSettings {
                model: var_or("RESEARCH_SEARCH_MODEL", DEFAULT_MODEL),
                ..defaults.search
            },
            social: StageSettings {
                model: var_or("RESEARCH_SOCIAL_MODEL", DEFAULT_MODEL),
                ..defaults.social
            },
            formatter: StageSettings {
                model: var_or("RESEARCH_FORMATTER_MODEL", DEFAULT_MODEL),
                ..defaults.formatter
            },
            search_max_results: parse_var("RESEARCH_SEARCH_MAX_RESULTS", defaults.search_max_results)?,
            social_max_links: parse_var("RESEARCH_SOCIAL_MAX_LINKS", defaults.social_max_links)?,
        };

        Ok(Self {
            openai_api_key: required_secret("OPENAI_API_KEY")?,
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            tavily_api_key: required_secret("TAVILY_API_KEY")?,
            session_database_url: env::var("RESEARCH_SESSION_DB").ok(),
            user_id: var_or("RESEARCH_USER_ID", "researcher"),
            pipeline,
        })
    }
}

fn required_secret(name: &str) -> Result<SecretString> {
    let secret = env::var(name)
        .map(SecretString::from)
        .map_err(|_| ResearchError::Config(format!("{name} must be set")))?;
    if secret.is_empty() {
        return Err(ResearchError::Config(format!("{name} must not be empty")));
    }
    Ok(secret)
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<NonZeroUsize>()
            .map(NonZeroUsize::get)
            .map_err(|_| ResearchError::Config(format!("{name} must be a positive number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
