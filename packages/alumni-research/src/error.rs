//! Typed errors for the research library.
//!
//! Uses `thiserror` for library errors; the binary wraps them with `anyhow`.

use openai_client::OpenAIError;
use thiserror::Error;

/// Errors that can abort a research run or a batch.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// A pipeline stage failed; the record is abandoned
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<ResearchError>,
    },

    /// Language-model oracle failed
    #[error("LLM error: {0}")]
    Llm(#[from] OpenAIError),

    /// Search oracle failed
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Session store failed
    #[error("session store error: {0}")]
    Session(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Session was expected but is not in the store
    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    /// Unknown or unsupported pipeline mode
    #[error("invalid pipeline mode: {0}")]
    Mode(String),

    /// Input record could not be built
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Tabular input/output failed
    #[error("table error: {0}")]
    Table(#[from] csv::Error),

    /// File system error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResearchError {
    /// Wrap an error with the name of the stage that raised it.
    pub fn in_stage(stage: impl Into<String>, source: ResearchError) -> Self {
        Self::Stage {
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// Build a search error from any message.
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search(message.into().into())
    }
}

/// Result type alias for research operations.
pub type Result<T> = std::result::Result<T, ResearchError>;
