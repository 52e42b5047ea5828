//! Alumni Research Pipeline
//!
//! Researches the current practices and public profiles of radiology alumni
//! with a fixed sequence of language-model stages over web search, and turns
//! the result into one structured row per person.
//!
//! # Flow
//!
//! ```text
//! record ─▶ search ─▶ candidate links ─▶ format ─▶ normalize ─▶ output row
//! ```
//!
//! Every stage sees the record's query and the outputs of the stages before
//! it. Social links may only be chosen from candidates the search oracle
//! actually returned during the run; anything else is dropped.
//!
//! # Usage
//!
//! ```rust,ignore
//! use alumni_research::{PipelineMode, PipelineSettings, Researcher, ResearchRecord};
//! use alumni_research::session::MemorySessionStore;
//!
//! let researcher = Researcher::build(
//!     PipelineMode::AlumniResearcher,
//!     &PipelineSettings::default(),
//!     Arc::new(openai),
//!     Arc::new(tavily),
//!     Arc::new(MemorySessionStore::new()),
//!     "researcher",
//! )?;
//!
//! let outcome = researcher.research(&ResearchRecord::new("Jane Doe", 2005)?).await?;
//! ```
//!
//! # Modules
//!
//! - [`pipeline`] - Orchestrator and pipeline modes
//! - [`stages`] - Search, candidate-link and format stages
//! - [`candidates`] - Platform filtering, candidate reports, closed-set selection
//! - [`normalize`] - Tolerant JSON extraction and schema validation
//! - [`usage`] - Token accounting
//! - [`session`] - Session stores
//! - [`batch`] / [`table`] - CSV batch driver
//! - [`testing`] - Mock oracles

pub mod batch;
pub mod candidates;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod record;
pub mod search;
pub mod session;
pub mod stages;
pub mod table;
pub mod testing;
pub mod tools;
pub mod usage;

pub use batch::{run_batch, BatchObserver, BatchOptions, BatchSummary};
pub use candidates::{CandidateFinder, CandidateLink, CandidateReport, CandidateSet, Platform, SelectedLinks};
pub use config::{Config, PipelineSettings, StageSettings};
pub use context::StageContext;
pub use credentials::SecretString;
pub use error::{ResearchError, Result};
pub use llm::{LanguageModel, StageReply, StageRequest};
pub use normalize::{normalize, NormalizeError};
pub use pipeline::{PipelineMode, ResearchOutcome, Researcher};
pub use profile::ResearchProfile;
pub use record::{parse_entry_year, ResearchRecord};
pub use search::{SearchResult, TavilyWebSearcher, WebSearcher};
pub use session::{MemorySessionStore, Session, SessionStore};
pub use table::OutputRow;
pub use usage::{UsageCounters, UsageReport};

#[cfg(feature = "sqlite")]
pub use session::SqliteSessionStore;
