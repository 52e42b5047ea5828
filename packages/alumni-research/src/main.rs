//! Command-line front end for the alumni research pipeline.

use alumni_research::{
    normalize, run_batch, BatchObserver, BatchOptions, CandidateFinder, Config, MemorySessionStore,
    OutputRow, PipelineMode, Researcher, SessionStore, TavilyWebSearcher,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use openai_client::OpenAIClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "alumni-research")]
#[command(about = "Research alumni practices and profiles with staged LLM agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Research every row of an input CSV
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Only process the first N rows
        #[arg(long)]
        limit: Option<usize>,
        /// Extra instructions added to every query
        #[arg(long, default_value = "")]
        instructions: String,
        #[arg(long, default_value = "alumni_researcher")]
        mode: String,
    },

    /// Print the social media candidate report for one name
    Candidates {
        #[arg(long)]
        name: String,
    },

    /// Normalize a saved model response and print the profile
    Normalize {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,alumni_research=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            limit,
            instructions,
            mode,
        } => {
            let options = BatchOptions {
                input,
                output,
                limit,
                instructions,
            };
            run(options, &mode).await
        }
        Commands::Candidates { name } => candidates(&name).await,
        Commands::Normalize { file } => normalize_file(&file),
    }
}

async fn run(options: BatchOptions, mode: &str) -> Result<()> {
    let mode: PipelineMode = mode.parse()?;
    let config = Config::from_env().context("Failed to load configuration")?;

    let mut openai = OpenAIClient::new(config.openai_api_key.expose());
    if let Some(base_url) = &config.openai_base_url {
        openai = openai.with_base_url(base_url);
    }
    let searcher = TavilyWebSearcher::new(config.tavily_api_key.clone())?;
    let sessions = open_sessions(&config).await;

    let researcher = Researcher::build(
        mode,
        &config.pipeline,
        Arc::new(openai),
        Arc::new(searcher),
        sessions,
        config.user_id.clone(),
    )?;

    print_system(&format!(
        "Running {} ({}) over {}",
        mode,
        researcher.stage_names().join(" -> "),
        options.input.display()
    ));

    let summary = run_batch(&researcher, &options, &mut ConsoleProgress)
        .await
        .context("Batch failed")?;

    println!();
    print_system(&format!(
        "Processed {} record(s): {} succeeded, {} failed",
        summary.processed, summary.succeeded, summary.failed
    ));
    print_system(&format!(
        "Tokens: total {}, prompt {}, candidates {}, cached {}, thoughts {}",
        summary.usage.total,
        summary.usage.prompt,
        summary.usage.candidates,
        summary.usage.cached,
        summary.usage.thoughts
    ));
    println!("{}", format!("Results saved to {}", options.output.display()).green());
    Ok(())
}

/// SQLite sessions when configured, wiped at startup; in-memory otherwise or on failure.
#[cfg(feature = "sqlite")]
async fn open_sessions(config: &Config) -> Arc<dyn SessionStore> {
    let Some(url) = &config.session_database_url else {
        return Arc::new(MemorySessionStore::new());
    };

    match alumni_research::SqliteSessionStore::open(url).await {
        Ok(store) => {
            match store.reset().await {
                Ok(removed) => tracing::info!(removed, "Cleared previous sessions"),
                Err(e) => tracing::warn!(error = %e, "Could not clear previous sessions"),
            }
            Arc::new(store)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to open session database, using in-memory sessions");
            Arc::new(MemorySessionStore::new())
        }
    }
}

#[cfg(not(feature = "sqlite"))]
async fn open_sessions(config: &Config) -> Arc<dyn SessionStore> {
    if config.session_database_url.is_some() {
        tracing::warn!("Built without sqlite support, using in-memory sessions");
    }
    Arc::new(MemorySessionStore::new())
}

async fn candidates(name: &str) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let searcher = TavilyWebSearcher::new(config.tavily_api_key.clone())?;
    let finder = CandidateFinder::new(Arc::new(searcher), config.pipeline.social_max_links);

    let report = finder.search_candidates(name).await;
    println!("{}", report.to_markdown());
    Ok(())
}

fn normalize_file(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match normalize(&raw) {
        Ok(profile) => {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", format!("{e}").red());
            println!("{}", e.preview().dimmed());
            Err(e.into())
        }
    }
}

struct ConsoleProgress;

impl BatchObserver for ConsoleProgress {
    fn record_started(&mut self, index: usize, total: usize, name: &str) {
        println!();
        print_system(&format!("[{}/{}] Researching {}", index + 1, total, name));
    }

    fn record_finished(&mut self, _index: usize, _total: usize, row: &OutputRow) {
        match &row.error {
            None => {
                let tokens = row.usage.map(|u| u.total).unwrap_or_default();
                println!("{}", format!("  ✓ {} ({} tokens)", row.name, tokens).green());
            }
            Some(error) => println!("{}", format!("  ✗ {}: {}", row.name, error).red()),
        }
    }
}

fn print_system(message: &str) {
    println!("{}", message.yellow());
}
