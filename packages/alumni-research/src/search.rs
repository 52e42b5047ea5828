//! Keyword search oracle.
//!
//! Both the search stage and the candidate-link stage query the web through
//! [`WebSearcher`]; the provider behind it is opaque to the pipeline.
//!
//! # Implementations
//!
//! - [`TavilyWebSearcher`] - Tavily search API
//! - [`crate::testing::MockWebSearcher`] - canned results for tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::credentials::SecretString;
use crate::error::{ResearchError, Result};

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Web search trait.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web, returning at most `limit` results.
    async fn search_with_limit(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Tavily-backed web searcher.
pub struct TavilyWebSearcher {
    api_key: SecretString,
    client: reqwest::Client,
}

impl TavilyWebSearcher {
    /// Create a new Tavily web searcher.
    pub fn new(api_key: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ResearchError::Search(Box::new(e)))?;

        Ok(Self {
            api_key,
            client,
        })
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'static str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl WebSearcher for TavilyWebSearcher {
    async fn search_with_limit(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let request = TavilyRequest {
            query,
            search_depth: "basic",
            max_results: limit,
        };

        let response = self
            .client
            .post(TAVILY_ENDPOINT)
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| ResearchError::Search(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::search(format!("Tavily API error {status}: {body}")));
        }

        let tavily: TavilyResponse = response
            .json()
            .await
            .map_err(|e| ResearchError::Search(Box::new(e)))?;

        let results: Vec<SearchResult> = tavily
            .results
            .into_iter()
            .filter(|r| Url::parse(&r.url).is_ok())
            .take(limit)
            .map(|r| SearchResult {
                title: r.title.unwrap_or_default(),
                url: r.url,
                snippet: r.content.unwrap_or_default(),
            })
            .collect();

        debug!(query, count = results.len(), "Tavily search complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tavily_response_tolerates_missing_fields() {
        let raw = r#"{"results":[{"url":"https://x.com/jdoe"},{"url":"https://a.org","title":"A","content":"about"}]}"#;
        let parsed: TavilyResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(parsed.results.len(), 2);
        assert!(parsed.results[0].title.is_none());
        assert_eq!(parsed.results[1].content.as_deref(), Some("about"));
    }

    #[test]
    fn test_tavily_request_shape() {
        let body = serde_json::to_value(TavilyRequest {
            query: "Jane Doe radiology",
            search_depth: "basic",
            max_results: 20,
        })
        .unwrap();

        assert_eq!(body["query"], "Jane Doe radiology");
        assert_eq!(body["max_results"], 20);
    }
}
