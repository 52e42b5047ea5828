//! Candidate social-profile links.
//!
//! For each supported platform the finder runs one keyword query, keeps only
//! results whose URL belongs to that platform, and renders everything that
//! survived as a markdown report for the selecting model. Every surfaced URL
//! is also remembered in a [`CandidateSet`] so selections can be checked
//! against the closed set afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::search::{SearchResult, WebSearcher};

/// Platforms the candidate search covers, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    X,
    LinkedIn,
    Doximity,
    GoogleScholar,
    Facebook,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::X,
        Platform::LinkedIn,
        Platform::Doximity,
        Platform::GoogleScholar,
        Platform::Facebook,
    ];

    /// Name used in queries, reports and selections.
    pub fn label(&self) -> &'static str {
        match self {
            Self::X => "X (Twitter)",
            Self::LinkedIn => "LinkedIn",
            Self::Doximity => "Doximity",
            Self::GoogleScholar => "Google Scholar",
            Self::Facebook => "Facebook",
        }
    }

    /// Domain substrings a URL must contain to count for this platform.
    pub fn url_patterns(&self) -> &'static [&'static str] {
        match self {
            Self::X => &["twitter.com", "x.com"],
            Self::LinkedIn => &["linkedin.com"],
            Self::Doximity => &["doximity.com"],
            Self::GoogleScholar => &["scholar.google.com", "scholar.google"],
            Self::Facebook => &["facebook.com"],
        }
    }

    /// Case-insensitive substring match against the platform's patterns.
    pub fn matches(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.url_patterns().iter().any(|pattern| url.contains(pattern))
    }

    /// Keyword query issued for a person on this platform.
    pub fn query_for(&self, full_name: &str) -> String {
        format!("{}, radiology, {}", full_name, self.label())
    }

    /// Resolve a label written by a model ("X (Twitter)", "twitter", "Google Scholar").
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .trim_matches(|c: char| c == '*' || c == '`' || c == '-' || c.is_whitespace())
            .to_lowercase();
        match normalized.as_str() {
            "x (twitter)" | "x" | "twitter" | "x/twitter" => Some(Self::X),
            "linkedin" => Some(Self::LinkedIn),
            "doximity" => Some(Self::Doximity),
            "google scholar" | "googlescholar" | "scholar" => Some(Self::GoogleScholar),
            "facebook" => Some(Self::Facebook),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A search hit that belongs to a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLink {
    pub platform: Platform,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Keep only results whose URL matches the platform.
pub fn filter_candidates(platform: Platform, results: Vec<SearchResult>) -> Vec<CandidateLink> {
    results
        .into_iter()
        .filter(|r| platform.matches(&r.url))
        .map(|r| CandidateLink {
            platform,
            title: r.title,
            url: r.url,
            snippet: r.snippet,
        })
        .collect()
}

/// Candidates found for one platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformCandidates {
    pub links: Vec<CandidateLink>,
    /// Set when the search for this platform failed
    pub error: Option<String>,
}

/// Result of a candidate search across all platforms.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateReport {
    pub full_name: String,
    pub max_links: usize,
    /// One entry per platform, in [`Platform::ALL`] order
    pub platforms: Vec<(Platform, PlatformCandidates)>,
}

impl CandidateReport {
    pub fn candidates(&self, platform: Platform) -> &[CandidateLink] {
        self.platforms
            .iter()
            .find(|(p, _)| *p == platform)
            .map(|(_, c)| c.links.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_links(&self) -> usize {
        self.platforms.iter().map(|(_, c)| c.links.len()).sum()
    }

    /// Markdown report with one section per platform and a summary.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            format!("# Social Media Profile Search Results for {}", self.full_name),
            String::new(),
            "**Search Parameters:**".to_string(),
            format!("- Name: {}", self.full_name),
            format!("- Maximum results per platform: {}", self.max_links),
            String::new(),
            "---".to_string(),
            String::new(),
        ];

        for (platform, found) in &self.platforms {
            lines.push(format!("## {}", platform.label()));
            lines.push(String::new());

            if found.links.is_empty() {
                lines.push("*No matching links found.*".to_string());
                lines.push(String::new());
            } else {
                lines.push(format!("**Found {} matching link(s):**", found.links.len()));
                lines.push(String::new());

                for (idx, link) in found.links.iter().enumerate() {
                    let title = if link.title.is_empty() { "No title" } else { link.title.as_str() };
                    lines.push(format!("### {}. {}", idx + 1, title));
                    lines.push(String::new());
                    lines.push(format!("**URL:** {}", link.url));
                    lines.push(String::new());
                    if !link.snippet.is_empty() {
                        lines.push(format!("**Description:** {}", link.snippet));
                        lines.push(String::new());
                    }
                    lines.push("---".to_string());
                    lines.push(String::new());
                }
            }

            lines.push(String::new());
        }

        lines.push("## Summary".to_string());
        lines.push(String::new());
        lines.push(format!("**Total links found:** {}", self.total_links()));
        lines.push(String::new());
        lines.push("**Breakdown by platform:**".to_string());
        for (platform, found) in &self.platforms {
            lines.push(format!("- {}: {} link(s)", platform.label(), found.links.len()));
        }

        lines.join("\n")
    }
}

/// Runs the per-platform candidate searches.
#[derive(Clone)]
pub struct CandidateFinder {
    searcher: Arc<dyn WebSearcher>,
    max_links: usize,
}

impl CandidateFinder {
    pub fn new(searcher: Arc<dyn WebSearcher>, max_links: usize) -> Self {
        Self { searcher, max_links }
    }

    /// Search every platform for `full_name`.
    ///
    /// A failing platform search yields an empty section for that platform
    /// only; the other platforms are still searched.
    pub async fn search_candidates(&self, full_name: &str) -> CandidateReport {
        info!(name = %full_name, "Starting social media candidate search");

        let mut platforms = Vec::with_capacity(Platform::ALL.len());
        for platform in Platform::ALL {
            let query = platform.query_for(full_name);
            let found = match self.searcher.search_with_limit(&query, self.max_links).await {
                Ok(results) => {
                    let links = filter_candidates(platform, results);
                    info!(platform = %platform, count = links.len(), "Matching candidate links");
                    PlatformCandidates { links, error: None }
                }
                Err(e) => {
                    warn!(platform = %platform, error = %e, "Candidate search failed");
                    PlatformCandidates {
                        links: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            };
            platforms.push((platform, found));
        }

        CandidateReport {
            full_name: full_name.to_string(),
            max_links: self.max_links,
            platforms,
        }
    }
}

/// Every URL surfaced as a candidate during one run.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    urls: HashMap<Platform, Vec<String>>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_from(&mut self, report: &CandidateReport) {
        for (platform, found) in &report.platforms {
            let entry = self.urls.entry(*platform).or_default();
            for link in &found.links {
                let key = url_key(&link.url);
                if !entry.contains(&key) {
                    entry.push(key);
                }
            }
        }
    }

    pub fn contains(&self, platform: Platform, url: &str) -> bool {
        let key = url_key(url);
        self.urls
            .get(&platform)
            .is_some_and(|urls| urls.iter().any(|u| *u == key))
    }

    pub fn len(&self) -> usize {
        self.urls.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn url_key(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

/// At most one chosen URL per platform; empty string when none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedLinks {
    links: BTreeMap<Platform, String>,
}

impl Default for SelectedLinks {
    fn default() -> Self {
        Self {
            links: Platform::ALL.iter().map(|p| (*p, String::new())).collect(),
        }
    }
}

impl SelectedLinks {
    /// Parse "Platform: URL" lines out of a model reply.
    ///
    /// Unknown labels are ignored; placeholders such as "empty" or "none"
    /// count as no selection. The first URL given for a platform wins.
    pub fn parse(reply: &str) -> Self {
        let mut selected = Self::default();

        for line in reply.lines() {
            let line = line.trim().trim_start_matches(['-', '*', ' ']);
            let Some((label, value)) = split_label(line) else {
                continue;
            };
            let Some(platform) = Platform::from_label(label) else {
                continue;
            };

            let value = clean_url(value);
            if value.is_empty() {
                continue;
            }
            let slot = selected.links.entry(platform).or_default();
            if slot.is_empty() {
                *slot = value;
            }
        }

        selected
    }

    pub fn get(&self, platform: Platform) -> &str {
        self.links.get(&platform).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, platform: Platform, url: impl Into<String>) {
        self.links.insert(platform, url.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (Platform, &str)> {
        self.links.iter().map(|(p, u)| (*p, u.as_str()))
    }

    /// Clear every selection that is not a candidate for its platform.
    /// Returns what was dropped.
    pub fn retain_candidates(&mut self, candidates: &CandidateSet) -> Vec<(Platform, String)> {
        let mut dropped = Vec::new();
        for (platform, url) in self.links.iter_mut() {
            if !url.is_empty() && !(platform.matches(url) && candidates.contains(*platform, url)) {
                dropped.push((*platform, std::mem::take(url)));
            }
        }
        for (platform, url) in &dropped {
            warn!(platform = %platform, url = %url, "Dropping selected link that was not a candidate");
        }
        dropped
    }

    /// Render in the "Platform: URL" line format.
    pub fn to_lines(&self) -> String {
        Platform::ALL
            .iter()
            .map(|p| format!("{}: {}", p.label(), self.get(*p)).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Split "Label: value" at the colon that ends the label (URLs contain colons too).
fn strip_decoration(value: &str) -> &str {
    value
        .trim()
        .trim_matches(|c: char| c == '`' || c == '<' || c == '>' || c == '"' || c == '*')
        .trim()
}

fn split_label(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(':')?;
    let (label, rest) = line.split_at(idx);
    Some((label, &rest[1..]))
}

fn clean_url(value: &str) -> String {
    let value = strip_decoration(value);
    // [text](target)
    let value = match (value.find("]("), value.ends_with(')')) {
        (Some(idx), true) => strip_decoration(&value[idx + 2..value.len() - 1]),
        _ => value,
    };
    let lowered = value.to_lowercase();
    let placeholder = matches!(
        lowered.as_str(),
        "" | "empty" | "none" | "n/a" | "na" | "not found" | "[url or empty]" | "\"\""
    );
    if placeholder || !(lowered.starts_with("http://") || lowered.starts_with("https://")) {
        return String::new();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWebSearcher;
    use proptest::prelude::*;

    fn result(url: &str) -> SearchResult {
        SearchResult::new(format!("title {url}"), url, "snippet")
    }

    #[test]
    fn test_platform_matching_is_case_insensitive() {
        assert!(Platform::X.matches("https://Twitter.com/jdoe"));
        assert!(Platform::X.matches("https://x.com/jdoe"));
        assert!(Platform::GoogleScholar.matches("https://scholar.google.de/citations?user=1"));
        assert!(!Platform::LinkedIn.matches("https://example.org/linked-in"));
    }

    #[test]
    fn test_query_format() {
        assert_eq!(
            Platform::GoogleScholar.query_for("Jane Doe"),
            "Jane Doe, radiology, Google Scholar"
        );
    }

    #[test]
    fn test_filter_drops_foreign_domains() {
        let kept = filter_candidates(
            Platform::Doximity,
            vec![
                result("https://www.doximity.com/pub/jane-doe-md"),
                result("https://www.healthgrades.com/physician/dr-jane-doe"),
            ],
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].platform, Platform::Doximity);
    }

    proptest! {
        #[test]
        fn prop_filtered_urls_match_platform(
            urls in proptest::collection::vec(
                prop_oneof![
                    "https://(www\\.)?(twitter|x|linkedin|doximity|facebook|example)\\.com/[a-z]{1,8}",
                    "https://scholar\\.google\\.(com|de)/citations\\?user=[A-Z]{4}",
                    "[a-zA-Z:/.]{0,30}",
                ],
                0..20,
            ),
            idx in 0usize..5,
        ) {
            let platform = Platform::ALL[idx];
            let results = urls.iter().map(|u| result(u)).collect();

            for link in filter_candidates(platform, results) {
                let lower = link.url.to_lowercase();
                prop_assert!(platform.url_patterns().iter().any(|p| lower.contains(p)));
            }
        }
    }

    #[tokio::test]
    async fn test_failed_platform_does_not_abort_search() {
        let searcher = MockWebSearcher::new()
            .with_results("Jane Doe, radiology, X (Twitter)", vec![result("https://x.com/janedoe")])
            .with_results(
                "Jane Doe, radiology, LinkedIn",
                vec![result("https://www.linkedin.com/in/janedoe")],
            )
            .with_results(
                "Jane Doe, radiology, Doximity",
                vec![result("https://www.doximity.com/pub/jane-doe")],
            )
            .with_results(
                "Jane Doe, radiology, Google Scholar",
                vec![result("https://scholar.google.com/citations?user=JD")],
            )
            .failing_on("Jane Doe, radiology, Facebook");

        let finder = CandidateFinder::new(Arc::new(searcher), 20);
        let report = finder.search_candidates("Jane Doe").await;

        assert_eq!(report.platforms.len(), 5);
        assert_eq!(report.total_links(), 4);
        assert!(report.candidates(Platform::Facebook).is_empty());
        assert!(report.platforms[4].1.error.is_some());

        let markdown = report.to_markdown();
        let facebook = markdown.split("## Facebook").nth(1).unwrap();
        assert!(facebook.trim_start().starts_with("*No matching links found.*"));
        assert!(markdown.contains("**URL:** https://www.linkedin.com/in/janedoe"));
        assert!(markdown.contains("- Facebook: 0 link(s)"));
        assert!(markdown.contains("**Total links found:** 4"));
    }

    #[test]
    fn test_selected_links_parse_markdown() {
        let selected = SelectedLinks::parse(
            "**X (Twitter):** https://x.com/jdoe\n\
             **LinkedIn:** https://www.linkedin.com/in/jdoe\n\
             Doximity: [https://www.doximity.com/pub/jdoe](https://www.doximity.com/pub/jdoe)\n\
             - Google Scholar: <https://scholar.google.com/citations?user=1>\n\
             Facebook: **N/A**",
        );

        assert_eq!(selected.get(Platform::X), "https://x.com/jdoe");
        assert_eq!(selected.get(Platform::LinkedIn), "https://www.linkedin.com/in/jdoe");
        assert_eq!(selected.get(Platform::Doximity), "https://www.doximity.com/pub/jdoe");
        assert_eq!(selected.get(Platform::GoogleScholar), "https://scholar.google.com/citations?user=1");
        assert_eq!(selected.get(Platform::Facebook), "");
    }

    #[test]
    fn test_selected_links_parse() {
        let reply = "Here are my picks:\n```\nX (Twitter): https://twitter.com/jdoe\nLinkedIn: https://www.linkedin.com/in/jdoe\nDoximity: \nGoogle Scholar: [URL or empty]\n- **Facebook**: none\n```";
        let selected = SelectedLinks::parse(reply);

        assert_eq!(selected.get(Platform::X), "https://twitter.com/jdoe");
        assert_eq!(selected.get(Platform::LinkedIn), "https://www.linkedin.com/in/jdoe");
        assert_eq!(selected.get(Platform::Doximity), "");
        assert_eq!(selected.get(Platform::GoogleScholar), "");
        assert_eq!(selected.get(Platform::Facebook), "");
    }

    #[test]
    fn test_retain_candidates_drops_fabricated() {
        let report = CandidateReport {
            full_name: "Jane Doe".into(),
            max_links: 20,
            platforms: vec![(
                Platform::LinkedIn,
                PlatformCandidates {
                    links: filter_candidates(
                        Platform::LinkedIn,
                        vec![result("https://www.linkedin.com/in/janedoe/")],
                    ),
                    error: None,
                },
            )],
        };
        let mut set = CandidateSet::new();
        set.extend_from(&report);

        let mut selected = SelectedLinks::default();
        selected.set(Platform::LinkedIn, "https://www.linkedin.com/in/janedoe");
        selected.set(Platform::X, "https://x.com/made-up");

        let dropped = selected.retain_candidates(&set);
        assert_eq!(dropped, vec![(Platform::X, "https://x.com/made-up".to_string())]);
        assert_eq!(selected.get(Platform::LinkedIn), "https://www.linkedin.com/in/janedoe");
        assert_eq!(selected.get(Platform::X), "");
    }

    #[test]
    fn test_to_lines_lists_every_platform() {
        let mut selected = SelectedLinks::default();
        selected.set(Platform::Facebook, "https://facebook.com/jdoe");

        assert_eq!(
            selected.to_lines(),
            "X (Twitter):\nLinkedIn:\nDoximity:\nGoogle Scholar:\nFacebook: https://facebook.com/jdoe"
        );
    }
}
