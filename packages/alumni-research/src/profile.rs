//! The structured record produced for each person.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidates::Platform;

/// Current practices, narrative and social links of one alumnus.
///
/// Every field defaults to empty, so a decoded profile always carries every
/// column of the output table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResearchProfile {
    /// Official names of current practices, one per practice, no duplicates
    pub current_practices_names: Vec<String>,
    /// Profile or practice URL for each entry of `current_practices_names`, same order; "" when unknown
    pub current_practices_urls: Vec<String>,
    /// One unified narrative of the career since training
    pub current_practice_narrative: String,
    /// Awards, publications, certifications and other non-practice information
    pub additional_information: String,
    pub x_twitter_link: String,
    pub linkedin_link: String,
    pub doximity_link: String,
    pub google_scholar_link: String,
    pub facebook_link: String,
}

impl ResearchProfile {
    pub fn link(&self, platform: Platform) -> &str {
        match platform {
            Platform::X => &self.x_twitter_link,
            Platform::LinkedIn => &self.linkedin_link,
            Platform::Doximity => &self.doximity_link,
            Platform::GoogleScholar => &self.google_scholar_link,
            Platform::Facebook => &self.facebook_link,
        }
    }

    pub fn link_mut(&mut self, platform: Platform) -> &mut String {
        match platform {
            Platform::X => &mut self.x_twitter_link,
            Platform::LinkedIn => &mut self.linkedin_link,
            Platform::Doximity => &mut self.doximity_link,
            Platform::GoogleScholar => &mut self.google_scholar_link,
            Platform::Facebook => &mut self.facebook_link,
        }
    }

    /// Practice names as one comma-separated cell.
    pub fn practice_names_cell(&self) -> String {
        self.current_practices_names.join(", ")
    }

    /// Practice URLs as one comma-separated cell.
    pub fn practice_urls_cell(&self) -> String {
        self.current_practices_urls.join(", ")
    }

    /// Collapse practices whose names only differ by case or spacing.
    ///
    /// The first spelling is kept, together with the first non-empty URL
    /// seen for it. Returns the number of entries removed.
    pub fn dedup_practices(&mut self) -> usize {
        let original = self.current_practices_names.len();
        let mut keys: Vec<String> = Vec::with_capacity(original);
        let mut names: Vec<String> = Vec::with_capacity(original);
        let mut urls: Vec<String> = Vec::with_capacity(original);

        let pairs = self
            .current_practices_names
            .drain(..)
            .zip(self.current_practices_urls.drain(..));

        for (name, url) in pairs {
            let key = fold_name(&name);
            match keys.iter().position(|k| *k == key) {
                Some(idx) => {
                    if urls[idx].trim().is_empty() && !url.trim().is_empty() {
                        urls[idx] = url;
                    }
                }
                None => {
                    keys.push(key);
                    names.push(name);
                    urls.push(url);
                }
            }
        }

        self.current_practices_names = names;
        self.current_practices_urls = urls;
        original - self.current_practices_names.len()
    }
}

fn fold_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(names: &[&str], urls: &[&str]) -> ResearchProfile {
        ResearchProfile {
            current_practices_names: names.iter().map(|s| s.to_string()).collect(),
            current_practices_urls: urls.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_dedup_folds_case_and_spacing() {
        let mut p = profile(
            &["Example Radiology Group", "example  radiology group", "City Hospital"],
            &["", "https://example.org/doe", "https://city.org"],
        );

        assert_eq!(p.dedup_practices(), 1);
        assert_eq!(p.current_practices_names, vec!["Example Radiology Group", "City Hospital"]);
        assert_eq!(p.current_practices_urls, vec!["https://example.org/doe", "https://city.org"]);
    }

    #[test]
    fn test_dedup_keeps_distinct_names() {
        let mut p = profile(&["A", "B"], &["https://a.org", ""]);
        assert_eq!(p.dedup_practices(), 0);
        assert_eq!(p.current_practices_names.len(), 2);
    }

    #[test]
    fn test_cells_and_links() {
        let mut p = profile(&["A", "B"], &["https://a.org", ""]);
        *p.link_mut(Platform::Doximity) = "https://doximity.com/pub/a".into();

        assert_eq!(p.practice_names_cell(), "A, B");
        assert_eq!(p.practice_urls_cell(), "https://a.org, ");
        assert_eq!(p.link(Platform::Doximity), "https://doximity.com/pub/a");
        assert_eq!(p.link(Platform::X), "");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let p: ResearchProfile = serde_json::from_str(r#"{"linkedin_link":"https://linkedin.com/in/a"}"#).unwrap();
        assert!(p.current_practices_names.is_empty());
        assert_eq!(p.current_practice_narrative, "");
        assert_eq!(p.linkedin_link, "https://linkedin.com/in/a");
    }
}
