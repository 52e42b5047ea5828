//! Input records and entry-year parsing.

use serde::{Deserialize, Serialize};

use crate::error::{ResearchError, Result};

/// One person to research.
///
/// Built from an input row, never mutated while the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub full_name: String,
    pub context_year: i32,
    /// Extra instructions appended to the query (may be empty)
    #[serde(default)]
    pub instructions: String,
}

impl ResearchRecord {
    pub fn new(full_name: impl Into<String>, context_year: i32) -> Result<Self> {
        let full_name = full_name.into().split_whitespace().collect::<Vec<_>>().join(" ");
        if full_name.is_empty() {
            return Err(ResearchError::InvalidRecord("full name is empty".into()));
        }
        Ok(Self {
            full_name,
            context_year,
            instructions: String::new(),
        })
    }

    /// Build from first/last name cells and a raw entry date.
    pub fn from_parts(first_name: &str, last_name: &str, entry: &str) -> Result<Self> {
        let year = parse_entry_year(entry)
            .ok_or_else(|| ResearchError::InvalidRecord(format!("unparseable entry date '{entry}'")))?;
        Self::new(format!("{} {}", first_name.trim(), last_name.trim()), year)
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// The user query that opens the record's stage context.
    pub fn query(&self) -> String {
        let mut query = format!(
            "alumni name: {}, year of entry: {}",
            self.full_name, self.context_year
        );
        let extra = self.instructions.trim();
        if !extra.is_empty() {
            query.push_str("\nadditional instructions: ");
            query.push_str(extra);
        }
        query
    }
}

/// Expand a two-digit year: `00..=50` is 2000s, `51..=99` is 1900s.
pub fn expand_two_digit_year(value: u32) -> i32 {
    let value = (value % 100) as i32;
    if value <= 50 {
        2000 + value
    } else {
        1900 + value
    }
}

/// Parse an entry/start date cell into a four-digit year.
///
/// Accepts a bare year (`2015`, `15`), ISO dates (`2015-07-01`), US dates
/// (`7/1/99`, `07/01/2015`) and text dates (`July 2015`). A four-digit
/// component wins; otherwise the last numeric component is taken as a
/// two-digit year.
pub fn parse_entry_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    // Spreadsheet exports turn `2015` into `2015.0`
    let raw = raw.strip_suffix(".0").unwrap_or(raw);

    // Drop time-of-day parts (`7/1/99 0:00`, `2015-07-01T08:30:00`)
    let date = raw
        .split_whitespace()
        .filter_map(|token| match token.find(':') {
            None => Some(token),
            Some(_) => token.split_once('T').map(|(date, _)| date),
        })
        .collect::<Vec<_>>()
        .join(" ");

    let numeric: Vec<&str> = date
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .collect();

    if let Some(four) = numeric.iter().find(|part| part.len() == 4) {
        return four.parse().ok();
    }

    let last = numeric.last()?;
    if last.len() > 2 {
        return None;
    }
    last.parse().ok().map(expand_two_digit_year)
}
