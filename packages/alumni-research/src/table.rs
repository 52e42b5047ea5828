//! CSV input and output tables.

use serde::Serialize;
use std::path::Path;

use crate::candidates::Platform;
use crate::error::{ResearchError, Result};
use crate::profile::ResearchProfile;
use crate::record::ResearchRecord;
use crate::usage::UsageCounters;

const FIRST_NAME: &str = "First Name";
const LAST_NAME: &str = "Last Name";
const ENTRY_COLUMNS: [&str; 3] = ["Entry Year", "Entry Date", "Start Date"];

/// One row of the input table, as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub first_name: String,
    pub last_name: String,
    /// Raw entry/start date cell
    pub entry: String,
}

impl InputRow {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn to_record(&self, instructions: &str) -> Result<ResearchRecord> {
        Ok(ResearchRecord::from_parts(&self.first_name, &self.last_name, &self.entry)?
            .with_instructions(instructions))
    }
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Read every row of the input table.
///
/// Requires `First Name`, `Last Name` and one of `Entry Year`, `Entry Date`,
/// `Start Date` (the first present wins).
pub fn read_input(path: &Path) -> Result<Vec<InputRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let missing = |name: &str| ResearchError::InvalidRecord(format!("input table has no '{name}' column"));
    let first = column(&headers, FIRST_NAME).ok_or_else(|| missing(FIRST_NAME))?;
    let last = column(&headers, LAST_NAME).ok_or_else(|| missing(LAST_NAME))?;
    let entry = ENTRY_COLUMNS
        .iter()
        .find_map(|name| column(&headers, name))
        .ok_or_else(|| missing(ENTRY_COLUMNS.join("' or '").as_str()))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cell = |idx: usize| record.get(idx).unwrap_or_default().to_string();
        let row = InputRow {
            first_name: cell(first),
            last_name: cell(last),
            entry: cell(entry),
        };
        if row.display_name().is_empty() && row.entry.is_empty() {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// One row of the output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub name: String,
    /// Four-digit year, or the raw cell when it could not be parsed
    pub year: String,
    pub profile: Option<ResearchProfile>,
    pub error: Option<String>,
    pub usage: Option<UsageCounters>,
}

impl OutputRow {
    pub fn success(record: &ResearchRecord, profile: ResearchProfile, usage: UsageCounters) -> Self {
        Self {
            name: record.full_name.clone(),
            year: record.context_year.to_string(),
            profile: Some(profile),
            error: None,
            usage: Some(usage),
        }
    }

    pub fn failure(
        name: impl Into<String>,
        year: impl Into<String>,
        error: impl Into<String>,
        usage: Option<UsageCounters>,
    ) -> Self {
        Self {
            name: name.into(),
            year: year.into(),
            profile: None,
            error: Some(error.into()),
            usage,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn cells(&self, with_error: bool) -> Vec<String> {
        let mut cells = vec![self.name.clone(), self.year.clone()];

        match &self.profile {
            Some(profile) => {
                cells.push(profile.practice_names_cell());
                cells.push(profile.practice_urls_cell());
                cells.push(profile.current_practice_narrative.clone());
                cells.push(profile.additional_information.clone());
                cells.extend(Platform::ALL.iter().map(|p| profile.link(*p).to_string()));
            }
            None => cells.extend(std::iter::repeat(String::new()).take(4 + Platform::ALL.len())),
        }

        if with_error {
            cells.push(self.error.clone().unwrap_or_default());
        }

        match &self.usage {
            Some(usage) => cells.extend(
                [usage.total, usage.prompt, usage.candidates, usage.cached, usage.thoughts]
                    .iter()
                    .map(u64::to_string),
            ),
            None => cells.extend(std::iter::repeat(String::new()).take(5)),
        }

        cells
    }
}

/// Output header; `Error` only when some row failed.
pub fn output_headers(with_error: bool) -> Vec<String> {
    let mut headers: Vec<String> = [
        "Name",
        "Year of Entry",
        "Current Practices Names",
        "Current Practices URLs",
        "Current Practice Narrative",
        "Additional Information",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    headers.extend(Platform::ALL.iter().map(|p| format!("{} Link", p.label())));
    if with_error {
        headers.push("Error".to_string());
    }
    headers.extend(
        [
            "Total tokens used",
            "Prompt tokens used",
            "Candidates tokens used",
            "Cached content tokens used",
            "Thoughts tokens used",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    headers
}

/// Rewrite the whole output table.
pub fn write_output(path: &Path, rows: &[OutputRow]) -> Result<()> {
    let with_error = rows.iter().any(|row| !row.is_success());
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(output_headers(with_error))?;
    for row in rows {
        writer.write_record(row.cells(with_error))?;
    }
    writer.flush()?;
    Ok(())
}
