//! Sequential batch driver over an input table.
//!
//! Records are researched one at a time. Any failure of a record becomes an
//! error row and the batch moves on; the output table is rewritten after
//! every record so an interrupted run leaves a usable partial file.

use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::pipeline::Researcher;
use crate::table::{read_input, write_output, InputRow, OutputRow};
use crate::usage::UsageCounters;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Only process the first `limit` rows
    pub limit: Option<usize>,
    /// Extra instructions appended to every record's query
    pub instructions: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub usage: UsageCounters,
}

/// Progress callbacks for front ends.
pub trait BatchObserver {
    fn record_started(&mut self, _index: usize, _total: usize, _name: &str) {}
    fn record_finished(&mut self, _index: usize, _total: usize, _row: &OutputRow) {}
}

impl BatchObserver for () {}

/// Research every input row and write the output table.
///
/// Only unreadable input or an unwritable output file fails the batch.
pub async fn run_batch(
    researcher: &Researcher,
    options: &BatchOptions,
    observer: &mut dyn BatchObserver,
) -> Result<BatchSummary> {
    let mut inputs = read_input(&options.input)?;
    if let Some(limit) = options.limit {
        inputs.truncate(limit);
    }

    let total = inputs.len();
    info!(total, input = %options.input.display(), "Starting batch");

    let mut rows = Vec::with_capacity(total);
    let mut summary = BatchSummary::default();

    for (index, input) in inputs.iter().enumerate() {
        let name = input.display_name();
        observer.record_started(index, total, &name);

        let row = research_row(researcher, input, &options.instructions).await;
        if let Some(usage) = row.usage {
            summary.usage += usage;
        }
        if row.is_success() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        summary.processed += 1;

        observer.record_finished(index, total, &row);
        rows.push(row);
        save(&options.output, &rows)?;
    }

    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        total_tokens = summary.usage.total,
        "Batch complete"
    );
    Ok(summary)
}

async fn research_row(researcher: &Researcher, input: &InputRow, instructions: &str) -> OutputRow {
    let name = input.display_name();

    let record = match input.to_record(instructions) {
        Ok(record) => record,
        Err(e) => {
            warn!(record = %name, error = %e, "Skipping unreadable record");
            return OutputRow::failure(name, input.entry.clone(), e.to_string(), None);
        }
    };

    match researcher.research(&record).await {
        Ok(outcome) => match outcome.profile {
            Ok(profile) => OutputRow::success(&record, profile, outcome.usage.totals),
            Err(e) => OutputRow::failure(
                record.full_name,
                record.context_year.to_string(),
                e.to_string(),
                Some(outcome.usage.totals),
            ),
        },
        Err(e) => {
            error!(record = %name, error = %e, "Record failed");
            OutputRow::failure(record.full_name, record.context_year.to_string(), e.to_string(), None)
        }
    }
}

fn save(path: &Path, rows: &[OutputRow]) -> Result<()> {
    write_output(path, rows)?;
    info!(rows = rows.len(), output = %path.display(), "Output table saved");
    Ok(())
}
