//! Batch driver over CSV files with mock oracles.

use alumni_research::testing::{MockLanguageModel, MockWebSearcher, ScriptedReply};
use alumni_research::{
    run_batch, BatchObserver, BatchOptions, MemorySessionStore, OutputRow, PipelineMode,
    PipelineSettings, Researcher,
};
use openai_client::Usage;
use std::path::Path;
use std::sync::Arc;

const FORMATTED: &str = r#"{
  "current_practices_names": ["Example Radiology Group"],
  "current_practices_urls": ["https://example-radiology.org"],
  "current_practice_narrative": "Interventional radiologist.",
  "additional_information": "",
  "x_twitter_link": "",
  "linkedin_link": "",
  "doximity_link": "",
  "google_scholar_link": "",
  "facebook_link": ""
}"#;

fn researcher(model: MockLanguageModel) -> Researcher {
    Researcher::build(
        PipelineMode::AlumniResearcher,
        &PipelineSettings::default(),
        Arc::new(model),
        Arc::new(MockWebSearcher::new()),
        Arc::new(MemorySessionStore::new()),
        "tester",
    )
    .unwrap()
}

fn scripted_model() -> MockLanguageModel {
    let usage = Usage {
        prompt_tokens: 90,
        completion_tokens: 10,
        total_tokens: 100,
        ..Default::default()
    };
    MockLanguageModel::new()
        .with_reply("search", ScriptedReply::text("Findings.").with_usage(usage.clone()))
        .with_reply("candidate_links", ScriptedReply::text("X (Twitter): \nLinkedIn: "))
        .with_reply("format", ScriptedReply::text(FORMATTED).with_usage(usage))
}

fn read_output(path: &Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    let rows = reader.records().map(|r| r.unwrap()).collect();
    (headers, rows)
}

fn column(headers: &csv::StringRecord, name: &str) -> usize {
    headers.iter().position(|h| h == name).unwrap()
}

#[derive(Default)]
struct Recorder {
    started: Vec<String>,
    finished: usize,
}

impl BatchObserver for Recorder {
    fn record_started(&mut self, _index: usize, _total: usize, name: &str) {
        self.started.push(name.to_string());
    }

    fn record_finished(&mut self, _index: usize, _total: usize, _row: &OutputRow) {
        self.finished += 1;
    }
}

#[tokio::test]
async fn test_failed_record_becomes_error_row() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("alumni.csv");
    let output = dir.path().join("results.csv");
    std::fs::write(
        &input,
        "First Name,Last Name,Entry Year\nJane,Doe,2005\nBob,Failing,99\nAmy,Poe,15\n",
    )
    .unwrap();

    let researcher = researcher(scripted_model().failing_when_prompt_contains("Bob Failing"));
    let options = BatchOptions {
        input,
        output: output.clone(),
        ..Default::default()
    };
    let mut recorder = Recorder::default();

    let summary = run_batch(&researcher, &options, &mut recorder).await.unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.usage.total, 400);
    assert_eq!(recorder.started, vec!["Jane Doe", "Bob Failing", "Amy Poe"]);
    assert_eq!(recorder.finished, 3);

    let (headers, rows) = read_output(&output);
    assert_eq!(rows.len(), 3);

    let name = column(&headers, "Name");
    let year = column(&headers, "Year of Entry");
    let practices = column(&headers, "Current Practices Names");
    let narrative = column(&headers, "Current Practice Narrative");
    let error = column(&headers, "Error");
    let total = column(&headers, "Total tokens used");

    assert_eq!(&rows[0][name], "Jane Doe");
    assert_eq!(&rows[0][practices], "Example Radiology Group");
    assert_eq!(&rows[0][error], "");
    assert_eq!(&rows[0][total], "200");

    assert_eq!(&rows[1][name], "Bob Failing");
    assert_eq!(&rows[1][year], "1999");
    assert_eq!(&rows[1][practices], "");
    assert_eq!(&rows[1][narrative], "");
    assert!(rows[1][error].contains("stage 'search' failed"));

    assert_eq!(&rows[2][year], "2015");
    assert_eq!(&rows[2][narrative], "Interventional radiologist.");
}

#[tokio::test]
async fn test_bad_year_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("alumni.csv");
    let output = dir.path().join("results.csv");
    std::fs::write(
        &input,
        "First Name,Last Name,Entry Date\nJane,Doe,unknown\nAmy,Poe,2015-07-01\nNot,Processed,2001\n",
    )
    .unwrap();

    let options = BatchOptions {
        input,
        output: output.clone(),
        limit: Some(2),
        instructions: "focus on current roles".into(),
    };

    let summary = run_batch(&researcher(scripted_model()), &options, &mut ()).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);

    let (headers, rows) = read_output(&output);
    assert_eq!(rows.len(), 2);
    assert!(rows[0][column(&headers, "Error")].contains("unparseable entry date"));
    assert_eq!(&rows[0][column(&headers, "Year of Entry")], "unknown");
    assert_eq!(&rows[1][column(&headers, "Year of Entry")], "2015");
}

#[tokio::test]
async fn test_all_success_has_no_error_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("alumni.csv");
    let output = dir.path().join("results.csv");
    std::fs::write(&input, "First Name,Last Name,Entry Year\nJane,Doe,2005\n").unwrap();

    let options = BatchOptions {
        input,
        output: output.clone(),
        ..Default::default()
    };
    run_batch(&researcher(scripted_model()), &options, &mut ()).await.unwrap();

    let (headers, rows) = read_output(&output);
    assert!(!headers.iter().any(|h| h == "Error"));
    assert_eq!(headers.len(), 16);
    assert_eq!(&rows[0][headers.len() - 1], "0");
}

#[tokio::test]
async fn test_missing_input_fails_batch() {
    let dir = tempfile::tempdir().unwrap();
    let options = BatchOptions {
        input: dir.path().join("missing.csv"),
        output: dir.path().join("results.csv"),
        ..Default::default()
    };

    assert!(run_batch(&researcher(scripted_model()), &options, &mut ()).await.is_err());
}
