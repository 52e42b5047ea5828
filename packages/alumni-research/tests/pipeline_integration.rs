//! End-to-end pipeline runs against mock oracles.

use alumni_research::testing::{MockLanguageModel, MockWebSearcher, ScriptedReply};
use alumni_research::{
    MemorySessionStore, NormalizeError, PipelineMode, PipelineSettings, Platform, ResearchError,
    ResearchRecord, Researcher, SearchResult, SessionStore,
};
use openai_client::Usage;
use std::sync::Arc;

const FORMATTED: &str = r#"Here is the profile:
{
  "current_practices_names": ["Example Radiology Group", "example radiology group", "City Hospital"],
  "current_practices_urls": ["", "https://example-radiology.org/doe", "https://cityhospital.org"],
  "current_practice_narrative": "Body imaging radiologist since 2012.",
  "additional_information": "Fellow of the college.",
  "x_twitter_link": "https://x.com/not-a-candidate",
  "linkedin_link": "https://www.linkedin.com/in/janedoe",
  "doximity_link": "https://www.doximity.com/pub/jane-doe-md",
  "google_scholar_link": "",
  "facebook_link": ""
}"#;

fn usage(total: u64) -> Usage {
    Usage {
        prompt_tokens: total - 10,
        completion_tokens: 10,
        total_tokens: total,
        ..Default::default()
    }
}

fn searcher_for(name: &str) -> MockWebSearcher {
    MockWebSearcher::new()
        .with_results(
            format!("{name} radiology current practice"),
            vec![SearchResult::new(
                "Dr. Jane Doe | Example Radiology",
                "https://example-radiology.org/doe",
                "Body imaging",
            )],
        )
        .with_results(
            format!("{name}, radiology, LinkedIn"),
            vec![
                SearchResult::new("Jane Doe - Radiologist", "https://www.linkedin.com/in/janedoe", "Radiologist"),
                SearchResult::new("Unrelated", "https://example.org/janedoe", "Not a LinkedIn URL"),
            ],
        )
        .with_results(
            format!("{name}, radiology, Doximity"),
            vec![SearchResult::new("Jane Doe, MD", "https://www.doximity.com/pub/jane-doe-md", "")],
        )
}

fn model_for(name: &str) -> MockLanguageModel {
    MockLanguageModel::new()
        .with_reply(
            "search",
            ScriptedReply::text("Jane Doe works at Example Radiology Group.")
                .with_tool_call("web_search", format!(r#"{{"query":"{name} radiology current practice"}}"#))
                .with_usage(usage(100))
                .with_usage(usage(200)),
        )
        .with_reply(
            "candidate_links",
            ScriptedReply::text(
                "X (Twitter): https://x.com/not-a-candidate\n\
                 LinkedIn: https://www.linkedin.com/in/janedoe\n\
                 Doximity: https://www.doximity.com/pub/jane-doe-md\n\
                 Google Scholar: \n\
                 Facebook: ",
            )
            .with_tool_call("search_social_media_candidates", format!(r#"{{"alumni_name":"{name}"}}"#))
            .with_usage(usage(50)),
        )
        .with_reply("format", ScriptedReply::text(FORMATTED).with_usage(usage(30)))
}

fn researcher(
    model: Arc<MockLanguageModel>,
    searcher: Arc<MockWebSearcher>,
    sessions: Arc<MemorySessionStore>,
) -> Researcher {
    Researcher::build(
        PipelineMode::AlumniResearcher,
        &PipelineSettings::default(),
        model,
        searcher,
        sessions,
        "tester",
    )
    .unwrap()
}

#[tokio::test]
async fn test_full_pipeline_produces_profile() {
    let model = Arc::new(model_for("Jane Doe"));
    let searcher = Arc::new(searcher_for("Jane Doe"));
    let sessions = Arc::new(MemorySessionStore::new());
    let researcher = researcher(model.clone(), searcher.clone(), sessions.clone());

    assert_eq!(researcher.stage_names(), vec!["search", "candidate_links", "format"]);

    let record = ResearchRecord::new("Jane Doe", 2005).unwrap();
    let outcome = researcher.research(&record).await.unwrap();

    let profile = outcome.profile.clone().unwrap();
    assert_eq!(profile.current_practices_names, vec!["Example Radiology Group", "City Hospital"]);
    assert_eq!(
        profile.current_practices_urls,
        vec!["https://example-radiology.org/doe", "https://cityhospital.org"]
    );
    assert_eq!(profile.linkedin_link, "https://www.linkedin.com/in/janedoe");
    assert_eq!(profile.doximity_link, "https://www.doximity.com/pub/jane-doe-md");
    assert_eq!(profile.x_twitter_link, "", "fabricated link must be cleared");
    assert_eq!(outcome.cleared_links, vec![(Platform::X, "https://x.com/not-a-candidate".to_string())]);
    assert_eq!(outcome.selected_links.get(Platform::X), "");
    assert_eq!(outcome.selected_links.get(Platform::LinkedIn), "https://www.linkedin.com/in/janedoe");

    assert_eq!(outcome.usage.totals.total, 380);
    assert_eq!(outcome.usage.totals.candidates, 40);
    assert_eq!(outcome.usage.turns.len(), 4);

    let requests = model.requests();
    let stages: Vec<&str> = requests.iter().map(|r| r.stage.as_str()).collect();
    assert_eq!(stages, vec!["search", "candidate_links", "format"]);
    assert_eq!(requests[0].tools, vec!["web_search"]);
    assert_eq!(requests[1].tools, vec!["search_social_media_candidates"]);
    assert!(requests[2].tools.is_empty());
    assert!(requests[2].structured);
    assert!(requests[0].transcript.contains("alumni name: Jane Doe, year of entry: 2005"));
    assert!(requests[2]
        .transcript
        .contains("For context: [search] said: Jane Doe works at Example Radiology Group."));
    assert!(requests[2]
        .transcript
        .contains("For context: [candidate_links] said: X (Twitter):\nLinkedIn: https://www.linkedin.com/in/janedoe"));
    assert!(requests[1].tool_outputs[0].contains("## LinkedIn"));
    assert!(!requests[1].tool_outputs[0].contains("https://example.org/janedoe"));

    let calls = searcher.calls();
    for platform in Platform::ALL {
        assert!(calls.contains(&platform.query_for("Jane Doe")));
    }

    let session = sessions.get(outcome.session_id).await.unwrap().unwrap();
    assert_eq!(session.user_id, "tester");
    assert_eq!(session.state["status"], "complete");
    assert_eq!(session.turns.len(), 4);
}

#[tokio::test]
async fn test_each_record_gets_fresh_context() {
    let model = Arc::new(model_for("Jane Doe"));
    let researcher = researcher(
        model.clone(),
        Arc::new(searcher_for("Jane Doe")),
        Arc::new(MemorySessionStore::new()),
    );

    let first = researcher
        .research(&ResearchRecord::new("Jane Doe", 2005).unwrap())
        .await
        .unwrap();
    let second = researcher
        .research(&ResearchRecord::new("John Roe", 1999).unwrap())
        .await
        .unwrap();

    assert_ne!(first.session_id, second.session_id);
    let requests = model.requests();
    assert_eq!(requests.len(), 6);
    assert!(!requests[3].transcript.contains("Jane Doe works at"));
    assert!(requests[3].transcript.contains("alumni name: John Roe, year of entry: 1999"));
}

#[tokio::test]
async fn test_stage_failure_aborts_record() {
    let model = Arc::new(model_for("Jane Doe").failing_when_prompt_contains("Jane Doe"));
    let sessions = Arc::new(MemorySessionStore::new());
    let researcher = researcher(model.clone(), Arc::new(searcher_for("Jane Doe")), sessions);

    let err = researcher
        .research(&ResearchRecord::new("Jane Doe", 2005).unwrap())
        .await
        .unwrap_err();

    match err {
        ResearchError::Stage { stage, source } => {
            assert_eq!(stage, "search");
            assert!(matches!(*source, ResearchError::Llm(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(model.requests().len(), 1);
}

#[tokio::test]
async fn test_unparseable_output_keeps_usage() {
    let model = Arc::new(
        model_for("Jane Doe").with_reply(
            "format",
            ScriptedReply::text("I could not format this person.").with_usage(usage(30)),
        ),
    );
    let researcher = researcher(
        model,
        Arc::new(searcher_for("Jane Doe")),
        Arc::new(MemorySessionStore::new()),
    );

    let outcome = researcher
        .research(&ResearchRecord::new("Jane Doe", 2005).unwrap())
        .await
        .unwrap();

    assert!(matches!(outcome.profile, Err(NormalizeError::NoJsonObject { .. })));
    assert_eq!(outcome.usage.totals.total, 380);
    assert_eq!(outcome.raw_output, "I could not format this person.");
}

#[tokio::test]
async fn test_links_without_candidate_search_are_dropped() {
    let model = Arc::new(model_for("Jane Doe").with_reply(
        "candidate_links",
        ScriptedReply::text("LinkedIn: https://www.linkedin.com/in/janedoe"),
    ));
    let researcher = researcher(
        model,
        Arc::new(searcher_for("Jane Doe")),
        Arc::new(MemorySessionStore::new()),
    );

    let outcome = researcher
        .research(&ResearchRecord::new("Jane Doe", 2005).unwrap())
        .await
        .unwrap();

    assert_eq!(outcome.selected_links.get(Platform::LinkedIn), "");
    let profile = outcome.profile.unwrap();
    assert_eq!(profile.linkedin_link, "");
    assert_eq!(profile.doximity_link, "");
}

#[test]
fn test_email_finder_is_not_implemented() {
    let result = Researcher::build(
        "email_finder".parse().unwrap(),
        &PipelineSettings::default(),
        Arc::new(MockLanguageModel::new()),
        Arc::new(MockWebSearcher::new()),
        Arc::new(MemorySessionStore::new()),
        "tester",
    );

    match result {
        Err(ResearchError::Mode(message)) => assert!(message.contains("not implemented")),
        _ => panic!("email_finder should not build"),
    }
}
