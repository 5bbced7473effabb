//! End-to-end behaviour of the explanation pipeline against a fake backend.

mod common;

use common::FakeBackend;
use deckexplain::{
    DeckExplanation, ExplainError, ExplanationPipeline, ExplanationSink, JsonFileSink,
    NO_TEXT_EXPLANATION, PptxExtractor, QuerySettings, RetryPolicy, SlideDeck, SlideIndex,
};
use deckexplain_pptx::fixtures::build_pptx;
use proptest::prelude::*;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn pipeline(backend: Arc<FakeBackend>, attempts: u32) -> ExplanationPipeline {
    ExplanationPipeline::new(
        backend,
        QuerySettings::default(),
        RetryPolicy::new(attempts, Duration::ZERO, Duration::ZERO),
    )
}

fn idx(n: u32) -> SlideIndex {
    SlideIndex::new(n).unwrap()
}

async fn explain(backend: Arc<FakeBackend>, deck: &SlideDeck) -> DeckExplanation {
    pipeline(backend, 3).explain_deck(deck, None).await.unwrap()
}

#[tokio::test]
async fn test_pptx_to_json_file() {
    let bytes = build_pptx(&[&["TCP", "handshake"], &[], &["Routing", "tables"]]);
    let deck = PptxExtractor::new().extract(Cursor::new(bytes)).unwrap();
    assert_eq!(deck.get(idx(1)), Some("TCP handshake "));

    let backend = Arc::new(FakeBackend::new("Networking"));
    let explained = explain(Arc::clone(&backend), &deck).await;
    assert_eq!(explained.topic.as_deref(), Some("Networking"));

    let dir = TempDir::new().unwrap();
    let out = camino::Utf8PathBuf::from_path_buf(dir.path().join("talk.json")).unwrap();
    JsonFileSink::new(out.clone())
        .write(&explained.explanations)
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["1"], "explained slide-1");
    assert_eq!(json["2"], NO_TEXT_EXPLANATION);
    assert_eq!(json["3"], "explained slide-3");
    // topic + two non-blank slides
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_one_failing_slide_does_not_affect_others() {
    let backend =
        Arc::new(FakeBackend::new("Biology").failing_on(["slide-2".to_string()]));
    let deck = SlideDeck::from_ordered(["Cells", "Mitochondria", "DNA"]);

    let explained = explain(Arc::clone(&backend), &deck).await;
    let result = explained.explanations;

    assert_eq!(result.get(idx(1)), Some("explained slide-1"));
    assert_eq!(result.get(idx(3)), Some("explained slide-3"));
    let failure = result.get(idx(2)).unwrap();
    assert!(failure.starts_with("ERROR - explanation generation for slide 2 failed:"));
    assert!(failure.contains("Query failed after 3 attempts"));

    let slide_two_attempts = backend
        .labels()
        .iter()
        .filter(|l| l.as_str() == "slide-2")
        .count();
    assert_eq!(slide_two_attempts, 3);
}

#[tokio::test]
async fn test_topic_failure_aborts_the_run() {
    let backend = Arc::new(FakeBackend::new("unused").failing_on(["topic".to_string()]));
    let deck = SlideDeck::from_ordered(["Intro"]);

    let err = pipeline(Arc::clone(&backend), 2)
        .explain_deck(&deck, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ExplainError::TopicResolutionFailed { .. }));
    assert!(backend.labels().iter().all(|l| l == "topic"));
}

#[tokio::test]
async fn test_empty_deck_is_an_empty_result() {
    let backend = Arc::new(FakeBackend::new("unused"));
    let explained = explain(Arc::clone(&backend), &SlideDeck::new()).await;
    assert!(explained.explanations.is_empty());
    assert_eq!(backend.calls(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_every_slide_gets_exactly_one_entry(
        slides in prop::collection::vec(
            prop_oneof![Just(String::new()), Just("  ".to_string()), "[a-z]{1,12}"],
            0..12,
        ),
        failing in prop::collection::hash_set(1u32..12, 0..4),
    ) {
        let deck = SlideDeck::from_ordered(slides.clone());
        let backend = Arc::new(
            FakeBackend::new("Topic").failing_on(failing.iter().map(|n| format!("slide-{n}"))),
        );

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let explained = rt
            .block_on(pipeline(Arc::clone(&backend), 2).explain_deck(&deck, None))
            .unwrap();
        let result = explained.explanations;

        prop_assert!(result.covers(&deck));
        for (i, text) in slides.iter().enumerate() {
            let n = i as u32 + 1;
            let entry = result.get(idx(n)).unwrap();
            if text.trim().is_empty() {
                prop_assert_eq!(entry, NO_TEXT_EXPLANATION);
            } else if failing.contains(&n) {
                let expected = format!("ERROR - explanation generation for slide {n} failed:");
                prop_assert!(entry.starts_with(&expected), "{}", entry);
            } else {
                prop_assert_eq!(entry, format!("explained slide-{n}"));
            }
        }
    }
}
