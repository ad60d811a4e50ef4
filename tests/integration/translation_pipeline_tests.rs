/*!
 * Integration tests for the full translation pipeline.
 *
 * Tests end-to-end catalog translation with realistic course content,
 * including fallback behavior, interruption, and resume.
 */

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;

use crate::common;
use bhashantar::app_config::TranslationCommonConfig;
use bhashantar::content::course_topic_spec;
use bhashantar::pipeline::{PipelineOptions, PipelineOrchestrator, RunState};
use bhashantar::providers::mock::{MockBehavior, MockProvider};
use bhashantar::translation::TranslationClient;

/// Common settings tuned so tests run in milliseconds.
fn fast_common() -> TranslationCommonConfig {
    TranslationCommonConfig {
        rate_limit_delay_ms: 1,
        failure_cooldown_ms: 2,
        breather_every: 0,
        ..Default::default()
    }
}

/// Write a catalog JSON file into the test directory.
fn write_catalog(dir: &TempDir, items: &Value) -> PathBuf {
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, serde_json::to_string_pretty(items).unwrap()).unwrap();
    path
}

fn options_for(dir: &TempDir, catalog_path: PathBuf) -> PipelineOptions {
    PipelineOptions {
        catalog_path,
        output_path: dir.path().join("translated.json"),
        checkpoint_path: dir.path().join("checkpoint.json"),
        fresh: false,
        source_language: "en".to_string(),
        target_language: "mr".to_string(),
    }
}

fn read_output(options: &PipelineOptions) -> Value {
    serde_json::from_str(&std::fs::read_to_string(&options.output_path).unwrap()).unwrap()
}

/// A realistic single-topic catalog.
fn course_catalog() -> Value {
    json!([
        {
            "id": "t1",
            "title": "Hello",
            "description": "An introduction to greetings",
            "content": {
                "overview": "Why greetings matter",
                "keyPoints": ["A", "B"],
                "useCases": [],
                "codeExamples": [
                    {
                        "title": "Basic greeter",
                        "explanation": "Prints a greeting",
                        "code": "console.log('hello')"
                    }
                ]
            }
        }
    ])
}

#[test]
fn test_fullRun_withUppercaseService_shouldTranslateDeclaredFieldsOnly() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let catalog_path = write_catalog(&dir, &course_catalog());
    let options = options_for(&dir, catalog_path);

    let client = TranslationClient::with_mock(MockProvider::uppercase(), fast_common());
    let orchestrator = PipelineOrchestrator::new(&client, course_topic_spec(), options.clone());

    let report = tokio_test::block_on(async { orchestrator.run().await }).unwrap();
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.completed, 1);
    assert_eq!(report.fallbacks, 0);

    let output = read_output(&options);
    let topic = &output[0];
    assert_eq!(topic["id"], "t1");
    assert_eq!(topic["title"], "HELLO");
    assert_eq!(topic["content"]["keyPoints"], json!(["A", "B"]));
    assert_eq!(topic["content"]["useCases"], json!([]));
    assert_eq!(
        topic["content"]["codeExamples"][0]["explanation"],
        "PRINTS A GREETING"
    );
    // Code bodies are not declared translatable and stay verbatim
    assert_eq!(
        topic["content"]["codeExamples"][0]["code"],
        "console.log('hello')"
    );
}

#[tokio::test]
async fn test_fullRun_withDeadService_shouldProduceIdenticalOutput() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let catalog = json!([
        {
            "id": "t1",
            "title": "Hello",
            "content": {"keyPoints": ["A", "B"]}
        }
    ]);
    let catalog_path = write_catalog(&dir, &catalog);
    let options = options_for(&dir, catalog_path);

    let mock = MockProvider::failing();
    let client = TranslationClient::with_mock(mock.clone(), fast_common());
    let orchestrator = PipelineOrchestrator::new(&client, course_topic_spec(), options.clone());

    let report = orchestrator.run().await.unwrap();

    // Title plus two key points all fell back to source
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.fallbacks, 3);
    assert_eq!(read_output(&options), catalog);
}

#[tokio::test]
async fn test_interruptedRun_shouldResumeWithoutRetranslating() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let catalog_path = write_catalog(
        &dir,
        &json!([
            {"id": "t1", "title": "Hello"},
            {"id": "t2", "title": "World"},
        ]),
    );
    let options = options_for(&dir, catalog_path);

    // First run: each call takes 200ms, and a stop is requested while the
    // first item is still in flight, so the run ends after item one
    let slow = MockProvider::new(MockBehavior::Slow { delay_ms: 200 });
    let first_client = TranslationClient::with_mock(slow, fast_common());
    let first_run =
        PipelineOrchestrator::new(&first_client, course_topic_spec(), options.clone());

    let cancel = first_run.cancel_flag();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.store(true, Ordering::SeqCst);
    });

    let report = first_run.run().await.unwrap();
    assert_eq!(report.state, RunState::Interrupted);
    assert_eq!(report.completed, 1);
    assert!(options.checkpoint_path.exists());
    assert!(!options.output_path.exists());

    // Second run: a fresh client resumes and only item two reaches the
    // service
    let mock = MockProvider::uppercase();
    let second_client = TranslationClient::with_mock(mock.clone(), fast_common());
    let second_run =
        PipelineOrchestrator::new(&second_client, course_topic_spec(), options.clone());

    let report = second_run.run().await.unwrap();
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.resumed, 1);
    assert_eq!(mock.seen_texts(), vec!["World"]);

    let output = read_output(&options);
    assert_eq!(output.as_array().unwrap().len(), 2);
    assert_eq!(output[1]["title"], "WORLD");
    // Checkpoint is cleared once the output is on disk
    assert!(!options.checkpoint_path.exists());
}

#[tokio::test]
async fn test_changedCatalog_shouldInvalidateCheckpoint() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let catalog_path = write_catalog(&dir, &json!([{"id": "t1", "title": "Hello"}]));
    let options = options_for(&dir, catalog_path.clone());

    // First run over the original catalog, interrupted after writing a
    // checkpoint by a provider outage threshold
    let mut strict = fast_common();
    strict.max_consecutive_failures = 1;
    let failing_client = TranslationClient::with_mock(MockProvider::failing(), strict);
    let first_run =
        PipelineOrchestrator::new(&failing_client, course_topic_spec(), options.clone());
    assert!(first_run.run().await.is_err());
    assert!(options.checkpoint_path.exists());

    // The catalog changes on disk; the stale checkpoint must not be reused
    std::fs::write(
        &catalog_path,
        serde_json::to_string(&json!([{"id": "t1", "title": "Hello again"}])).unwrap(),
    )
    .unwrap();

    let mock = MockProvider::uppercase();
    let client = TranslationClient::with_mock(mock.clone(), fast_common());
    let second_run = PipelineOrchestrator::new(&client, course_topic_spec(), options.clone());
    let report = second_run.run().await.unwrap();

    assert_eq!(report.resumed, 0);
    assert_eq!(mock.seen_texts(), vec!["Hello again"]);
    assert_eq!(read_output(&options)[0]["title"], "HELLO AGAIN");
}

#[tokio::test]
async fn test_intermittentFailures_shouldDegradeGracefully() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let catalog_path = write_catalog(
        &dir,
        &json!([
            {"id": "t1", "title": "one"},
            {"id": "t2", "title": "two"},
            {"id": "t3", "title": "three"},
        ]),
    );
    let options = options_for(&dir, catalog_path);

    // Every second call fails; every item still comes through, failed
    // ones carrying their source text
    let client =
        TranslationClient::with_mock(MockProvider::intermittent(2), fast_common());
    let orchestrator = PipelineOrchestrator::new(&client, course_topic_spec(), options.clone());

    let report = orchestrator.run().await.unwrap();
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.completed, 3);
    assert_eq!(report.fallbacks, 1);

    let output = read_output(&options);
    assert_eq!(output[0]["title"], "[mr] one");
    assert_eq!(output[1]["title"], "two");
    assert_eq!(output[2]["title"], "[mr] three");
}
