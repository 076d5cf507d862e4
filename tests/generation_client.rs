//! Behavior of the two generation backends against live HTTP endpoints:
//! request shape, rate-limit retry, transport retry, and the response-shape
//! handling of the local backend.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockito::Matcher;

use quizforge::app::{CancelToken, SentenceGenerator};
use quizforge::config::ProviderConfig;
use quizforge::domain::{GenerationError, Notifier};
use quizforge::infra::llm::{HostedApiBackend, LocalInferenceBackend};

use support::http_stub::ScriptedServer;

const CHAT_OK: &str = r#"{"choices": [{"message": {"content": "The desert was _____."}}]}"#;

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .expect("notifier lock should not be poisoned")
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.messages
            .lock()
            .expect("notifier lock should not be poisoned")
            .push(message.to_string());
    }
}

fn hosted_config(endpoint: &str) -> ProviderConfig {
    let mut config = ProviderConfig::hosted(endpoint, "gpt-4o-mini", "sk-test");
    config.retry_wait = Duration::ZERO;
    config.transport_backoff = Duration::ZERO;
    config
}

#[tokio::test]
async fn hosted_request_carries_bearer_auth_model_and_prompt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("\"model\":\"gpt-4o-mini\"".to_string()),
            Matcher::Regex("meticulous".to_string()),
            Matcher::Regex("\"temperature\":1.5".to_string()),
        ]))
        .with_status(200)
        .with_body(CHAT_OK)
        .create_async()
        .await;

    let generator = SentenceGenerator::new(
        &hosted_config(&server.url()),
        Arc::new(RecordingNotifier::default()),
    )
    .expect("configuration is complete");

    let sentence = generator
        .generate("meticulous", &CancelToken::new())
        .await
        .expect("generation should succeed");

    assert_eq!(sentence, "The desert was _____.");
    mock.assert_async().await;
}

#[tokio::test]
async fn hosted_empty_completion_is_treated_as_success() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"choices": [{"message": {"content": "   "}}]}"#)
        .create_async()
        .await;

    let backend =
        HostedApiBackend::new(&hosted_config(&server.url())).expect("backend should build");

    let sentence = backend
        .generate("prompt", &RecordingNotifier::default(), &|| false)
        .await
        .expect("blank completion is still a completion");

    assert_eq!(sentence, "");
}

#[tokio::test]
async fn hosted_gives_up_after_max_retries_of_throttling() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_body(r#"{"error": "rate limited"}"#)
        .expect(3)
        .create_async()
        .await;

    let mut config = hosted_config(&server.url());
    config.max_retries = 2;

    let backend = HostedApiBackend::new(&config).expect("backend should build");
    let notifier = RecordingNotifier::default();

    let error = backend
        .generate("prompt", &notifier, &|| false)
        .await
        .expect_err("permanent throttling should exhaust retries");

    assert_eq!(error, GenerationError::RetriesExhausted { attempts: 3 });
    // One wait notification per retry, none for the final failing attempt.
    assert_eq!(notifier.messages().len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn hosted_retries_identical_request_through_throttling() {
    let server = ScriptedServer::start(vec![
        (429, r#"{"error": "rate limited"}"#),
        (429, r#"{"error": "rate limited"}"#),
        (200, CHAT_OK),
    ])
    .await;

    let backend = HostedApiBackend::new(&hosted_config(&server.url())).expect("backend should build");
    let notifier = RecordingNotifier::default();

    let sentence = backend
        .generate("prompt", &notifier, &|| false)
        .await
        .expect("third attempt should succeed");

    assert_eq!(sentence, "The desert was _____.");

    let bodies = server.request_bodies();
    assert_eq!(bodies.len(), 3);
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Rate limit reached."));
}

#[tokio::test]
async fn hosted_server_errors_retry_on_their_own_counter() {
    let server = ScriptedServer::start(vec![
        (500, r#"{"error": "upstream"}"#),
        (500, r#"{"error": "upstream"}"#),
        (200, CHAT_OK),
    ])
    .await;

    let mut config = hosted_config(&server.url());
    config.max_retries = 2;

    let backend = HostedApiBackend::new(&config).expect("backend should build");
    let notifier = RecordingNotifier::default();

    let sentence = backend
        .generate("prompt", &notifier, &|| false)
        .await
        .expect("transient server errors should be retried");

    assert_eq!(sentence, "The desert was _____.");
    assert_eq!(server.request_bodies().len(), 3);
    // Transport retries are silent; only rate limiting notifies the user.
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn hosted_server_error_without_retry_budget_is_transport() {
    let server = ScriptedServer::start(vec![(500, r#"{"error": "upstream"}"#)]).await;

    let mut config = hosted_config(&server.url());
    config.max_retries = 0;

    let backend = HostedApiBackend::new(&config).expect("backend should build");

    let error = backend
        .generate("prompt", &RecordingNotifier::default(), &|| false)
        .await
        .expect_err("server error with no retry budget should fail");

    assert!(matches!(error, GenerationError::Transport { .. }));
}

#[tokio::test]
async fn hosted_cancellation_short_circuits_before_sending() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(CHAT_OK)
        .expect(0)
        .create_async()
        .await;

    let backend =
        HostedApiBackend::new(&hosted_config(&server.url())).expect("backend should build");

    let error = backend
        .generate("prompt", &RecordingNotifier::default(), &|| true)
        .await
        .expect_err("cancelled request should never be sent");

    assert_eq!(error, GenerationError::Cancelled);
    mock.assert_async().await;
}

#[tokio::test]
async fn invalid_template_fails_without_any_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(CHAT_OK)
        .expect(0)
        .create_async()
        .await;

    let mut config = hosted_config(&server.url());
    config.prompt_template = "Use {word} at {difficulty}".to_string();

    let generator = SentenceGenerator::new(&config, Arc::new(RecordingNotifier::default()))
        .expect("configuration is complete");

    let error = generator
        .generate("arid", &CancelToken::new())
        .await
        .expect_err("unknown placeholder should fail before sending");

    assert!(matches!(error, GenerationError::InvalidTemplate { .. }));
    mock.assert_async().await;
}

fn local_config(endpoint: &str) -> ProviderConfig {
    ProviderConfig::local(endpoint, "gemma3:1b")
}

#[tokio::test]
async fn local_reads_nested_message_content() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(Matcher::Regex("\"stream\":false".to_string()))
        .with_status(200)
        .with_body(r#"{"message": {"content": "A _____ breeze blew in."}}"#)
        .create_async()
        .await;

    let backend = LocalInferenceBackend::new(&local_config(&server.url()))
        .expect("backend should build");

    let sentence = backend.generate("prompt").await.expect("should succeed");
    assert_eq!(sentence, "A _____ breeze blew in.");
}

#[tokio::test]
async fn local_reads_top_level_content() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"content": "The soup tasted _____."}"#)
        .create_async()
        .await;

    let backend = LocalInferenceBackend::new(&local_config(&server.url()))
        .expect("backend should build");

    let sentence = backend.generate("prompt").await.expect("should succeed");
    assert_eq!(sentence, "The soup tasted _____.");
}

#[tokio::test]
async fn local_empty_payload_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let backend = LocalInferenceBackend::new(&local_config(&server.url()))
        .expect("backend should build");

    let error = backend
        .generate("prompt")
        .await
        .expect_err("empty payload should be rejected");

    assert_eq!(error, GenerationError::EmptyResponse);
}

#[tokio::test]
async fn local_connection_failure_is_transport() {
    // TCP port 9 (discard) is not listening in the test environment.
    let backend = LocalInferenceBackend::new(&local_config("http://127.0.0.1:9"))
        .expect("backend should build");

    let error = backend
        .generate("prompt")
        .await
        .expect_err("unreachable server should fail");

    assert!(matches!(error, GenerationError::Transport { .. }));
}
