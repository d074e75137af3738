use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chatprobe_config::ChatprobeConfig;
use chatprobe_core::AskPipeline;
use chatprobe_drivers::fixture::{FixtureLauncher, FixtureScript};
use chatprobe_server::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const CHAT: &str = r#"
    <div class="message-list"></div>
    <textarea placeholder="Send a message"></textarea>
"#;

fn answered(answer: &str) -> String {
    format!(
        r#"<div class="message-list">
             <div class="message bot-message"><div class="message-text">{answer}</div></div>
           </div>
           <textarea placeholder="Send a message"></textarea>"#
    )
}

fn state(launcher: Arc<FixtureLauncher>) -> AppState {
    AppState::new(AskPipeline::from_config(&ChatprobeConfig::default()), launcher)
}

async fn post_ask(state: AppState, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ask")
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn empty_question_is_rejected_without_launching() {
    let launcher = Arc::new(FixtureLauncher::new(FixtureScript::new(CHAT)));
    let (status, body) = post_ask(state(launcher.clone()), json!({"question": ""}).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "question is required");
    assert_eq!(launcher.launches(), 0);
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let launcher = Arc::new(FixtureLauncher::new(FixtureScript::new(CHAT)));
    for body in ["", "{", r#"{"q":"hi"}"#, r#"{"question":["hi"]}"#] {
        let (status, json) = post_ask(state(launcher.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert!(json["error"].is_string());
    }
}

#[tokio::test(start_paused = true)]
async fn answers_with_selector_summary() {
    let answer = "M5Stack Core2 ".repeat(10);
    let launcher = Arc::new(FixtureLauncher::new(
        FixtureScript::new(CHAT).then_on_submit(answered(&answer)),
    ));
    let (status, body) = post_ask(state(launcher.clone()), json!({"question": "Core2?"}).to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "Core2?");
    assert_eq!(body["answer"], answer.trim());
    assert_eq!(body["originalAnswer"], answer.trim());
    assert_eq!(body["selectors"]["tested"], true);
    assert_eq!(body["selectors"]["successful"], true);
    assert_eq!(
        body["selectors"]["selectorUsed"],
        ".message.bot-message:last-child .message-text"
    );
    assert_eq!(launcher.log().closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_question_reports_unknown_selector() {
    let launcher = Arc::new(FixtureLauncher::new(
        FixtureScript::new(CHAT).then_on_submit(CHAT),
    ));
    let (status, body) = post_ask(state(launcher), json!({"question": "hi"}).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "");
    assert_eq!(body["selectors"]["successful"], false);
    assert_eq!(body["selectors"]["selectorUsed"], "unknown");
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_keep_separate_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let answer = "M5Stack Basic ".repeat(10);
    let launcher = Arc::new(FixtureLauncher::new(
        FixtureScript::new(CHAT).then_on_submit(answered(&answer)),
    ));
    let state = state(launcher.clone()).with_artifacts(tmp.path());

    let (first, second) = tokio::join!(
        post_ask(state.clone(), json!({"question": "first question"}).to_string()),
        post_ask(state.clone(), json!({"question": "second question"}).to_string()),
    );
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_eq!(launcher.launches(), 2);

    let mut q_and_a: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("q_and_a_") && n.ends_with(".txt"))
        })
        .map(|p| std::fs::read_to_string(p).unwrap())
        .collect();
    q_and_a.sort();

    assert_eq!(q_and_a.len(), 2);
    assert!(q_and_a[0].contains("first question"));
    assert!(q_and_a[1].contains("second question"));
}

#[tokio::test]
async fn launch_failure_is_a_500() {
    let launcher = Arc::new(FixtureLauncher::failing("webdriver unreachable"));
    let (status, body) = post_ask(state(launcher), json!({"question": "hi"}).to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("webdriver unreachable"));
}

#[tokio::test]
async fn health_is_ok() {
    let launcher = Arc::new(FixtureLauncher::new(FixtureScript::new(CHAT)));
    let response = router(state(launcher))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}
