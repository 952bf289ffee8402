//! Remote mirror against an in-process fake backend.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use mindwell_core::config::RemoteConfig;
use mindwell_core::types::{ChatMessage, Diagnosis};
use mindwell_storage::remote::{SAVE_CONVERSATION_PATH, SAVE_DIAGNOSIS_PATH};
use mindwell_storage::{MirrorStatus, RemoteMirror};

// =============================================================================
// Helpers
// =============================================================================

#[derive(Debug, Clone)]
struct Captured {
    path: &'static str,
    cookie: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Captured>>>;

async fn save_conversation(
    State(log): State<Log>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    record(&log, SAVE_CONVERSATION_PATH, &headers, body);
    StatusCode::OK
}

async fn save_diagnosis(
    State(log): State<Log>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    record(&log, SAVE_DIAGNOSIS_PATH, &headers, body);
    StatusCode::OK
}

async fn reject() -> (StatusCode, &'static str) {
    (StatusCode::UNAUTHORIZED, "session expired")
}

fn record(log: &Log, path: &'static str, headers: &HeaderMap, body: Value) {
    let cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    log.lock().unwrap().push(Captured { path, cookie, body });
}

/// Start a fake backend and return its base URL and request log.
async fn spawn_backend(accepting: bool) -> (String, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let app = if accepting {
        Router::new()
            .route(SAVE_CONVERSATION_PATH, post(save_conversation))
            .route(SAVE_DIAGNOSIS_PATH, post(save_diagnosis))
            .with_state(Arc::clone(&log))
    } else {
        Router::new()
            .route(SAVE_CONVERSATION_PATH, post(reject))
            .route(SAVE_DIAGNOSIS_PATH, post(reject))
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), log)
}

/// A base URL nothing is listening on.
async fn dead_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn mirror_for(base_url: String) -> RemoteMirror {
    RemoteMirror::new(&RemoteConfig {
        base_url,
        timeout_secs: 2,
        ..RemoteConfig::default()
    })
    .unwrap()
}

fn history() -> Vec<ChatMessage> {
    vec![
        ChatMessage::user("I feel anxious"),
        ChatMessage::assistant("That sounds hard. When did it start?"),
    ]
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_mirror_posts_conversation_and_diagnosis() {
    let (base_url, log) = spawn_backend(true).await;
    let mirror = mirror_for(base_url);
    let diagnosis = Diagnosis::new("6/10", "mild anxiety symptoms", "Generalized Anxiety, mild");

    let report = mirror
        .mirror("thread-42", &history(), Some(&diagnosis), "sess-token")
        .await;

    assert_eq!(report.conversation, MirrorStatus::Saved);
    assert_eq!(report.diagnosis, MirrorStatus::Saved);

    let captured = log.lock().unwrap().clone();
    assert_eq!(captured.len(), 2);

    assert_eq!(captured[0].path, SAVE_CONVERSATION_PATH);
    assert_eq!(captured[0].cookie.as_deref(), Some("user_session_id=sess-token"));
    assert_eq!(captured[0].body["threadID"], "thread-42");
    assert_eq!(captured[0].body["messages"][0]["content"], "I feel anxious");
    assert_eq!(captured[0].body["messages"][1]["role"], "assistant");

    assert_eq!(captured[1].path, SAVE_DIAGNOSIS_PATH);
    assert_eq!(captured[1].body["score"], "6/10");
    assert_eq!(captured[1].body["content"], "mild anxiety symptoms");
    assert_eq!(captured[1].body["totalGuess"], "Generalized Anxiety, mild");
}

#[tokio::test]
async fn test_mirror_without_diagnosis_sends_conversation_only() {
    let (base_url, log) = spawn_backend(true).await;
    let mirror = mirror_for(base_url);

    let report = mirror.mirror("thread-7", &history(), None, "tok").await;

    assert_eq!(report.conversation, MirrorStatus::Saved);
    assert_eq!(report.diagnosis, MirrorStatus::Skipped);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_200_is_reported_as_rejected() {
    let (base_url, _log) = spawn_backend(false).await;
    let mirror = mirror_for(base_url);
    let diagnosis = Diagnosis::new("2/10", "stable", "No concern");

    let report = mirror
        .mirror("thread-9", &history(), Some(&diagnosis), "stale")
        .await;

    assert_eq!(report.conversation, MirrorStatus::Rejected { status: 401 });
    assert_eq!(report.diagnosis, MirrorStatus::Rejected { status: 401 });
}

#[tokio::test]
async fn test_unreachable_backend_is_reported_as_failed() {
    let mirror = mirror_for(dead_backend().await);

    let report = mirror.mirror("thread-1", &history(), None, "tok").await;

    assert!(matches!(report.conversation, MirrorStatus::Failed(_)));
    assert_eq!(report.diagnosis, MirrorStatus::Skipped);
}
