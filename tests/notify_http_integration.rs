//! Integration tests for the notification pipeline over real HTTP.
//!
//! Each test spins up an Axum server on a random port standing in for the
//! object store and the inference runtime, then runs the real pipeline
//! against it with a recording reply sender.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use spamwatch::classify::HttpInferenceEndpoint;
use spamwatch::config::{NotifyConfig, SmtpConfig};
use spamwatch::error::{Error, MailError};
use spamwatch::mail::ReplySender;
use spamwatch::pipeline::{NotifyPipeline, ObjectCreatedEvent, ReplyOutcome};
use spamwatch::storage::HttpObjectStore;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const RAW_SPAM: &[u8] = b"From: caller@example.com\r\n\
Subject: Claim your reward\r\n\
Date: Fri, 26 Mar 2021 05:58:41 +0000\r\n\
Content-Type: text/plain\r\n\
\r\n\
FreeMsg: Txt: CALL to No: 86888 & claim your reward\r\n";

/// Row lengths of the payload the inference stub received.
type SeenRows = Arc<Mutex<Vec<usize>>>;

async fn get_object(Path((_bucket, key)): Path<(String, String)>) -> impl IntoResponse {
    if key == "msg1" {
        (StatusCode::OK, RAW_SPAM.to_vec()).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn invoke(
    Path(name): Path<String>,
    State(seen): State<SeenRows>,
    Json(payload): Json<Vec<Vec<f32>>>,
) -> impl IntoResponse {
    if name == "broken" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let mut rows = seen.lock().unwrap();
    for row in &payload {
        rows.push(row.len());
    }
    Json(json!({
        "predicted_label": [[1.0]],
        "predicted_probability": [[0.92]],
    }))
    .into_response()
}

/// Start the stub server, return (port, seen payload rows).
async fn start_server() -> (u16, SeenRows) {
    let seen: SeenRows = Arc::new(Mutex::new(Vec::new()));
    let app = axum::Router::new()
        .route("/endpoints/{name}/invocations", post(invoke))
        .route("/{bucket}/{key}", get(get_object))
        .with_state(Arc::clone(&seen));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, seen)
}

#[derive(Default)]
struct RecordingReplySender {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl ReplySender for RecordingReplySender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push((
            to.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

fn config(port: u16, endpoint_name: &str) -> NotifyConfig {
    NotifyConfig {
        store_base_url: format!("http://127.0.0.1:{port}"),
        bucket: "inbox".to_string(),
        endpoint_name: endpoint_name.to_string(),
        runtime_base_url: format!("http://127.0.0.1:{port}"),
        vocabulary_size: 9013,
        sender: "screener@example.com".to_string(),
        smtp: SmtpConfig {
            host: "smtp.invalid".to_string(),
            port: 587,
            username: String::new(),
            password: secrecy::SecretString::from(String::new()),
        },
    }
}

fn pipeline(port: u16, endpoint_name: &str) -> (NotifyPipeline, Arc<RecordingReplySender>) {
    let cfg = config(port, endpoint_name);
    let replies = Arc::new(RecordingReplySender::default());
    let p = NotifyPipeline::new(
        cfg.clone(),
        Arc::new(HttpObjectStore::new(cfg.store_base_url.clone())),
        Arc::new(HttpInferenceEndpoint::new(
            cfg.runtime_base_url.clone(),
            cfg.endpoint_name.clone(),
        )),
        Arc::clone(&replies) as Arc<dyn ReplySender>,
    );
    (p, replies)
}

#[tokio::test]
async fn pipeline_classifies_and_replies_over_http() {
    timeout(TEST_TIMEOUT, async {
        let (port, seen) = start_server().await;
        let (p, replies) = pipeline(port, "spam-detector");

        let event = ObjectCreatedEvent {
            bucket: None,
            key: "msg1".to_string(),
        };
        let resp = p.run(&event).await.unwrap();

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.reply, ReplyOutcome::Sent);

        // Exactly one single-row payload of vocabulary length.
        let rows = seen.lock().unwrap();
        assert_eq!(rows.as_slice(), &[9013]);

        let sent = replies.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (to, subject, body) = &sent[0];
        assert_eq!(to, "caller@example.com");
        assert_eq!(subject, "Spam detection of Claim your reward");
        assert!(body.contains("categorized as spam with a 92.0% confidence"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn response_payload_serializes_for_the_trigger() {
    timeout(TEST_TIMEOUT, async {
        let (port, _seen) = start_server().await;
        let (p, _replies) = pipeline(port, "spam-detector");

        let event = ObjectCreatedEvent {
            bucket: None,
            key: "msg1".to_string(),
        };
        let resp = p.run(&event).await.unwrap();

        let value: Value = serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(value["status_code"], 200);
        assert_eq!(value["reply"]["outcome"], "sent");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_object_aborts_invocation() {
    timeout(TEST_TIMEOUT, async {
        let (port, _seen) = start_server().await;
        let (p, replies) = pipeline(port, "spam-detector");

        let event = ObjectCreatedEvent {
            bucket: None,
            key: "no-such-object".to_string(),
        };
        let err = p.run(&event).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(replies.sent.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn endpoint_failure_aborts_without_reply() {
    timeout(TEST_TIMEOUT, async {
        let (port, _seen) = start_server().await;
        let (p, replies) = pipeline(port, "broken");

        let event = ObjectCreatedEvent {
            bucket: None,
            key: "msg1".to_string(),
        };
        let err = p.run(&event).await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
        assert!(replies.sent.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}
