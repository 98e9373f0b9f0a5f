//! Notification pipeline: object-created event to verdict reply.
//!
//! Fetch → parse → normalize → encode → infer → reply, strictly
//! sequential. Storage and inference failures abort the invocation; a
//! reply-send failure is logged and carried in the response as an explicit
//! outcome while the invocation still reports success.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classify::{HttpInferenceEndpoint, InferenceEndpoint, encode};
use crate::config::NotifyConfig;
use crate::error::Result;
use crate::mail::inbound::{InboundEmail, normalize_text};
use crate::mail::reply::{ReplySender, SmtpReplySender, compose_reply_body, reply_subject};
use crate::storage::{HttpObjectStore, ObjectStore};

/// Trigger payload: a newly stored message object. The event bucket, when
/// present, overrides the configured one.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectCreatedEvent {
    #[serde(default)]
    pub bucket: Option<String>,
    pub key: String,
}

/// What happened on the reply path. `Failed` is deliberate policy, not an
/// accident of broad catching: the trigger still sees success, the reason
/// is logged and carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplyOutcome {
    Sent,
    Failed { reason: String },
}

/// Fixed success payload returned to the trigger.
#[derive(Debug, Serialize)]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
    pub reply: ReplyOutcome,
}

impl InvocationResponse {
    fn success(reply: ReplyOutcome) -> Self {
        Self {
            status_code: 200,
            body: "spam screening complete".to_string(),
            reply,
        }
    }
}

/// The notification pipeline with its three external collaborators.
pub struct NotifyPipeline {
    config: NotifyConfig,
    store: Arc<dyn ObjectStore>,
    endpoint: Arc<dyn InferenceEndpoint>,
    replies: Arc<dyn ReplySender>,
}

impl NotifyPipeline {
    pub fn new(
        config: NotifyConfig,
        store: Arc<dyn ObjectStore>,
        endpoint: Arc<dyn InferenceEndpoint>,
        replies: Arc<dyn ReplySender>,
    ) -> Self {
        Self {
            config,
            store,
            endpoint,
            replies,
        }
    }

    /// Wire the HTTP/SMTP collaborators from config.
    pub fn from_config(config: NotifyConfig) -> Self {
        let store = Arc::new(HttpObjectStore::new(config.store_base_url.clone()));
        let endpoint = Arc::new(HttpInferenceEndpoint::new(
            config.runtime_base_url.clone(),
            config.endpoint_name.clone(),
        ));
        let replies = Arc::new(SmtpReplySender::new(
            config.smtp.clone(),
            config.sender.clone(),
        ));
        Self::new(config, store, endpoint, replies)
    }

    /// Run one invocation to completion.
    pub async fn run(&self, event: &ObjectCreatedEvent) -> Result<InvocationResponse> {
        let bucket = event.bucket.as_deref().unwrap_or(&self.config.bucket);

        let raw = self.store.fetch(bucket, &event.key).await?;
        let email = InboundEmail::parse(&raw)?;

        let normalized = normalize_text(&email.body);
        tracing::info!(key = %event.key, sender = %email.sender, text = %normalized, "Screening message");

        let vector = encode(&normalized, self.config.vocabulary_size);
        let verdict = self.endpoint.classify(&vector).await?;
        tracing::info!(
            label = verdict.label.as_str(),
            confidence = verdict.confidence,
            "Verdict received"
        );

        let subject = reply_subject(&email.subject);
        let body = compose_reply_body(&email, &verdict);

        let reply = match self.replies.send(&email.sender, &subject, &body).await {
            Ok(()) => ReplyOutcome::Sent,
            Err(e) => {
                tracing::error!(error = %e, to = %email.sender, "Reply send failed");
                ReplyOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Ok(InvocationResponse::success(reply))
    }
}
