//! Hosted inference endpoint client.
//!
//! The endpoint takes a single-row 2D JSON array (one feature vector) and
//! returns 2D-nested `predicted_label` / `predicted_probability` arrays.
//! Transport or decode failures are fatal to the invocation; there is no
//! retry.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::InferenceError;

/// Classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        }
    }
}

/// Classification verdict used to build the reply text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub label: Label,
    pub confidence: f64,
}

/// Raw endpoint response shape.
#[derive(Debug, Deserialize)]
pub struct EndpointResponse {
    pub predicted_label: Vec<Vec<f64>>,
    pub predicted_probability: Vec<Vec<f64>>,
}

impl EndpointResponse {
    /// Map the nested label/probability to a verdict: label 0 is ham with
    /// confidence `1 - p`, anything else is spam with confidence `p`.
    pub fn interpret(&self, endpoint: &str) -> Result<Verdict, InferenceError> {
        let label = self
            .predicted_label
            .first()
            .and_then(|row| row.first())
            .copied()
            .ok_or_else(|| InferenceError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: "empty predicted_label".to_string(),
            })?;
        let probability = self
            .predicted_probability
            .first()
            .and_then(|row| row.first())
            .copied()
            .ok_or_else(|| InferenceError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: "empty predicted_probability".to_string(),
            })?;

        Ok(if label == 0.0 {
            Verdict {
                label: Label::Ham,
                confidence: 1.0 - probability,
            }
        } else {
            Verdict {
                label: Label::Spam,
                confidence: probability,
            }
        })
    }
}

/// Inference endpoint seam.
#[async_trait]
pub trait InferenceEndpoint: Send + Sync {
    async fn classify(&self, vector: &[f32]) -> Result<Verdict, InferenceError>;
}

/// Inference over the runtime's HTTP invocation surface.
pub struct HttpInferenceEndpoint {
    runtime_base_url: String,
    endpoint_name: String,
    client: reqwest::Client,
}

impl HttpInferenceEndpoint {
    pub fn new(runtime_base_url: impl Into<String>, endpoint_name: impl Into<String>) -> Self {
        Self {
            runtime_base_url: runtime_base_url.into(),
            endpoint_name: endpoint_name.into(),
            client: reqwest::Client::new(),
        }
    }

    fn invocation_url(&self) -> String {
        format!(
            "{}/endpoints/{}/invocations",
            self.runtime_base_url.trim_end_matches('/'),
            self.endpoint_name
        )
    }
}

#[async_trait]
impl InferenceEndpoint for HttpInferenceEndpoint {
    async fn classify(&self, vector: &[f32]) -> Result<Verdict, InferenceError> {
        let url = self.invocation_url();
        tracing::debug!(endpoint = %self.endpoint_name, "Invoking inference endpoint");

        // One message per invocation, so a single-row 2D payload.
        let resp = self
            .client
            .post(&url)
            .json(&[vector])
            .send()
            .await
            .map_err(|e| InferenceError::RequestFailed {
                endpoint: self.endpoint_name.clone(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(InferenceError::BadStatus {
                endpoint: self.endpoint_name.clone(),
                status: resp.status().as_u16(),
            });
        }

        let body: EndpointResponse =
            resp.json()
                .await
                .map_err(|e| InferenceError::InvalidResponse {
                    endpoint: self.endpoint_name.clone(),
                    reason: e.to_string(),
                })?;

        body.interpret(&self.endpoint_name)
    }
}
