//! Retrain automation: drive a hosted notebook terminal through the
//! reinstall-and-reexecute script.
//!
//! One invocation: signed URL → session cookies → websocket → script →
//! settle → close. Presign and connect failures are fatal; command
//! outcomes are not verified unless a step opts in.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use serde::{Deserialize, Serialize};

use crate::config::RetrainConfig;
use crate::error::{Result, TerminalError};
use crate::terminal::script::{StepReport, retrain_script, run_script};
use crate::terminal::session::TerminalSession;

/// Issues time-limited signed URLs for a notebook instance.
#[async_trait]
pub trait SignedUrlProvider: Send + Sync {
    async fn signed_url(&self, instance: &str) -> std::result::Result<String, TerminalError>;
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    authorized_url: String,
}

/// Control-plane client for signed notebook URLs.
pub struct HttpSignedUrlProvider {
    control_base_url: String,
    client: reqwest::Client,
}

impl HttpSignedUrlProvider {
    pub fn new(control_base_url: impl Into<String>) -> Self {
        Self {
            control_base_url: control_base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SignedUrlProvider for HttpSignedUrlProvider {
    async fn signed_url(&self, instance: &str) -> std::result::Result<String, TerminalError> {
        let url = format!(
            "{}/notebook-instances/{instance}/signed-url",
            self.control_base_url.trim_end_matches('/')
        );

        let resp = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| TerminalError::Presign(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TerminalError::Presign(format!("status {}", resp.status())));
        }

        let body: SignedUrlResponse = resp
            .json()
            .await
            .map_err(|e| TerminalError::Presign(e.to_string()))?;

        Ok(body.authorized_url)
    }
}

/// Cookie and endpoint material captured from the signed-URL fetch.
pub struct SessionAuth {
    pub ws_url: String,
    pub origin: String,
    pub cookie: Option<String>,
}

/// Derive the terminal websocket URL and origin from the authorized URL.
pub fn terminal_endpoint(
    authorized_url: &str,
    terminal_path: &str,
) -> std::result::Result<(String, String), TerminalError> {
    let parsed = reqwest::Url::parse(authorized_url)
        .map_err(|e| TerminalError::Bootstrap(format!("bad authorized URL: {e}")))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| TerminalError::Bootstrap("authorized URL has no host".to_string()))?;
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let (ws_scheme, origin_scheme) = if parsed.scheme() == "https" {
        ("wss", "https")
    } else {
        ("ws", "http")
    };

    Ok((
        format!("{ws_scheme}://{authority}{terminal_path}"),
        format!("{origin_scheme}://{authority}"),
    ))
}

/// Fetch the authorized URL once to capture session cookies, then derive
/// the websocket endpoint and cookie header from the jar.
pub async fn bootstrap_session(
    authorized_url: &str,
    terminal_path: &str,
) -> std::result::Result<SessionAuth, TerminalError> {
    let jar = Arc::new(Jar::default());
    let client = reqwest::Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .build()
        .map_err(|e| TerminalError::Bootstrap(e.to_string()))?;

    client
        .get(authorized_url)
        .send()
        .await
        .map_err(|e| TerminalError::Bootstrap(e.to_string()))?;

    let parsed = reqwest::Url::parse(authorized_url)
        .map_err(|e| TerminalError::Bootstrap(format!("bad authorized URL: {e}")))?;
    let cookie = jar
        .cookies(&parsed)
        .and_then(|header| header.to_str().ok().map(String::from));

    let (ws_url, origin) = terminal_endpoint(authorized_url, terminal_path)?;

    Ok(SessionAuth {
        ws_url,
        origin,
        cookie,
    })
}

/// Fixed success payload for the retrain trigger.
#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    pub status_code: u16,
    pub body: String,
    pub steps: Vec<StepReport>,
}

/// Runs the retrain cycle against one notebook instance.
pub struct RetrainRunner {
    config: RetrainConfig,
    presign: Arc<dyn SignedUrlProvider>,
}

impl RetrainRunner {
    pub fn new(config: RetrainConfig) -> Self {
        let presign = Arc::new(HttpSignedUrlProvider::new(config.control_base_url.clone()));
        Self::with_provider(config, presign)
    }

    pub fn with_provider(config: RetrainConfig, presign: Arc<dyn SignedUrlProvider>) -> Self {
        Self { config, presign }
    }

    pub async fn run(&self) -> Result<RetrainResponse> {
        let authorized_url = self
            .presign
            .signed_url(&self.config.notebook_instance)
            .await?;

        let auth = bootstrap_session(&authorized_url, &self.config.terminal_path).await?;
        tracing::info!(ws_url = %auth.ws_url, "Session bootstrapped");

        let mut session = TerminalSession::connect(
            &auth.ws_url,
            auth.cookie.as_deref(),
            Some(&auth.origin),
        )
        .await?;

        let steps = run_script(&mut session, &retrain_script(&self.config)).await?;

        tokio::time::sleep(self.config.settle_delay).await;
        session.close().await;

        Ok(RetrainResponse {
            status_code: 200,
            body: "retrain cycle dispatched".to_string(),
            steps,
        })
    }
}
