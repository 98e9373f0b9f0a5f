//! Configuration types, built from environment variables.
//!
//! The deployment constants the original functions embedded as literals
//! (bucket name, vocabulary size, sender address, notebook instance name)
//! live here so invocations can be driven with explicit config in tests.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Vocabulary size of the pretrained classifier. Part of the model
/// contract; see `classify::encode`.
pub const DEFAULT_VOCABULARY_SIZE: usize = 9013;

/// SMTP settings for the reply path.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl SmtpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = require_env("SPAMWATCH_SMTP_HOST")?;
        let port: u16 = std::env::var("SPAMWATCH_SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);
        let username = std::env::var("SPAMWATCH_SMTP_USERNAME").unwrap_or_default();
        let password =
            SecretString::from(std::env::var("SPAMWATCH_SMTP_PASSWORD").unwrap_or_default());

        Ok(Self {
            host,
            port,
            username,
            password,
        })
    }
}

/// Notification pipeline configuration.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Base URL of the HTTP object store holding raw inbound emails.
    pub store_base_url: String,
    /// Bucket the trigger writes inbound emails to.
    pub bucket: String,
    /// Name of the hosted inference endpoint.
    pub endpoint_name: String,
    /// Base URL of the inference runtime.
    pub runtime_base_url: String,
    /// Vocabulary size shared with the pretrained model.
    pub vocabulary_size: usize,
    /// From-address for the verdict reply.
    pub sender: String,
    pub smtp: SmtpConfig,
}

impl NotifyConfig {
    /// Build from environment. The endpoint name has no sane default and
    /// is required; everything else falls back to the deployed constants.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint_name = require_env("SPAMWATCH_ENDPOINT_NAME")?;
        let store_base_url = require_env("SPAMWATCH_STORE_BASE_URL")?;
        let runtime_base_url = require_env("SPAMWATCH_RUNTIME_BASE_URL")?;

        let bucket = std::env::var("SPAMWATCH_BUCKET")
            .unwrap_or_else(|_| "spam-detection-email".to_string());

        let vocabulary_size: usize = std::env::var("SPAMWATCH_VOCABULARY_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_VOCABULARY_SIZE);

        let sender = require_env("SPAMWATCH_SENDER")?;

        Ok(Self {
            store_base_url,
            bucket,
            endpoint_name,
            runtime_base_url,
            vocabulary_size,
            sender,
            smtp: SmtpConfig::from_env()?,
        })
    }
}

/// Retrain automation configuration.
#[derive(Debug, Clone)]
pub struct RetrainConfig {
    /// Base URL of the control plane issuing signed notebook URLs.
    pub control_base_url: String,
    /// Notebook instance to retrain on.
    pub notebook_instance: String,
    /// Terminal-multiplexer path on the instance.
    pub terminal_path: String,
    /// How long to wait for each response frame before moving on.
    pub read_timeout: Duration,
    /// Settle delay before closing the socket after the final step.
    pub settle_delay: Duration,
    /// Directory holding the conda environments.
    pub envs_dir: String,
    /// Environment to activate before reinstalling.
    pub environment: String,
    /// Package to reinstall, with its pinned version.
    pub package: String,
    pub package_version: String,
    /// Notebook to re-execute in place.
    pub notebook_path: String,
}

impl RetrainConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let control_base_url = require_env("SPAMWATCH_CONTROL_BASE_URL")?;

        let notebook_instance = std::env::var("SPAMWATCH_NOTEBOOK_INSTANCE")
            .unwrap_or_else(|_| "spam-detection-retrain".to_string());

        let terminal_path = std::env::var("SPAMWATCH_TERMINAL_PATH")
            .unwrap_or_else(|_| "/terminals/websocket/1".to_string());

        let read_timeout = Duration::from_secs(
            std::env::var("SPAMWATCH_READ_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        );

        let settle_delay = Duration::from_secs(
            std::env::var("SPAMWATCH_SETTLE_DELAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        );

        Ok(Self {
            control_base_url,
            notebook_instance,
            terminal_path,
            read_timeout,
            settle_delay,
            envs_dir: std::env::var("SPAMWATCH_ENVS_DIR")
                .unwrap_or_else(|_| "~/anaconda3/envs".to_string()),
            environment: std::env::var("SPAMWATCH_ENVIRONMENT")
                .unwrap_or_else(|_| "JupyterSystemEnv".to_string()),
            package: std::env::var("SPAMWATCH_PACKAGE")
                .unwrap_or_else(|_| "sagemaker".to_string()),
            package_version: std::env::var("SPAMWATCH_PACKAGE_VERSION")
                .unwrap_or_else(|_| "1.19.0".to_string()),
            notebook_path: std::env::var("SPAMWATCH_NOTEBOOK_PATH").unwrap_or_else(|_| {
                "/home/ec2-user/SageMaker/smlambdaworkshop/training/sms_spam_classifier_mxnet.ipynb"
                    .to_string()
            }),
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_env_reports_missing_key() {
        let err = require_env("SPAMWATCH_DOES_NOT_EXIST").unwrap_err();
        match err {
            ConfigError::MissingEnvVar(key) => assert_eq!(key, "SPAMWATCH_DOES_NOT_EXIST"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_vocabulary_matches_model_contract() {
        assert_eq!(DEFAULT_VOCABULARY_SIZE, 9013);
    }
}
